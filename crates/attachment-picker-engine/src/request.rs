use serde::{Deserialize, Serialize};
use std::fmt;

/// The acquisition surface a pick request is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickKind {
    Camera,
    Gallery,
    Document,
    Audio,
}

impl PickKind {
    /// Capability that must be granted before the surface can be shown.
    ///
    /// Documents need none: the system document picker brokers access itself.
    pub fn required_capability(self) -> Option<PermissionCapability> {
        match self {
            PickKind::Camera => Some(PermissionCapability::Camera),
            PickKind::Gallery => Some(PermissionCapability::MediaRead(MediaClass::Images)),
            PickKind::Audio => Some(PermissionCapability::MediaRead(MediaClass::Audio)),
            PickKind::Document => None,
        }
    }

    /// Lower-case name used in synthesized file names and logs
    pub fn as_str(self) -> &'static str {
        match self {
            PickKind::Camera => "camera",
            PickKind::Gallery => "gallery",
            PickKind::Document => "document",
            PickKind::Audio => "audio",
        }
    }
}

impl fmt::Display for PickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options attached to a pick request.
///
/// Only document requests read `allowed_extensions`; an empty list accepts any type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickOptions {
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
}

impl PickOptions {
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Class of media a read permission covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    Images,
    Audio,
}

/// Logical permission concept gating a surface launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionCapability {
    Camera,
    Microphone,
    MediaRead(MediaClass),
}

impl PermissionCapability {
    /// Parse the capability names accepted by `requestPermission`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "camera" => Some(PermissionCapability::Camera),
            "microphone" => Some(PermissionCapability::Microphone),
            "storage" => Some(PermissionCapability::MediaRead(MediaClass::Images)),
            _ => None,
        }
    }
}

impl fmt::Display for PermissionCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionCapability::Camera => f.write_str("camera"),
            PermissionCapability::Microphone => f.write_str("microphone"),
            PermissionCapability::MediaRead(MediaClass::Images) => f.write_str("media-read(images)"),
            PermissionCapability::MediaRead(MediaClass::Audio) => f.write_str("media-read(audio)"),
        }
    }
}

/// Identity of one accepted pick request.
///
/// Every asynchronous follow-up carries the id of the request it answers, so
/// outcomes addressed to a finished request can be told apart from live ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
