//! Method-call surface for embedding transports.
//!
//! A transport delivers one named call at a time and accepts exactly one reply
//! per call. [`dispatch`] routes calls to an [`AttachmentPicker`] and turns
//! terminal outcomes into [`Reply`] values carrying the caller-facing error tags.

use crate::coordinator::{CallerHandle, PickOutcome};
use crate::descriptor::AttachmentDescriptor;
use crate::error::PickError;
use crate::picker::AttachmentPicker;
use crate::request::{PermissionCapability, PickKind, PickOptions};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    PickCameraImage,
    PickGalleryImage,
    PickDocument,
    PickAudioFile,
    RequestPermission,
}

impl Method {
    pub fn parse(name: &str) -> Result<Self, PickError> {
        match name {
            "pickCameraImage" => Ok(Method::PickCameraImage),
            "pickGalleryImage" => Ok(Method::PickGalleryImage),
            "pickDocument" => Ok(Method::PickDocument),
            "pickAudioFile" => Ok(Method::PickAudioFile),
            "requestPermission" => Ok(Method::RequestPermission),
            other => Err(PickError::UnknownOperation(other.to_string())),
        }
    }

    fn pick_kind(self) -> Option<PickKind> {
        match self {
            Method::PickCameraImage => Some(PickKind::Camera),
            Method::PickGalleryImage => Some(PickKind::Gallery),
            Method::PickDocument => Some(PickKind::Document),
            Method::PickAudioFile => Some(PickKind::Audio),
            Method::RequestPermission => None,
        }
    }
}

/// Arguments a call may carry; unknown keys are ignored
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodArguments {
    #[serde(default)]
    pub allowed_extensions: Option<Vec<String>>,
    #[serde(default)]
    pub permission: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub arguments: MethodArguments,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: MethodArguments::default(),
        }
    }

    pub fn with_arguments(mut self, arguments: MethodArguments) -> Self {
        self.arguments = arguments;
        self
    }
}

/// The one reply a call receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Attachment(AttachmentDescriptor),
    Permission(bool),
    Error { code: &'static str, message: String },
    NotImplemented,
}

impl From<PickOutcome> for Reply {
    fn from(outcome: PickOutcome) -> Self {
        match outcome {
            Ok(descriptor) => Reply::Attachment(descriptor),
            Err(PickError::UnknownOperation(_)) => Reply::NotImplemented,
            Err(e) => Reply::Error {
                code: e.code(),
                message: e.to_string(),
            },
        }
    }
}

/// Route one call to `picker`; `reply` is invoked exactly once, possibly later
pub fn dispatch<C>(
    picker: &mut AttachmentPicker<C>,
    context: Option<&C>,
    call: MethodCall,
    reply: impl FnOnce(Reply) + Send + 'static,
) {
    let method = match Method::parse(&call.method) {
        Ok(method) => method,
        Err(e) => {
            log::debug!("{e}");
            reply(Reply::NotImplemented);
            return;
        }
    };

    let Some(kind) = method.pick_kind() else {
        let granted = call
            .arguments
            .permission
            .as_deref()
            .and_then(PermissionCapability::from_name)
            .is_some_and(|capability| picker.request_permission(context, capability));
        reply(Reply::Permission(granted));
        return;
    };

    let options = match kind {
        PickKind::Document => PickOptions {
            allowed_extensions: call.arguments.allowed_extensions.unwrap_or_default(),
        },
        _ => PickOptions::default(),
    };

    let caller = CallerHandle::new(move |outcome| reply(Reply::from(outcome)));
    if let Err(rejected) = picker.pick(context, kind, options, caller) {
        rejected.caller.deliver(Err(rejected.error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pickCameraImage", Method::PickCameraImage)]
    #[case("pickGalleryImage", Method::PickGalleryImage)]
    #[case("pickDocument", Method::PickDocument)]
    #[case("pickAudioFile", Method::PickAudioFile)]
    #[case("requestPermission", Method::RequestPermission)]
    fn test_parse_known_methods(#[case] name: &str, #[case] method: Method) {
        assert_eq!(Method::parse(name).unwrap(), method);
    }

    #[test]
    fn test_parse_unknown_method() {
        let err = Method::parse("pickVideo").unwrap_err();
        assert!(matches!(err, PickError::UnknownOperation(name) if name == "pickVideo"));
    }

    #[test]
    fn test_arguments_deserialize_from_camel_case() {
        let args: MethodArguments =
            serde_json::from_str(r#"{"allowedExtensions": ["pdf", "docx"], "extra": 1}"#).unwrap();
        assert_eq!(
            args.allowed_extensions,
            Some(vec!["pdf".to_string(), "docx".to_string()])
        );
        assert_eq!(args.permission, None);

        let args: MethodArguments = serde_json::from_str(r#"{"permission": "camera"}"#).unwrap();
        assert_eq!(args.permission.as_deref(), Some("camera"));
    }

    #[test]
    fn test_reply_from_error_outcome() {
        let reply = Reply::from(Err(PickError::UserCancelled));
        assert_eq!(
            reply,
            Reply::Error {
                code: "CANCELLED",
                message: "User cancelled".to_string()
            }
        );
        assert_eq!(
            Reply::from(Err(PickError::UnknownOperation("x".into()))),
            Reply::NotImplemented
        );
    }
}
