//! Acquisition surfaces: camera, gallery, document browser and audio picker.
//!
//! A surface shows exactly one modal UI per launch and later reports exactly
//! one [`SurfaceOutcome`] tagged with the launching request's id. The outcome
//! is addressed to the coordinator rather than to the UI context, so it
//! survives the context being torn down and recreated while the UI is visible.

use crate::content_type::DocumentFilter;
use crate::request::{PickKind, PickOptions, RequestId};
use std::path::PathBuf;

/// What to present, one variant per surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceLaunch {
    /// Capture a photo; the camera writes its output to `capture_target`
    Camera { capture_target: PathBuf },
    /// Choose one existing image
    Gallery,
    /// Choose one document matching `filter`
    Document { filter: DocumentFilter },
    /// Choose one audio file; `filter` is always the audio type-class
    Audio { filter: DocumentFilter },
}

impl SurfaceLaunch {
    /// Translate a request into the launch description for its surface.
    ///
    /// `capture_target` is only called for camera requests.
    pub fn for_request<E>(
        kind: PickKind,
        options: &PickOptions,
        capture_target: impl FnOnce() -> Result<PathBuf, E>,
    ) -> Result<Self, E> {
        Ok(match kind {
            PickKind::Camera => SurfaceLaunch::Camera {
                capture_target: capture_target()?,
            },
            PickKind::Gallery => SurfaceLaunch::Gallery,
            PickKind::Document => SurfaceLaunch::Document {
                filter: DocumentFilter::from_extensions(&options.allowed_extensions),
            },
            PickKind::Audio => SurfaceLaunch::Audio {
                filter: DocumentFilter::audio(),
            },
        })
    }

    pub fn kind(&self) -> PickKind {
        match self {
            SurfaceLaunch::Camera { .. } => PickKind::Camera,
            SurfaceLaunch::Gallery => PickKind::Gallery,
            SurfaceLaunch::Document { .. } => PickKind::Document,
            SurfaceLaunch::Audio { .. } => PickKind::Audio,
        }
    }
}

/// Platform-provided handle to the item a surface produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawItem {
    /// Frame the camera wrote to the capture target
    Capture { path: PathBuf },
    /// Item owned by the platform: a content URI, file URL or plain path
    Content { locator: String },
}

/// The single outcome of one surface launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOutcome {
    Produced(RawItem),
    Cancelled,
    Unavailable(String),
}

/// Platform UI launcher, generic over the host's interaction context `C`.
pub trait AcquisitionSurface<C> {
    /// Present the surface described by `launch` on behalf of `request`.
    ///
    /// Returning `Err(reason)` means nothing was presented (no camera hardware,
    /// no gallery concept, launch failure) and is treated as
    /// [`SurfaceOutcome::Unavailable`]. Otherwise the outcome must be reported
    /// later, tagged with `request`, and never from inside this call.
    fn launch(&self, context: &C, request: RequestId, launch: &SurfaceLaunch) -> Result<(), String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn launch_for(kind: PickKind, options: &PickOptions) -> SurfaceLaunch {
        SurfaceLaunch::for_request(kind, options, || Ok::<_, ()>(PathBuf::from("/tmp/capture")))
            .unwrap()
    }

    #[test]
    fn test_camera_carries_capture_target() {
        let launch = launch_for(PickKind::Camera, &PickOptions::default());
        assert_eq!(
            launch,
            SurfaceLaunch::Camera {
                capture_target: PathBuf::from("/tmp/capture")
            }
        );
    }

    #[test]
    fn test_document_without_extensions_accepts_any() {
        let launch = launch_for(PickKind::Document, &PickOptions::default());
        assert_eq!(
            launch,
            SurfaceLaunch::Document {
                filter: DocumentFilter::Any
            }
        );
    }

    #[test]
    fn test_document_filters_recognized_extensions() {
        let options = PickOptions::with_extensions(["pdf", "bogus"]);
        let launch = launch_for(PickKind::Document, &options);
        assert_eq!(
            launch,
            SurfaceLaunch::Document {
                filter: DocumentFilter::Types(vec!["application/pdf"])
            }
        );
    }

    #[test]
    fn test_capture_target_only_prepared_for_camera() {
        let result = SurfaceLaunch::for_request(PickKind::Gallery, &PickOptions::default(), || {
            Err("capture target must not be prepared")
        });
        assert_eq!(result, Ok(SurfaceLaunch::Gallery));

        let result =
            SurfaceLaunch::for_request(PickKind::Camera, &PickOptions::default(), || Err("disk full"));
        assert_eq!(result, Err("disk full"));
    }

    #[test]
    fn test_audio_ignores_extension_hints() {
        let options = PickOptions::with_extensions(["pdf"]);
        let launch = launch_for(PickKind::Audio, &options);
        assert_eq!(
            launch,
            SurfaceLaunch::Audio {
                filter: DocumentFilter::audio()
            }
        );
        assert_eq!(launch.kind(), PickKind::Audio);
    }
}
