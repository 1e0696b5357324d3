pub mod channel;
pub mod content_type;
pub mod coordinator;
pub mod descriptor;
pub mod error;
pub mod materialize;
pub mod permission;
pub mod picker;
pub mod request;
pub mod surface;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use channel::{Method, MethodArguments, MethodCall, Reply, dispatch};
pub use content_type::DocumentFilter;
pub use coordinator::{
    CallerHandle, Effect, PickEvent, PickOutcome, PickRequestCoordinator, Rejected, Stage,
};
pub use descriptor::AttachmentDescriptor;
pub use error::{MaterializationError, PickError};
pub use materialize::{
    AttachmentMaterializer, CAMERA_JPEG_QUALITY, FileItemResolver, ItemMetadata, ItemResolver,
};
pub use permission::{AlwaysGranted, PermissionGate, PermissionStatus, PromptOutcome};
pub use picker::AttachmentPicker;
pub use request::{MediaClass, PermissionCapability, PickKind, PickOptions, RequestId};
pub use surface::{AcquisitionSurface, RawItem, SurfaceLaunch, SurfaceOutcome};
