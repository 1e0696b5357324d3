//! UniFFI bindings for attachment-picker host shells
//!
//! Exposes the method-call surface to Kotlin/Swift. The host implements the
//! permission gate, the picker UIs and (optionally) content resolution as
//! foreign traits, and reports their outcomes back through
//! [`AttachmentPickerHandle`].
//!
//! Gate and surface callbacks must not call back into the handle from inside
//! the callback; post the outcome to the UI loop and report it from there.
//! [`PickReply`] is only invoked once the handle is unlocked, so a reply may
//! start the next pick directly.

use attachment_picker_engine::{
    AcquisitionSurface, AttachmentDescriptor, AttachmentMaterializer, AttachmentPicker,
    FileItemResolver, ItemMetadata, ItemResolver, MediaClass, MethodArguments, MethodCall,
    PermissionCapability, PermissionGate, PermissionStatus, PromptOutcome, RawItem, Reply,
    RequestId, SurfaceLaunch, SurfaceOutcome, dispatch,
};
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

uniffi::setup_scaffolding!();

// ============ Logging ============

/// Route engine logs to logcat (Android) or stderr. Safe to call repeatedly.
#[uniffi::export]
pub fn init_logging() {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("AttachmentPicker"),
        );
    }

    #[cfg(not(target_os = "android"))]
    {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .try_init();
    }
}

// ============ Errors ============

/// Errors that can cross the FFI boundary
/// Note: Field is named `reason` not `message` to avoid conflict with Throwable.message in Kotlin
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FfiError {
    #[error("Invalid storage directory: {reason}")]
    InvalidStorageDir { reason: String },
}

// ============ DTOs ============

/// Opaque token naming the host's current UI context (activity, view controller).
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct InteractionContext {
    pub token: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum CapabilityDto {
    Camera,
    Microphone,
    MediaImages,
    MediaAudio,
}

impl CapabilityDto {
    fn from_engine(capability: PermissionCapability) -> Self {
        match capability {
            PermissionCapability::Camera => Self::Camera,
            PermissionCapability::Microphone => Self::Microphone,
            PermissionCapability::MediaRead(MediaClass::Images) => Self::MediaImages,
            PermissionCapability::MediaRead(MediaClass::Audio) => Self::MediaAudio,
        }
    }

    fn to_engine(self) -> PermissionCapability {
        match self {
            Self::Camera => PermissionCapability::Camera,
            Self::Microphone => PermissionCapability::Microphone,
            Self::MediaImages => PermissionCapability::MediaRead(MediaClass::Images),
            Self::MediaAudio => PermissionCapability::MediaRead(MediaClass::Audio),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum PermissionStatusDto {
    Granted,
    Denied,
    NotDetermined,
}

impl From<PermissionStatusDto> for PermissionStatus {
    fn from(status: PermissionStatusDto) -> Self {
        match status {
            PermissionStatusDto::Granted => PermissionStatus::Granted,
            PermissionStatusDto::Denied => PermissionStatus::Denied,
            PermissionStatusDto::NotDetermined => PermissionStatus::NotDetermined,
        }
    }
}

/// What the host should present for one request.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SurfaceRequestDto {
    /// "camera", "gallery", "document" or "audio"
    pub kind: String,
    /// Camera only: file the captured frame must be written to
    pub capture_target: Option<String>,
    /// Content types the picker should offer; `*/*` means anything
    pub mime_types: Vec<String>,
}

impl SurfaceRequestDto {
    fn from_engine(launch: &SurfaceLaunch) -> Self {
        let (capture_target, mime_types) = match launch {
            SurfaceLaunch::Camera { capture_target } => {
                (Some(capture_target.display().to_string()), Vec::new())
            }
            SurfaceLaunch::Gallery => (None, vec!["image/*".to_string()]),
            SurfaceLaunch::Document { filter } | SurfaceLaunch::Audio { filter } => {
                (None, filter.content_types())
            }
        };
        Self {
            kind: launch.kind().as_str().to_string(),
            capture_target,
            mime_types,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum LaunchResultDto {
    Launched,
    Unavailable { reason: String },
}

/// How a surface finished
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum SurfaceOutcomeDto {
    /// The user chose an item; `locator` is a content URI, file URL or path
    Picked { locator: String },
    /// The camera wrote its frame to the capture target
    Captured { path: String },
    Cancelled,
    Unavailable { reason: String },
}

impl From<SurfaceOutcomeDto> for SurfaceOutcome {
    fn from(outcome: SurfaceOutcomeDto) -> Self {
        match outcome {
            SurfaceOutcomeDto::Picked { locator } => {
                SurfaceOutcome::Produced(RawItem::Content { locator })
            }
            SurfaceOutcomeDto::Captured { path } => SurfaceOutcome::Produced(RawItem::Capture {
                path: PathBuf::from(path),
            }),
            SurfaceOutcomeDto::Cancelled => SurfaceOutcome::Cancelled,
            SurfaceOutcomeDto::Unavailable { reason } => SurfaceOutcome::Unavailable(reason),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, uniffi::Record)]
pub struct ItemMetadataDto {
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
}

/// A materialized attachment, as returned to the host.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct AttachmentDto {
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
}

impl AttachmentDto {
    fn from_engine(descriptor: AttachmentDescriptor) -> Self {
        Self {
            file_path: descriptor.file_path.display().to_string(),
            file_name: descriptor.file_name,
            file_size: descriptor.file_size,
            mime_type: descriptor.mime_type,
        }
    }
}

// ============ Host traits ============

#[uniffi::export(with_foreign)]
pub trait HostPermissionGate: Send + Sync {
    fn status(&self, context: InteractionContext, capability: CapabilityDto) -> PermissionStatusDto;

    /// Show the consent prompt; report the answer later via `on_permission_result`.
    /// Return false if no prompt could be shown.
    fn request_prompt(&self, context: InteractionContext, capability: CapabilityDto, request: u64)
    -> bool;
}

#[uniffi::export(with_foreign)]
pub trait HostSurfaceLauncher: Send + Sync {
    /// Present the surface; report the outcome later via `on_surface_result`.
    fn launch(
        &self,
        context: InteractionContext,
        request: u64,
        surface: SurfaceRequestDto,
    ) -> LaunchResultDto;
}

#[uniffi::export(with_foreign)]
pub trait HostItemResolver: Send + Sync {
    fn metadata(&self, locator: String) -> ItemMetadataDto;

    /// Full contents of the item, or None if it cannot be opened
    fn read_all(&self, locator: String) -> Option<Vec<u8>>;
}

/// One-shot reply to a method call; exactly one method is invoked per call
#[uniffi::export(with_foreign)]
pub trait PickReply: Send + Sync {
    fn success(&self, attachment: AttachmentDto);
    fn granted(&self, granted: bool);
    fn error(&self, code: String, message: String);
    fn not_implemented(&self);
}

struct ForeignGate(Arc<dyn HostPermissionGate>);

impl PermissionGate<InteractionContext> for ForeignGate {
    fn status(&self, context: &InteractionContext, capability: PermissionCapability) -> PermissionStatus {
        self.0
            .status(*context, CapabilityDto::from_engine(capability))
            .into()
    }

    fn request_prompt(
        &self,
        context: &InteractionContext,
        capability: PermissionCapability,
        request: RequestId,
    ) -> Result<(), String> {
        if self
            .0
            .request_prompt(*context, CapabilityDto::from_engine(capability), request.0)
        {
            Ok(())
        } else {
            Err(format!("host could not show a prompt for {capability}"))
        }
    }
}

struct ForeignSurface(Arc<dyn HostSurfaceLauncher>);

impl AcquisitionSurface<InteractionContext> for ForeignSurface {
    fn launch(
        &self,
        context: &InteractionContext,
        request: RequestId,
        launch: &SurfaceLaunch,
    ) -> Result<(), String> {
        match self
            .0
            .launch(*context, request.0, SurfaceRequestDto::from_engine(launch))
        {
            LaunchResultDto::Launched => Ok(()),
            LaunchResultDto::Unavailable { reason } => Err(reason),
        }
    }
}

struct ForeignResolver(Arc<dyn HostItemResolver>);

impl ItemResolver for ForeignResolver {
    fn metadata(&self, locator: &str) -> ItemMetadata {
        let metadata = self.0.metadata(locator.to_string());
        ItemMetadata {
            display_name: metadata.display_name,
            mime_type: metadata.mime_type,
        }
    }

    fn open(&self, locator: &str) -> io::Result<Box<dyn Read + Send>> {
        match self.0.read_all(locator.to_string()) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("host cannot open {locator}"),
            )),
        }
    }
}

fn send_reply(reply: &dyn PickReply, outcome: Reply) {
    match outcome {
        Reply::Attachment(descriptor) => reply.success(AttachmentDto::from_engine(descriptor)),
        Reply::Permission(granted) => reply.granted(granted),
        Reply::Error { code, message } => reply.error(code.to_string(), message),
        Reply::NotImplemented => reply.not_implemented(),
    }
}

// ============ Picker Handle ============

/// Replies produced while the picker was locked, waiting to be sent
type Outbox = Arc<Mutex<Vec<(Arc<dyn PickReply>, Reply)>>>;

/// The plugin instance a host shell keeps for its lifetime.
#[derive(uniffi::Object)]
pub struct AttachmentPickerHandle {
    inner: Mutex<AttachmentPicker<InteractionContext>>,
    outbox: Outbox,
}

impl AttachmentPickerHandle {
    /// Run `f` on the locked picker, then send any replies it produced
    fn with_picker<R>(&self, f: impl FnOnce(&mut AttachmentPicker<InteractionContext>) -> R) -> R {
        let result = {
            // Recover from poisoned mutex (another thread panicked while holding lock)
            let mut picker = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut *picker)
        };
        self.flush_replies();
        result
    }

    fn flush_replies(&self) {
        let ready = std::mem::take(&mut *self.outbox.lock().unwrap_or_else(|e| e.into_inner()));
        for (reply, outcome) in ready {
            send_reply(reply.as_ref(), outcome);
        }
    }
}

#[uniffi::export]
impl AttachmentPickerHandle {
    /// `resolver` may be omitted when every picked item is a plain file path.
    #[uniffi::constructor]
    pub fn new(
        storage_dir: String,
        gate: Arc<dyn HostPermissionGate>,
        surface: Arc<dyn HostSurfaceLauncher>,
        resolver: Option<Arc<dyn HostItemResolver>>,
    ) -> Result<Self, FfiError> {
        if storage_dir.trim().is_empty() {
            return Err(FfiError::InvalidStorageDir {
                reason: "path is empty".to_string(),
            });
        }

        let resolver: Box<dyn ItemResolver + Send> = match resolver {
            Some(resolver) => Box::new(ForeignResolver(resolver)),
            None => Box::new(FileItemResolver),
        };
        let picker: AttachmentPicker<InteractionContext> = AttachmentPicker::new(
            Box::new(ForeignGate(gate)),
            Box::new(ForeignSurface(surface)),
            AttachmentMaterializer::new(storage_dir, resolver),
        );

        Ok(Self {
            inner: Mutex::new(picker),
            outbox: Outbox::default(),
        })
    }

    /// Handle one method call; `reply` receives exactly one answer, possibly later.
    pub fn handle_method_call(
        &self,
        context: Option<InteractionContext>,
        method: String,
        allowed_extensions: Option<Vec<String>>,
        permission: Option<String>,
        reply: Arc<dyn PickReply>,
    ) {
        let call = MethodCall::new(method).with_arguments(MethodArguments {
            allowed_extensions,
            permission,
        });
        let outbox = self.outbox.clone();
        self.with_picker(|picker| {
            dispatch(picker, context.as_ref(), call, move |outcome| {
                outbox
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push((reply, outcome));
            })
        });
    }

    pub fn on_permission_result(
        &self,
        context: Option<InteractionContext>,
        request: u64,
        capability: CapabilityDto,
        granted: bool,
    ) {
        self.with_picker(|picker| {
            picker.on_permission_result(
                context.as_ref(),
                RequestId(request),
                capability.to_engine(),
                PromptOutcome::from(granted),
            )
        });
    }

    pub fn on_surface_result(
        &self,
        context: Option<InteractionContext>,
        request: u64,
        outcome: SurfaceOutcomeDto,
    ) {
        self.with_picker(|picker| {
            picker.on_surface_result(context.as_ref(), RequestId(request), outcome.into())
        });
    }

    /// The host's UI context is gone for good (not a configuration change)
    pub fn context_lost(&self) {
        self.with_picker(|picker| picker.context_lost());
    }

    pub fn is_idle(&self) -> bool {
        let picker = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        picker.coordinator().is_idle()
    }

    /// Request id awaiting a host result, if any
    pub fn pending_request(&self) -> Option<u64> {
        let picker = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        picker.coordinator().pending_request().map(|id| id.0)
    }
}
