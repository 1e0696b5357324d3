use std::path::PathBuf;

/// Terminal failure of a pick request
#[derive(Debug, thiserror::Error)]
pub enum PickError {
    #[error("No interaction context is available to present into")]
    NoInteractionContext,
    #[error("Permission not granted")]
    PermissionDenied,
    #[error("User cancelled")]
    UserCancelled,
    #[error("Surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("Failed to materialize attachment: {0}")]
    Materialization(#[from] MaterializationError),
    #[error("Another pick request is already in progress")]
    Busy,
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

impl PickError {
    /// Error tag surfaced to the caller over the method-call transport
    pub fn code(&self) -> &'static str {
        match self {
            PickError::NoInteractionContext => "NO_ACTIVITY",
            PickError::PermissionDenied => "PERMISSION_DENIED",
            PickError::UserCancelled => "CANCELLED",
            PickError::SurfaceUnavailable(_) | PickError::Materialization(_) => "ERROR",
            PickError::Busy => "BUSY",
            PickError::UnknownOperation(_) => "notImplemented",
        }
    }
}

/// Failure while copying or encoding a picked item into application storage
#[derive(Debug, thiserror::Error)]
pub enum MaterializationError {
    #[error("Cannot open source {locator}: {source}")]
    SourceUnavailable {
        locator: String,
        source: std::io::Error,
    },
    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Storage exhausted while writing {path}")]
    StorageFull { path: PathBuf },
    #[error("Cannot encode captured image: {0}")]
    Encode(String),
}

impl MaterializationError {
    /// Classify a write-side I/O failure, singling out exhausted storage
    pub(crate) fn from_write(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::StorageFull {
            MaterializationError::StorageFull { path }
        } else {
            MaterializationError::Write { path, source }
        }
    }
}
