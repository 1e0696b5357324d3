//! Copy or encode a picked item into application storage.

mod encode;
mod resolver;

pub use encode::encode_jpeg;
pub use resolver::{FileItemResolver, ItemMetadata, ItemResolver};

use crate::content_type::{
    ANY_AUDIO, JPEG, OCTET_STREAM, content_type_for_file_name, extension_for_content_type,
};
use crate::descriptor::AttachmentDescriptor;
use crate::error::MaterializationError;
use crate::request::{PickKind, RequestId};
use crate::surface::RawItem;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// JPEG quality used when encoding camera captures
pub const CAMERA_JPEG_QUALITY: u8 = 85;

const CAPTURE_DIR: &str = ".capture";
const COPY_BUFFER_SIZE: usize = 64 * 1024;

pub struct AttachmentMaterializer {
    storage_dir: PathBuf,
    resolver: Box<dyn ItemResolver + Send>,
}

impl AttachmentMaterializer {
    pub fn new(storage_dir: impl Into<PathBuf>, resolver: Box<dyn ItemResolver + Send>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            resolver,
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Create the staging location the camera writes its capture to
    pub fn prepare_capture_target(&self, request: RequestId) -> Result<PathBuf, MaterializationError> {
        let capture_dir = self.storage_dir.join(CAPTURE_DIR);
        fs::create_dir_all(&capture_dir)
            .map_err(|source| MaterializationError::from_write(capture_dir.clone(), source))?;
        Ok(capture_dir.join(format!("capture_{}_{}", request.0, epoch_millis())))
    }

    /// Remove whatever the camera left at `capture`; a missing file is fine
    pub fn discard_capture_target(&self, capture: &Path) {
        if let Err(e) = fs::remove_file(capture)
            && e.kind() != io::ErrorKind::NotFound
        {
            log::warn!("Failed to remove capture staging file {}: {e}", capture.display());
        }
    }

    /// Produce the descriptor for `item`, picked through a `kind` surface
    pub fn materialize(
        &self,
        kind: PickKind,
        item: &RawItem,
    ) -> Result<AttachmentDescriptor, MaterializationError> {
        match item {
            RawItem::Capture { path } => self.materialize_capture(path),
            RawItem::Content { locator } => self.materialize_content(kind, locator),
        }
    }

    fn materialize_capture(&self, capture: &Path) -> Result<AttachmentDescriptor, MaterializationError> {
        let result = fs::read(capture)
            .map_err(|source| MaterializationError::SourceUnavailable {
                locator: capture.display().to_string(),
                source,
            })
            .and_then(|captured| encode_jpeg(&captured, CAMERA_JPEG_QUALITY))
            .and_then(|encoded| {
                let file_name = synthesized_file_name(PickKind::Camera, Some(JPEG));
                let destination = self.allocate_destination(&file_name)?;
                self.write_artifact(&destination, |file| {
                    file.write_all(&encoded)
                        .map_err(|source| MaterializationError::from_write(destination.clone(), source))
                })?;
                descriptor_for(destination, file_name, JPEG.to_string())
            });

        self.discard_capture_target(capture);
        result
    }

    fn materialize_content(
        &self,
        kind: PickKind,
        locator: &str,
    ) -> Result<AttachmentDescriptor, MaterializationError> {
        let metadata = self.resolver.metadata(locator);
        let source_mime = metadata
            .mime_type
            .filter(|mime| !mime.trim().is_empty());

        let file_name = metadata
            .display_name
            .as_deref()
            .and_then(sanitize_file_name)
            .unwrap_or_else(|| synthesized_file_name(kind, source_mime.as_deref()));

        let mime_type = source_mime
            .or_else(|| content_type_for_file_name(&file_name).map(String::from))
            .unwrap_or_else(|| fallback_mime_type(kind).to_string());

        let mut source = self
            .resolver
            .open(locator)
            .map_err(|source| MaterializationError::SourceUnavailable {
                locator: locator.to_string(),
                source,
            })?;

        let destination = self.allocate_destination(&file_name)?;
        self.write_artifact(&destination, |file| {
            copy_verbatim(&mut source, file, locator, &destination)
        })?;

        descriptor_for(destination, file_name, mime_type)
    }

    /// A fresh directory per artifact, so repeated picks never collide
    fn allocate_destination(&self, file_name: &str) -> Result<PathBuf, MaterializationError> {
        let dir = self.storage_dir.join(uuid::Uuid::new_v4().to_string());
        fs::create_dir_all(&dir).map_err(|source| MaterializationError::from_write(dir.clone(), source))?;
        Ok(dir.join(file_name))
    }

    /// Create `destination`, fill it via `fill`, and remove the partial artifact on failure
    fn write_artifact<F>(&self, destination: &Path, fill: F) -> Result<(), MaterializationError>
    where
        F: FnOnce(&mut File) -> Result<(), MaterializationError>,
    {
        let result = File::create(destination)
            .map_err(|source| MaterializationError::from_write(destination.to_path_buf(), source))
            .and_then(|mut file| {
                fill(&mut file)?;
                file.sync_all()
                    .map_err(|source| MaterializationError::from_write(destination.to_path_buf(), source))
            });

        if result.is_err()
            && let Some(dir) = destination.parent()
            && dir != self.storage_dir
        {
            let _ = fs::remove_dir_all(dir);
        }

        result
    }
}

fn copy_verbatim(
    source: &mut dyn Read,
    file: &mut File,
    locator: &str,
    destination: &Path,
) -> Result<(), MaterializationError> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(MaterializationError::SourceUnavailable {
                    locator: locator.to_string(),
                    source,
                });
            }
        };
        file.write_all(&buffer[..read])
            .map_err(|source| MaterializationError::from_write(destination.to_path_buf(), source))?;
    }
}

/// Size is measured from the written artifact, never taken from source metadata
fn descriptor_for(
    file_path: PathBuf,
    file_name: String,
    mime_type: String,
) -> Result<AttachmentDescriptor, MaterializationError> {
    let file_size = fs::metadata(&file_path)
        .map_err(|source| MaterializationError::Write {
            path: file_path.clone(),
            source,
        })?
        .len();

    Ok(AttachmentDescriptor {
        file_path,
        file_name,
        file_size,
        mime_type,
    })
}

/// Reduce a platform display name to a single safe path component
fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}

/// `"{kind}_{epochMillis}.{ext}"`, the extension following the content type when known
fn synthesized_file_name(kind: PickKind, mime_type: Option<&str>) -> String {
    let extension = mime_type
        .and_then(extension_for_content_type)
        .unwrap_or(match kind {
            PickKind::Camera | PickKind::Gallery => "jpg",
            PickKind::Document | PickKind::Audio => "bin",
        });
    format!("{kind}_{}.{extension}", epoch_millis())
}

fn fallback_mime_type(kind: PickKind) -> &'static str {
    match kind {
        PickKind::Camera | PickKind::Gallery => JPEG,
        PickKind::Audio => ANY_AUDIO,
        PickKind::Document => OCTET_STREAM,
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
