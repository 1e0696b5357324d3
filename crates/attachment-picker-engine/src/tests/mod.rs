use crate::materialize::{FileItemResolver, ItemMetadata, ItemResolver};
use image::{Rgba, RgbaImage};
use std::io::{self, Read};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for sources or materialized artifacts
pub fn create_storage_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Write a source file into `dir` and return its path
pub fn write_source(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).expect("Failed to write source file");
    path
}

/// Encoded PNG of a solid-colour frame, standing in for a camera capture
pub fn png_frame(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 128, 255]));
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    img.write_to(&mut cursor, image::ImageFormat::Png)
        .expect("Failed to encode PNG frame");
    buffer
}

/// Reads bytes from the file system but reports fixed metadata
pub struct FixedMetadataResolver {
    metadata: ItemMetadata,
}

impl FixedMetadataResolver {
    pub fn new(metadata: ItemMetadata) -> Self {
        Self { metadata }
    }
}

impl ItemResolver for FixedMetadataResolver {
    fn metadata(&self, _locator: &str) -> ItemMetadata {
        self.metadata.clone()
    }

    fn open(&self, locator: &str) -> io::Result<Box<dyn Read + Send>> {
        FileItemResolver.open(locator)
    }
}
