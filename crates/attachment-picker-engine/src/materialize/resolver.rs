use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Source metadata reported by the platform for a picked item.
///
/// Either field may be absent; the materializer falls back to synthesized values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMetadata {
    pub display_name: Option<String>,
    pub mime_type: Option<String>,
}

/// Resolves platform item locators (content URIs, file URLs, paths) to metadata and bytes
pub trait ItemResolver {
    /// Best-effort metadata lookup; unknown fields are left as `None`
    fn metadata(&self, locator: &str) -> ItemMetadata;

    /// Open the item's byte stream
    fn open(&self, locator: &str) -> io::Result<Box<dyn Read + Send>>;
}

/// Resolver for items that live on the local file system.
///
/// Accepts plain paths and `file://` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileItemResolver;

impl FileItemResolver {
    fn path_of(locator: &str) -> PathBuf {
        PathBuf::from(locator.strip_prefix("file://").unwrap_or(locator))
    }
}

impl ItemResolver for FileItemResolver {
    fn metadata(&self, locator: &str) -> ItemMetadata {
        let path = Self::path_of(locator);
        ItemMetadata {
            display_name: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            mime_type: None,
        }
    }

    fn open(&self, locator: &str) -> io::Result<Box<dyn Read + Send>> {
        let path = Self::path_of(locator);
        if !Path::new(&path).is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a readable file", path.display()),
            ));
        }
        Ok(Box::new(File::open(path)?))
    }
}
