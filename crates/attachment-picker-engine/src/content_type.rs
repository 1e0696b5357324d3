//! Extension to content-type mapping shared by the document filter, the audio
//! filter and the materializer's mime fallback.

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const ANY_AUDIO: &str = "audio/*";
pub const JPEG: &str = "image/jpeg";

const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("txt", "text/plain"),
    ("rtf", "application/rtf"),
    ("csv", "text/csv"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("jpg", JPEG),
    ("jpeg", JPEG),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("heic", "image/heic"),
];

/// Look up the content type for a file extension (case-insensitive, leading dot allowed)
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    EXTENSION_TABLE
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, content_type)| *content_type)
}

/// Reverse lookup: preferred extension for a content type
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let content_type = content_type.trim().to_ascii_lowercase();
    EXTENSION_TABLE
        .iter()
        .find(|(_, ct)| *ct == content_type)
        .map(|(ext, _)| *ext)
}

/// Content type inferred from a file name's extension
pub fn content_type_for_file_name(file_name: &str) -> Option<&'static str> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    content_type_for_extension(extension)
}

/// Type filter handed to the document and audio pickers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Accept any type
    Any,
    /// Accept only the listed content types (in request order, no duplicates)
    Types(Vec<&'static str>),
}

impl DocumentFilter {
    /// Build a filter from extension hints.
    ///
    /// Unrecognized extensions are dropped. When nothing recognizable remains
    /// the filter falls back to accepting any type.
    pub fn from_extensions<S: AsRef<str>>(extensions: &[S]) -> Self {
        let mut types: Vec<&'static str> = Vec::new();
        for extension in extensions {
            match content_type_for_extension(extension.as_ref()) {
                Some(content_type) if !types.contains(&content_type) => types.push(content_type),
                Some(_) => {}
                None => log::debug!("Dropping unrecognized extension hint {:?}", extension.as_ref()),
            }
        }

        if types.is_empty() {
            DocumentFilter::Any
        } else {
            DocumentFilter::Types(types)
        }
    }

    /// Fixed filter used by the audio picker
    pub fn audio() -> Self {
        DocumentFilter::Types(vec![ANY_AUDIO])
    }

    pub fn accepts_any(&self) -> bool {
        matches!(self, DocumentFilter::Any)
    }

    /// Content types as strings, `*/*` standing in for "any"
    pub fn content_types(&self) -> Vec<String> {
        match self {
            DocumentFilter::Any => vec!["*/*".to_string()],
            DocumentFilter::Types(types) => types.iter().map(|t| t.to_string()).collect(),
        }
    }
}
