use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A materialized attachment, handed to the caller on success.
///
/// `file_size` is always measured from the written artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentDescriptor {
    pub file_path: PathBuf,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wire_shape_uses_camel_case() {
        let descriptor = AttachmentDescriptor {
            file_path: PathBuf::from("/data/files/photo.png"),
            file_name: "photo.png".to_string(),
            file_size: 2048,
            mime_type: "image/png".to_string(),
        };

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "filePath": "/data/files/photo.png",
                "fileName": "photo.png",
                "fileSize": 2048,
                "mimeType": "image/png",
            })
        );
    }
}
