use crate::error::MaterializationError;
use image::codecs::jpeg::JpegEncoder;

/// Decode a captured frame and re-encode it once as JPEG.
///
/// Alpha is dropped; JPEG has no alpha channel.
pub fn encode_jpeg(captured: &[u8], quality: u8) -> Result<Vec<u8>, MaterializationError> {
    let frame = image::load_from_memory(captured)
        .map_err(|e| MaterializationError::Encode(format!("image decode error: {e}")))?;
    let rgb = frame.to_rgb8();

    let mut encoded = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| MaterializationError::Encode(format!("jpeg encode error: {e}")))?;

    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::png_frame;

    #[test]
    fn test_png_frame_becomes_jpeg() {
        let encoded = encode_jpeg(&png_frame(32, 16), 85).unwrap();
        // JPEG SOI marker
        assert_eq!(&encoded[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&encoded).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn test_garbage_is_an_encode_error() {
        let result = encode_jpeg(b"definitely not an image", 85);
        assert!(matches!(result, Err(MaterializationError::Encode(_))));
    }
}
