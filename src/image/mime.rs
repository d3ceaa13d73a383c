use tracing::warn;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Content type for an object stored without one, sniffed from its leading
/// bytes.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => {
            let head = &bytes[..bytes.len().min(4)];
            warn!(?head, "Unrecognized image signature, using {}", FALLBACK_MIME);
            FALLBACK_MIME
        }
    }
}

/// The declared content type, or a sniffed one when the store had none.
pub fn content_type_or_sniffed(declared: Option<&str>, body: &[u8]) -> String {
    match declared {
        Some(content_type) if !content_type.is_empty() => content_type.to_string(),
        _ => detect_image_mime(body).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEAD: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_detect_png() {
        assert_eq!(detect_image_mime(PNG_HEAD), "image/png");
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
    }

    #[test]
    fn test_unknown_falls_back_to_octet_stream() {
        assert_eq!(detect_image_mime(&[0x00, 0x01, 0x02, 0x03]), FALLBACK_MIME);
        assert_eq!(detect_image_mime(&[]), FALLBACK_MIME);
    }

    #[test]
    fn test_declared_type_wins_over_body() {
        assert_eq!(
            content_type_or_sniffed(Some("binary/octet-stream"), PNG_HEAD),
            "binary/octet-stream"
        );
    }

    #[test]
    fn test_missing_type_is_sniffed() {
        assert_eq!(content_type_or_sniffed(None, PNG_HEAD), "image/png");
        assert_eq!(content_type_or_sniffed(Some(""), PNG_HEAD), "image/png");
        assert_eq!(content_type_or_sniffed(None, b"plain text"), FALLBACK_MIME);
    }
}
