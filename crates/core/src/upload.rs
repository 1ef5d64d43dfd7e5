//! Client-side upload validation
//!
//! The service rejects oversized and unsupported files anyway; validating
//! before the request avoids shipping 20 MiB over the wire just to get a 400
//! back.

use crate::error::UploadError;

/// File extensions the service can ingest
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "xlsx", "pptx", "txt", "jpg", "jpeg", "png",
];

/// Maximum upload size: 20 MiB
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Validate a candidate upload before any request is made.
///
/// Checks the extension against [`ACCEPTED_EXTENSIONS`] (case-insensitive)
/// and the size against [`MAX_UPLOAD_BYTES`].
pub fn validate_upload(file_name: &str, size: usize) -> Result<(), UploadError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::UnsupportedType(if extension.is_empty() {
            "(none)".to_string()
        } else {
            extension
        }));
    }

    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_supported_types() {
        for name in ["report.pdf", "notes.TXT", "deck.pptx", "scan.JPEG"] {
            assert!(validate_upload(name, 1024).is_ok(), "{name} should pass");
        }
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let err = validate_upload("malware.exe", 10).unwrap_err();
        assert_eq!(err, UploadError::UnsupportedType("exe".to_string()));
    }

    #[test]
    fn test_rejects_missing_extension() {
        assert!(validate_upload("README", 10).is_err());
    }

    #[test]
    fn test_rejects_oversized() {
        let err = validate_upload("big.pdf", MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[test]
    fn test_size_boundary() {
        assert!(validate_upload("exact.pdf", MAX_UPLOAD_BYTES).is_ok());
    }
}
