//! Upload acceptance rules and stored file naming.

use std::io::Cursor;

use image::ImageFormat;
use rand::Rng;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Image extensions accepted by the upload endpoints.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Maximum files accepted by a single `upload-multiple` request.
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// Length of the random suffix in stored filenames.
const RANDOM_SUFFIX_LEN: usize = 8;

/// Lowercased extension of `filename` if it is an accepted image type.
pub fn allowed_extension(filename: &str) -> Result<String, CoreError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
        .ok_or_else(|| CoreError::Validation(format!("file: '{filename}' has no extension")))?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "file: unsupported format '.{ext}'. Supported: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// Check an uploaded file's name and size, returning its extension.
pub fn check_upload(filename: &str, size: usize, max_bytes: usize) -> Result<String, CoreError> {
    let ext = allowed_extension(filename)?;
    if size == 0 {
        return Err(CoreError::Validation(format!("file: '{filename}' is empty")));
    }
    if size > max_bytes {
        return Err(CoreError::Validation(format!(
            "file: '{filename}' exceeds the {} KiB limit",
            max_bytes / 1024
        )));
    }
    Ok(ext)
}

/// Read image dimensions from the file header, rejecting non-images and
/// content whose format does not match the extension `ext`.
pub fn sniff_image_dimensions(bytes: &[u8], ext: &str) -> Result<(u32, u32), CoreError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::Validation(format!("file: unreadable image ({e})")))?;
    let Some(format) = reader.format() else {
        return Err(CoreError::Validation(
            "file: content is not a recognised image".into(),
        ));
    };
    if ImageFormat::from_extension(ext) != Some(format) {
        return Err(CoreError::Validation(format!(
            "file: content is {format:?} but the name ends in '.{ext}'"
        )));
    }
    reader
        .into_dimensions()
        .map_err(|e| CoreError::Validation(format!("file: corrupt image ({e})")))
}

/// Collision-resistant stored name: `{unix_millis}-{random}.{ext}`.
pub fn stored_upload_name(ext: &str, now: Timestamp) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect::<String>()
        .to_lowercase();
    format!("{}-{suffix}.{ext}", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Smallest valid 1x1 transparent GIF.
    const GIF_1X1: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
        0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
    ];

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(allowed_extension("Photo.JPG").unwrap(), "jpg");
        assert_eq!(allowed_extension("a.b.webp").unwrap(), "webp");
    }

    #[test]
    fn unsupported_or_missing_extension_rejected() {
        assert_matches!(allowed_extension("doc.pdf"), Err(CoreError::Validation(_)));
        assert_matches!(allowed_extension("noext"), Err(CoreError::Validation(_)));
        assert_matches!(allowed_extension("trailing."), Err(CoreError::Validation(_)));
    }

    #[test]
    fn size_limits() {
        assert!(check_upload("a.png", 10, 1024).is_ok());
        assert_matches!(check_upload("a.png", 0, 1024), Err(CoreError::Validation(msg)) if msg.contains("empty"));
        assert_matches!(check_upload("a.png", 2048, 1024), Err(CoreError::Validation(msg)) if msg.contains("1 KiB"));
    }

    #[test]
    fn gif_header_is_sniffed() {
        assert_eq!(sniff_image_dimensions(GIF_1X1, "gif").unwrap(), (1, 1));
    }

    #[test]
    fn non_image_bytes_rejected() {
        assert_matches!(
            sniff_image_dimensions(b"definitely not an image", "png"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn content_must_match_extension() {
        assert_matches!(
            sniff_image_dimensions(GIF_1X1, "png"),
            Err(CoreError::Validation(msg)) if msg.contains("Gif") && msg.contains(".png")
        );
        assert_matches!(
            sniff_image_dimensions(GIF_1X1, "jpg"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn stored_names_are_unique_and_keep_extension() {
        let now = chrono::Utc::now();
        let a = stored_upload_name("png", now);
        let b = stored_upload_name("png", now);
        assert!(a.ends_with(".png"));
        assert!(a.starts_with(&now.timestamp_millis().to_string()));
        assert_ne!(a, b);
    }
}
