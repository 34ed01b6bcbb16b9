use std::path::Path;

use crate::config::SUPPORTED_FILE_FORMATS;

/// Extensions the `image` crate can actually decode; `.geotiff` carries bands
/// the decoder does not understand, so integrity checking skips it.
const DECODABLE_FORMATS: [&str; 5] = [".jpg", ".jpeg", ".png", ".tif", ".tiff"];

/// Checks an uploaded file before anything is persisted. Short-circuits on the
/// first failing check; the returned reason is shown to the requester as-is.
/// No side effects, deterministic for identical inputs.
pub fn validate_file(file_path: &Path, file_size: u64, max_file_size: u64) -> Result<(), String> {
    if file_size > max_file_size {
        return Err(format!(
            "File is too large. Maximum size: {} MB",
            max_file_size / (1024 * 1024)
        ));
    }

    let ext = file_extension(file_path);
    if !SUPPORTED_FILE_FORMATS.contains(&ext.as_str()) {
        return Err(format!(
            "Unsupported file format. Supported formats: {}",
            SUPPORTED_FILE_FORMATS.join(", ")
        ));
    }

    if !file_path.exists() {
        return Err("File not found".to_string());
    }

    // Best-effort integrity check: the file must decode as a structurally
    // valid image.
    if DECODABLE_FORMATS.contains(&ext.as_str()) {
        if let Err(e) = image::open(file_path) {
            return Err(format!("File is corrupt or has an invalid format: {}", e));
        }
    }

    Ok(())
}

/// Lowercased extension with its leading dot, or an empty string.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MAX: u64 = 100 * 1024 * 1024;

    fn sample_image(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(8, 8).save(&path).unwrap();
        path
    }

    #[test]
    fn rejects_oversize_files_with_the_limit_in_the_reason() {
        let reason = validate_file(Path::new("big.tif"), MAX + 1, MAX).unwrap_err();
        assert!(reason.contains("100 MB"), "unexpected reason: {}", reason);
    }

    #[test]
    fn rejects_unsupported_extensions_listing_the_accepted_set() {
        let reason = validate_file(Path::new("scan.bmp"), 1024, MAX).unwrap_err();
        assert!(reason.contains(".tif"), "unexpected reason: {}", reason);
        assert!(reason.contains(".png"), "unexpected reason: {}", reason);
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_image(dir.path(), "UPPER.PNG");
        assert_eq!(validate_file(&path, 1024, MAX), Ok(()));
    }

    #[test]
    fn reports_missing_files() {
        let reason = validate_file(Path::new("does-not-exist.tif"), 1024, MAX).unwrap_err();
        assert_eq!(reason, "File not found");
    }

    #[test]
    fn rejects_files_that_do_not_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let reason = validate_file(&path, 1024, MAX).unwrap_err();
        assert!(reason.contains("corrupt"), "unexpected reason: {}", reason);
    }

    #[test]
    fn accepts_an_intact_image_at_the_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_image(dir.path(), "field.png");
        assert_eq!(validate_file(&path, MAX, MAX), Ok(()));
    }

    #[test]
    fn extension_helper_keeps_the_dot_and_lowercases() {
        assert_eq!(file_extension(Path::new("a/b/scan.TIFF")), ".tiff");
        assert_eq!(file_extension(Path::new("noext")), "");
    }
}
