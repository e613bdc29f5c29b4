use std::borrow::Cow;
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::warn;

/// Validates that a file's size is within `max_bytes`
///
/// Takes an open file handle so the size that was checked is the size of the
/// file that gets read, even if the path is replaced in between.
///
/// # Errors
///
/// Returns an error if:
/// - The file metadata cannot be read
/// - The file is larger than `max_bytes`
pub fn validate_file_size(file: &File, path: &Path, max_bytes: u64) -> Result<()> {
    let metadata = file
        .metadata()
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;

    let file_size = metadata.len();
    if file_size > max_bytes {
        bail!("File too large: {} ({} bytes, max {} bytes)", path.display(), file_size, max_bytes);
    }

    Ok(())
}

/// Open a document for reading after checking its size
pub fn open_document(path: &Path, max_bytes: u64) -> Result<File> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open document: {}", path.display()))?;
    validate_file_size(&file, path, max_bytes)?;
    Ok(file)
}

/// Read a whole document into memory
///
/// Invalid UTF-8 is replaced, not rejected.
pub fn read_document(path: &Path, max_bytes: u64) -> Result<String> {
    let mut file = open_document(path, max_bytes)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            warn!("{} is not valid UTF-8; replacing invalid bytes", path.display());
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Formats a path with ~ substitution for the home directory
pub fn format_path_with_tilde(path: &Path) -> String {
    format_path_with_tilde_internal(path, None)
}

pub(crate) fn format_path_with_tilde_internal(path: &Path, home_override: Option<&str>) -> String {
    let home_from_env = env::var("HOME").ok();
    let home = home_override.or(home_from_env.as_deref());

    let path_str = path.to_string_lossy();
    if let Some(home) = home
        && !home.is_empty()
        && path_str.starts_with(home)
    {
        return path_str.replacen(home, "~", 1);
    }

    match path_str {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_read_document_within_limit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("watch-history.html");
        fs::write(&path, "<div>Watched</div>").unwrap();

        assert_eq!(read_document(&path, 1024).unwrap(), "<div>Watched</div>");
    }

    #[test]
    fn test_read_document_too_large() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.html");
        fs::write(&path, "x".repeat(2048)).unwrap();

        let err = read_document(&path, 1024).unwrap_err();
        assert!(err.to_string().contains("File too large"));
    }

    #[test]
    fn test_read_document_missing_file() {
        let err = read_document(Path::new("/nonexistent/watch-history.html"), 1024).unwrap_err();
        assert!(err.to_string().contains("Failed to open document"));
    }

    #[test]
    fn test_read_document_replaces_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.html");
        fs::write(&path, b"Watched \xff title").unwrap();

        let text = read_document(&path, 1024).unwrap();
        assert_eq!(text, "Watched \u{FFFD} title");
    }

    #[test]
    fn test_format_path_with_tilde() {
        let path = PathBuf::from("/home/viewer/Takeout/watch-history.html");
        assert_eq!(
            format_path_with_tilde_internal(&path, Some("/home/viewer")),
            "~/Takeout/watch-history.html"
        );

        let outside = PathBuf::from("/tmp/watch-history.html");
        assert_eq!(
            format_path_with_tilde_internal(&outside, Some("/home/viewer")),
            "/tmp/watch-history.html"
        );
    }
}
