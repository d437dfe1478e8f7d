use std::path::{Path, PathBuf};

/// Audio file extensions the transcription engines accept (lowercase, no dot).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["opus", "mp3", "m4a", "wav"];

/// Whether the file extension is one of [`SUPPORTED_EXTENSIONS`], ignoring case.
pub fn is_supported_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Keep only the supported audio files, in their original order.
pub fn filter_supported(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .iter()
        .filter(|p| is_supported_format(p))
        .cloned()
        .collect()
}

/// Display name of a file (its last path component).
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
