//! Path normalization utilities.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
///
/// # Example
/// ```ignore
/// let abs = normalize_path(Path::new("./docs/sequence.puml"));
/// ```
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Normalize every path and drop duplicates, keeping first-seen order.
pub fn unique_absolute_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = FxHashSet::default();
    paths
        .iter()
        .map(|path| normalize_path(path))
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// Replace the extension with `format`: `docs/a.puml` → `docs/a.png`.
pub fn with_format_extension(path: &Path, format: &str) -> PathBuf {
    path.with_extension(format)
}
