//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Check that a render server is an absolute `http`/`https` URL.
///
/// Uses `url` crate for proper parsing, so ports, auth info and paths are
/// all accepted:
///
/// ```ignore
/// is_http_url("https://www.plantuml.com/plantuml") -> true
/// is_http_url("http://localhost:8000")             -> true
/// is_http_url("ftp://example.com")                 -> false
/// is_http_url("plantuml.com")                      -> false
/// ```
pub fn is_http_url(url_str: &str) -> bool {
    url::Url::parse(url_str)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

/// Find config file by searching upward from `start`
///
/// Walks up parent directories until finding `config_name`
/// Returns the path to the config file if found
///
/// # Example
/// ```text
/// /home/user/docs/diagrams/   ← start
/// /home/user/docs/plantlink.toml  ← found!
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

// ============================================================================
// tests
// ============================================================================
