//! Path normalization helpers shared by extractors and rules.

use std::path::Path;

/// Path of `path` relative to `root`, always with `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// App Router URL path for a relative file path: the folder segments after
/// the first `app` segment, with the file name dropped.
pub fn app_route_path(relative: &str) -> String {
    let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();

    let folders = match segments.iter().position(|s| *s == "app") {
        Some(index) => &segments[index + 1..segments.len().saturating_sub(1).max(index + 1)],
        None => &segments[..segments.len().saturating_sub(1)],
    };

    if folders.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", folders.join("/"))
    }
}

/// Drops `(group)` segments and collapses repeated slashes.
pub fn route_path_to_url_form(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .filter(|s| !(s.starts_with('(') && s.ends_with(')')))
        .collect();

    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

pub fn strip_query(path: &str) -> &str {
    match path.find(['?', '#']) {
        Some(index) => &path[..index],
        None => path,
    }
}
