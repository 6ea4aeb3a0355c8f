//! Path filtering for directory listings.
//!
//! Listings never surface hidden files or build artifacts; the agent has no
//! business editing either, and they drown the useful entries.

use std::path::{Component, Path};

/// True when any normal component of `path` is hidden (leading dot) or
/// named in `excluded_dirs`. The check applies to every segment, so a file
/// nested anywhere under an excluded directory is excluded too.
pub fn is_excluded(path: &Path, excluded_dirs: &[String]) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || excluded_dirs.iter().any(|dir| dir.as_str() == name)
        }
        _ => false,
    })
}
