//! Shared, concurrent cache of parsed source files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::parser::ParsedFile;

/// Parses each file at most once per scan. Entries are immutable once
/// inserted; unreadable files are cached as `None`.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: DashMap<PathBuf, Option<Arc<ParsedFile>>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the file if it could be read, even when parsing failed.
    pub fn load(&self, path: &Path) -> Option<Arc<ParsedFile>> {
        if let Some(entry) = self.entries.get(path) {
            return entry.clone();
        }

        let parsed = match std::fs::read_to_string(path) {
            Ok(source) => {
                let parsed = ParsedFile::from_source(&path.to_string_lossy(), &source);
                if parsed.module().is_none() {
                    debug!(path = %path.display(), errors = parsed.errors().len(), "unparseable source file");
                }
                Some(Arc::new(parsed))
            }
            Err(err) => {
                debug!(path = %path.display(), error = %err, "failed to read source file");
                None
            }
        };

        self.entries
            .entry(path.to_path_buf())
            .or_insert(parsed)
            .clone()
    }

    /// Returns the file only if it parsed into a module.
    pub fn get(&self, path: &Path) -> Option<Arc<ParsedFile>> {
        self.load(path).filter(|file| file.module().is_some())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
