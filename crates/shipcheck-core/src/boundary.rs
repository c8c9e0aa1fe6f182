//! Client / server-action boundary detection from leading directives.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

const MAX_HEADER_BYTES: u64 = 1024;
const MAX_HEADER_LINES: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Boundary {
    pub is_client: bool,
    pub is_server_action: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryDirectives {
    pub client: String,
    pub server: String,
}

impl Default for BoundaryDirectives {
    fn default() -> Self {
        Self {
            client: "use client".to_string(),
            server: "use server".to_string(),
        }
    }
}

/// Classifies a file from its first bytes. Never fails: unreadable files
/// are neither client nor server-action.
pub fn detect_boundary(path: &Path, directives: &BoundaryDirectives) -> Boundary {
    let mut buf = Vec::with_capacity(MAX_HEADER_BYTES as usize);
    let read = File::open(path).and_then(|file| file.take(MAX_HEADER_BYTES).read_to_end(&mut buf));

    if let Err(err) = read {
        debug!(path = %path.display(), error = %err, "boundary detection skipped");
        return Boundary::default();
    }

    detect_boundary_in(&String::from_utf8_lossy(&buf), directives)
}

pub fn detect_boundary_in(text: &str, directives: &BoundaryDirectives) -> Boundary {
    let mut boundary = Boundary::default();

    for line in text.lines().take(MAX_HEADER_LINES) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !is_comment(trimmed) && !is_string_statement(trimmed) {
            break;
        }

        if contains_directive(trimmed, &directives.client) {
            boundary.is_client = true;
        }
        if contains_directive(trimmed, &directives.server) {
            boundary.is_server_action = true;
        }
    }

    boundary
}

fn is_comment(line: &str) -> bool {
    line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

fn is_string_statement(line: &str) -> bool {
    line.starts_with('\'') || line.starts_with('"') || line.starts_with('`')
}

fn contains_directive(line: &str, directive: &str) -> bool {
    line.contains(&format!("'{directive}'"))
        || line.contains(&format!("\"{directive}\""))
        || line.contains(&format!("`{directive}`"))
}
