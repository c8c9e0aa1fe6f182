//! Baseline suppression file (`validation-baseline.json`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const BASELINE_FILENAME: &str = "validation-baseline.json";

#[derive(Debug, thiserror::Error)]
pub enum BaselineError {
    #[error("Failed to read baseline '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid baseline JSON in '{path}': {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationBaseline {
    pub suppress: Vec<SuppressionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionEntry {
    pub rule_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl SuppressionEntry {
    pub fn for_rule(rule_id: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            gap_id: None,
            file_path: None,
            line: None,
        }
    }
}

pub fn load_baseline(path: &Path) -> Result<ValidationBaseline, BaselineError> {
    let content = std::fs::read_to_string(path).map_err(|e| BaselineError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| BaselineError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Missing files are an empty baseline; malformed ones are logged and
/// treated as empty.
pub fn load_baseline_or_default(path: &Path) -> ValidationBaseline {
    if !path.exists() {
        return ValidationBaseline::default();
    }
    load_baseline(path).unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unusable baseline");
        ValidationBaseline::default()
    })
}
