//! Environment variable reads and `.env.example` coverage.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::extractors::{Extractor, ExtractorInput, collect_nodes, line_at};
use crate::graph::{EnvVarOptions, Graph, env_var_node};
use crate::scan::ScanError;

pub const EXAMPLE_ENV_FILES: &[&str] = &[".env.example", "env.example"];

static DOT_ACCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"process\.env\.([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex pattern")
});

static INDEX_ACCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"process\.env\[\s*['"`]([A-Za-z_][A-Za-z0-9_]*)['"`]\s*\]"#)
        .expect("Invalid regex pattern")
});

pub struct EnvVarsExtractor;

impl Extractor for EnvVarsExtractor {
    fn name(&self) -> &'static str {
        "env-vars"
    }

    fn extract(&self, input: &ExtractorInput) -> Result<Graph, ScanError> {
        let declared = load_example_env(input.project_root);
        let getter = getter_pattern(&input.settings.getter_functions);
        let prefix = input.settings.public_prefix.as_str();

        collect_nodes(&input.source_files(), input.cancel, |file| {
            let Some(parsed) = input.sources.get(&file.path) else {
                return Vec::new();
            };
            let source = parsed.source();
            let relative = input.relative(&file.path);

            first_occurrences(source, getter.as_ref())
                .into_iter()
                .map(|(name, offset)| {
                    env_var_node(
                        &name,
                        &relative,
                        line_at(source, offset),
                        EnvVarOptions {
                            is_public: name.starts_with(prefix),
                            in_example: declared.contains(&name),
                        },
                    )
                })
                .collect()
        })
    }
}

/// `getEnv("NAME", fallback)`-style calls for the configured getter names.
fn getter_pattern(getters: &[String]) -> Option<Regex> {
    if getters.is_empty() {
        return None;
    }
    let names = getters
        .iter()
        .map(|g| regex::escape(g))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r#"\b(?:{names})\(\s*['"`]([A-Za-z_][A-Za-z0-9_]*)['"`]\s*,"#
    );
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            debug!(error = %err, "invalid env getter pattern");
            None
        }
    }
}

/// Byte offset of the first read of each variable, keyed by name.
fn first_occurrences(source: &str, getter: Option<&Regex>) -> BTreeMap<String, usize> {
    let mut first: BTreeMap<String, usize> = BTreeMap::new();
    let patterns = [Some(&*DOT_ACCESS), Some(&*INDEX_ACCESS), getter];

    for regex in patterns.into_iter().flatten() {
        for caps in regex.captures_iter(source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            first
                .entry(name.as_str().to_string())
                .and_modify(|offset| *offset = (*offset).min(whole.start()))
                .or_insert(whole.start());
        }
    }

    first
}

/// Names declared as `KEY=` in the first example env file found at the
/// project root. Unreadable or missing files declare nothing.
pub fn load_example_env(project_root: &Path) -> HashSet<String> {
    for name in EXAMPLE_ENV_FILES {
        let path = project_root.join(name);
        if !path.is_file() {
            continue;
        }
        return match std::fs::read_to_string(&path) {
            Ok(content) => parse_example_env(&content),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "failed to read example env");
                HashSet::new()
            }
        };
    }
    HashSet::new()
}

pub fn parse_example_env(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, _) = line.split_once('=')?;
            let key = key.trim();
            let valid = !key.is_empty()
                && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            valid.then(|| key.to_string())
        })
        .collect()
}
