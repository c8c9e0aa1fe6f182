//! Configuration loading and parsing for shipcheck
//!
//! Provides functionality to load and parse `shipcheck.toml` configuration files.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::boundary::BoundaryDirectives;
use crate::rules::Severity;

pub const CONFIG_FILENAME: &str = "shipcheck.toml";

/// Recognised keys per table; `""` is the document root.
const KNOWN_KEYS: &[(&str, &[&str])] = &[
    ("", &["exclude", "baseline", "rules", "env", "boundary"]),
    ("rules", &["disabled", "severity"]),
    (
        "env",
        &[
            "public_prefix",
            "service_role_markers",
            "safe_public_keys",
            "getter_functions",
            "runtime_vars",
        ],
    ),
    ("boundary", &["client", "server"]),
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is not a valid shipcheck config: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path fragments excluded from discovery, relative to the project root.
    pub exclude: Vec<String>,
    /// Baseline file, relative to the config file's directory.
    pub baseline: Option<String>,
    pub rules: RulesConfig,
    pub env: EnvConfig,
    pub boundary: BoundaryDirectives,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule module ids, module names, or single finding codes.
    pub disabled: Vec<String>,
    /// Severity overrides keyed by finding code.
    #[serde(default)]
    pub severity: HashMap<String, SeverityValue>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvConfig {
    pub public_prefix: String,
    pub service_role_markers: Vec<String>,
    pub safe_public_keys: Vec<String>,
    pub getter_functions: Vec<String>,
    /// Variables the host provides (`NODE_ENV`, `PORT`, ...) that need no
    /// `.env.example` entry. Empty by default.
    pub runtime_vars: Vec<String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            public_prefix: "NEXT_PUBLIC_".to_string(),
            service_role_markers: vec!["SERVICE_ROLE".to_string()],
            safe_public_keys: vec![
                "NEXT_PUBLIC_SUPABASE_ANON_KEY".to_string(),
                "NEXT_PUBLIC_SUPABASE_PUBLISHABLE_KEY".to_string(),
                "NEXT_PUBLIC_STRIPE_PUBLISHABLE_KEY".to_string(),
                "NEXT_PUBLIC_POSTHOG_KEY".to_string(),
            ],
            getter_functions: vec!["getEnv".to_string()],
            runtime_vars: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SeverityValue {
    Critical,
    High,
    Medium,
    Low,
}

impl From<SeverityValue> for Severity {
    fn from(value: SeverityValue) -> Self {
        match value {
            SeverityValue::Critical => Severity::Critical,
            SeverityValue::High => Severity::High,
            SeverityValue::Medium => Severity::Medium,
            SeverityValue::Low => Severity::Low,
        }
    }
}

/// Walks from `start_dir` up to the filesystem root looking for `shipcheck.toml`.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    start_dir
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    read_config(path).map(|(config, _)| config)
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let (config, raw) = read_config(path)?;
    Ok(ConfigResult {
        config,
        warnings: unknown_key_warnings(&raw),
    })
}

fn read_config(path: &Path) -> Result<(Config, toml::Table), ConfigError> {
    let invalid = |message: &str| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: message.trim_end().to_string(),
    };

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: toml::Table = content.parse().map_err(|e: toml::de::Error| invalid(e.message()))?;
    let config: Config = toml::Value::Table(raw.clone())
        .try_into()
        .map_err(|e: toml::de::Error| invalid(e.message()))?;

    Ok((config, raw))
}

fn unknown_key_warnings(raw: &toml::Table) -> Vec<String> {
    let mut warnings = Vec::new();

    for (section, known) in KNOWN_KEYS {
        let table = if section.is_empty() {
            Some(raw)
        } else {
            raw.get(*section).and_then(toml::Value::as_table)
        };
        let Some(table) = table else { continue };

        for key in table.keys().filter(|key| !known.contains(&key.as_str())) {
            if section.is_empty() {
                warnings.push(format!("unknown config key '{key}'"));
            } else {
                warnings.push(format!("unknown config key '{key}' in [{section}]"));
            }
        }
    }

    warnings
}

/// Loads the nearest config, logging and falling back to defaults on error.
pub fn load_config_or_default(start_dir: &Path) -> Config {
    load_config_or_default_with_warnings(start_dir).config
}

pub fn load_config_or_default_with_warnings(start_dir: &Path) -> ConfigResult {
    let Some(path) = find_config_file(start_dir) else {
        return ConfigResult::default();
    };

    load_config_with_warnings(&path).unwrap_or_else(|err| {
        warn!(error = %err, "ignoring invalid config");
        ConfigResult::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn project_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn load_config_from_file() {
        let dir = project_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
exclude = ["scripts/"]
baseline = "ci/baseline.json"

[rules]
disabled = ["performance", "SEC-3"]

[rules.severity]
DB-4 = "low"

[env]
public_prefix = "VITE_"
getter_functions = ["getEnv", "requireEnv"]
runtime_vars = ["NODE_ENV"]

[boundary]
client = "use client"
"#,
        )
        .unwrap();

        let config = load_config(&config_path).unwrap();

        assert_eq!(config.exclude, vec!["scripts/"]);
        assert_eq!(config.baseline.as_deref(), Some("ci/baseline.json"));
        assert_eq!(config.rules.disabled, vec!["performance", "SEC-3"]);
        assert_eq!(config.rules.severity.get("DB-4"), Some(&SeverityValue::Low));
        assert_eq!(config.env.public_prefix, "VITE_");
        assert_eq!(config.env.getter_functions, vec!["getEnv", "requireEnv"]);
        assert_eq!(config.env.runtime_vars, vec!["NODE_ENV"]);
        assert_eq!(config.env.service_role_markers, vec!["SERVICE_ROLE"]);
        assert_eq!(config.boundary.server, "use server");
    }

    #[test]
    fn default_config_when_missing() {
        let dir = project_dir();
        let config = load_config_or_default(dir.path());

        assert_eq!(config, Config::default());
        assert!(config.exclude.is_empty());
        assert!(config.rules.disabled.is_empty());
        assert_eq!(config.env.public_prefix, "NEXT_PUBLIC_");
        assert!(config.env.runtime_vars.is_empty());
    }

    #[test]
    fn error_on_invalid_toml() {
        let dir = project_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "this is not valid { toml }").unwrap();

        let result = load_config(&config_path);

        match result.unwrap_err() {
            ConfigError::Invalid { path, message } => {
                assert_eq!(path, config_path);
                assert!(!message.is_empty());
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_falls_back_to_default() {
        let dir = project_dir();
        fs::write(dir.path().join(CONFIG_FILENAME), "[rules\n").unwrap();

        assert_eq!(load_config_or_default(dir.path()), Config::default());
    }

    #[test]
    fn find_config_file_in_parent_directory() {
        let parent = project_dir();
        let child = parent.path().join("apps").join("web");
        fs::create_dir_all(&child).unwrap();
        let config_path = parent.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "").unwrap();

        assert_eq!(find_config_file(&child), Some(config_path));
    }

    #[test]
    fn find_config_file_returns_none_when_not_found() {
        let dir = project_dir();

        assert!(find_config_file(dir.path()).is_none());
    }

    #[test]
    fn unknown_severity_is_a_parse_error() {
        let dir = project_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "[rules.severity]\nDB-1 = \"error\"\n").unwrap();

        assert!(matches!(
            load_config(&config_path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn severity_value_converts_to_severity() {
        assert_eq!(Severity::from(SeverityValue::Critical), Severity::Critical);
        assert_eq!(Severity::from(SeverityValue::High), Severity::High);
        assert_eq!(Severity::from(SeverityValue::Medium), Severity::Medium);
        assert_eq!(Severity::from(SeverityValue::Low), Severity::Low);
    }

    #[test]
    fn invalid_config_error_names_the_file() {
        let err = ConfigError::Invalid {
            path: PathBuf::from("/path/to/shipcheck.toml"),
            message: "expected `=`".to_string(),
        };

        let msg = format!("{}", err);

        assert!(msg.contains("/path/to/shipcheck.toml"));
        assert!(msg.contains("expected `=`"));
    }

    #[test]
    fn warns_on_unknown_keys_in_each_section() {
        let dir = project_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
include = ["src/**"]

[rules]
enabled = ["ui"]

[env]
prefix = "NEXT_PUBLIC_"
"#,
        )
        .unwrap();

        let result = load_config_with_warnings(&config_path).unwrap();

        assert_eq!(result.warnings.len(), 3);
        assert!(result.warnings[0].contains("include"));
        assert!(result.warnings.iter().any(|w| w.contains("[rules]") && w.contains("enabled")));
        assert!(result.warnings.iter().any(|w| w.contains("[env]") && w.contains("prefix")));
    }

    #[test]
    fn no_warnings_for_valid_config() {
        let dir = project_dir();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(
            &config_path,
            r#"
exclude = ["fixtures/"]

[rules]
disabled = ["UI-3"]

[boundary]
client = "use client"
server = "use server"
"#,
        )
        .unwrap();

        let result = load_config_with_warnings(&config_path).unwrap();

        assert!(result.warnings.is_empty());
    }
}
