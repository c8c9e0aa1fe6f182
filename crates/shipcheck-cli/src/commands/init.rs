//! Init command - writes a default configuration and an empty baseline

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use shipcheck_core::baseline::BASELINE_FILENAME;
use shipcheck_core::config::CONFIG_FILENAME;

use crate::commands::CommandStatus;

const DEFAULT_CONFIG: &str = r#"# shipcheck configuration file

# Path fragments to skip during discovery
# exclude = ["fixtures/", "scripts/"]

# Baseline suppression file, relative to this file
# baseline = "validation-baseline.json"

[rules]
# Disable rule modules (ui, routes, security, database, performance, env)
# or single finding codes
# disabled = ["performance", "SEC-3"]

# Override the severity of a finding code
# [rules.severity]
# DB-4 = "medium"

[env]
# public_prefix = "NEXT_PUBLIC_"
# service_role_markers = ["SERVICE_ROLE"]
# safe_public_keys = ["NEXT_PUBLIC_SUPABASE_ANON_KEY"]
# getter_functions = ["getEnv"]
# runtime_vars = ["NODE_ENV", "PORT"]

[boundary]
# client = "use client"
# server = "use server"
"#;

const EMPTY_BASELINE: &str = "{\n  \"suppress\": []\n}\n";

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory to initialize (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(&self) -> Result<CommandStatus> {
        let dir = self.path.clone().unwrap_or_else(|| PathBuf::from("."));
        let config_path = dir.join(CONFIG_FILENAME);

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Config file '{}' already exists. Use --force to overwrite.",
                CONFIG_FILENAME
            );
        }

        write_file(&config_path, DEFAULT_CONFIG)?;
        println!(
            "{} Created {} configuration file",
            "✓".green().bold(),
            CONFIG_FILENAME.cyan()
        );

        let baseline_path = dir.join(BASELINE_FILENAME);
        if baseline_path.exists() && !self.force {
            println!(
                "{} Kept existing {}",
                "•".dimmed(),
                BASELINE_FILENAME.cyan()
            );
        } else {
            write_file(&baseline_path, EMPTY_BASELINE)?;
            println!(
                "{} Created {} baseline file",
                "✓".green().bold(),
                BASELINE_FILENAME.cyan()
            );
        }

        Ok(CommandStatus::Success)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
