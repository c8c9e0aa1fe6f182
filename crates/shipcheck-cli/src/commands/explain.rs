//! Explain command - describes a finding code or a rule module

use std::env;
use std::fmt::Write;

use clap::Args;
use colored::Colorize;
use shipcheck_core::ScanEngine;
use shipcheck_core::config::load_config_or_default_with_warnings;
use shipcheck_core::rules::catalog::{self, CodeInfo};
use shipcheck_core::rules::{Rule, RuleRegistry, Severity};

use crate::commands::CommandStatus;

#[derive(Args, Debug)]
pub struct ExplainArgs {
    #[arg(
        value_name = "CODE",
        help = "Finding code or rule module to explain (e.g. \"DB-2\", \"security\")"
    )]
    pub code: String,
}

impl ExplainArgs {
    pub fn run(&self) -> anyhow::Result<CommandStatus> {
        let cwd = env::current_dir()?;
        let config = load_config_or_default_with_warnings(&cwd).config;
        let engine = ScanEngine::with_config(&config);

        match explain(engine.registry(), &self.code) {
            Some(text) => {
                print!("{text}");
                Ok(CommandStatus::Success)
            }
            None => {
                eprintln!(
                    "{} unknown finding code or rule '{}'",
                    "error:".red().bold(),
                    self.code
                );
                eprintln!();
                eprintln!("Available codes:");
                for info in catalog::catalog() {
                    eprintln!("  {} ({}) {}", info.code, info.module, info.title);
                }
                Ok(CommandStatus::Failure)
            }
        }
    }
}

/// Renders a code entry, or a module with all of its codes.
fn explain(registry: &RuleRegistry, query: &str) -> Option<String> {
    if let Some(info) = catalog::lookup(query) {
        return Some(describe_code(registry, info));
    }

    let rule = registry
        .get_rule(query)
        .or_else(|| registry.get_rule_by_name(query))?;
    Some(describe_module(registry, rule))
}

fn describe_code(registry: &RuleRegistry, info: &CodeInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", format!("{}: {}", info.code, info.title).bold());
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}: {}", "Summary".cyan(), info.summary);
    let _ = writeln!(out, "  {}: {}", "Module".cyan(), info.module);
    let _ = writeln!(out, "  {}: {}", "Category".cyan(), info.category.as_str());
    let _ = writeln!(out, "  {}: {}", "Severity".cyan(), format_severity(info.severity));
    let _ = writeln!(out, "  {}: {}", "Confidence".cyan(), info.confidence.as_str());
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}:", "Recommended fix".cyan());
    for note in info.fix_notes {
        let _ = writeln!(out, "    - {note}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}: {}", "Status".cyan(), format_enabled(registry.is_rule_enabled(info.code)));
    let _ = writeln!(out);
    out
}

fn describe_module(registry: &RuleRegistry, rule: &dyn Rule) -> String {
    let metadata = rule.metadata();
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", format!("Module {}", metadata.id).bold());
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}: {}", "Name".cyan(), metadata.name);
    let _ = writeln!(out, "  {}: {}", "Description".cyan(), metadata.description);
    let _ = writeln!(out, "  {}: {}", "Category".cyan(), metadata.category.as_str());
    let _ = writeln!(out, "  {}:", "Codes".cyan());
    for info in catalog::codes_for_module(metadata.id) {
        let _ = writeln!(out, "    {} {} ({})", info.code, info.title, format_severity(info.severity));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}: {}", "Status".cyan(), format_enabled(registry.is_rule_enabled(metadata.id)));
    let _ = writeln!(out);
    out
}

fn format_severity(severity: Severity) -> String {
    match severity {
        Severity::Critical => severity.as_str().red().bold().to_string(),
        Severity::High => severity.as_str().red().to_string(),
        Severity::Medium => severity.as_str().yellow().to_string(),
        Severity::Low => severity.as_str().cyan().to_string(),
    }
}

fn format_enabled(enabled: bool) -> String {
    if enabled {
        "enabled".green().to_string()
    } else {
        "disabled".red().to_string()
    }
}
