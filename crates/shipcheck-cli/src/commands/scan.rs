//! Scan command - builds the project graph and prints the validation report

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use shipcheck_core::baseline::{BASELINE_FILENAME, load_baseline_or_default};
use shipcheck_core::config::{Config, find_config_file, load_config_or_default_with_warnings};
use shipcheck_core::report::{BuildOptions, ShipStatus, ValidationContext};
use shipcheck_core::{CancellationToken, FileInfo, ScanEngine};
use tracing::info;
use walkdir::WalkDir;

use crate::commands::CommandStatus;
use crate::output::json::JsonFormatter;
use crate::output::sarif::SarifFormatter;
use crate::output::text::TextFormatter;

const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];
const IGNORED_DIRS: &[&str] = &["node_modules", ".next", "dist", "build", "out", "coverage"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Sarif,
}

/// Ship status at which the command exits with code 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    NoShip,
    NeedsReview,
    Never,
}

impl FailOn {
    pub fn is_reached(&self, status: ShipStatus) -> bool {
        match self {
            FailOn::NoShip => status == ShipStatus::NoShip,
            FailOn::NeedsReview => status >= ShipStatus::NeedsReview,
            FailOn::Never => false,
        }
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Project root to scan (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Output format for the report
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Baseline suppression file (defaults to the configured or project baseline)
    #[arg(long, value_name = "FILE")]
    pub baseline: Option<PathBuf>,

    /// Exit with code 1 once the ship status reaches this level
    #[arg(long, value_enum, default_value = "no-ship")]
    pub fail_on: FailOn,

    /// Abort the scan after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl ScanArgs {
    pub fn run(&self) -> Result<CommandStatus> {
        self.configure_colors();

        let report = self.build_report()?;
        let rendered = match self.format {
            OutputFormat::Json => JsonFormatter::new().format(&report)?,
            OutputFormat::Sarif => SarifFormatter::new().format(&report),
            OutputFormat::Text => TextFormatter::new().format(&report),
        };

        match &self.output {
            Some(path) => {
                fs::write(path, rendered)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                eprintln!(
                    "{} Wrote report to {}",
                    "✓".green().bold(),
                    path.display().to_string().cyan()
                );
            }
            None => print!("{rendered}"),
        }

        if self.fail_on.is_reached(report.ship_checklist_status) {
            return Ok(CommandStatus::Failure);
        }
        Ok(CommandStatus::Success)
    }

    fn build_report(&self) -> Result<ValidationContext> {
        let requested = self.path.clone().unwrap_or_else(|| PathBuf::from("."));
        let root = fs::canonicalize(&requested)
            .with_context(|| format!("Path does not exist: {}", requested.display()))?;
        if !root.is_dir() {
            anyhow::bail!("Not a directory: {}", root.display());
        }

        let config_result = load_config_or_default_with_warnings(&root);
        for warning in &config_result.warnings {
            eprintln!("{} {}", "warning:".yellow().bold(), warning);
        }
        let config = config_result.config;

        let files = discover_files(&root, &config.exclude)?;
        info!(root = %root.display(), files = files.len(), "discovered project files");

        let cancel = match self.timeout {
            Some(secs) => CancellationToken::with_timeout(Duration::from_secs(secs)),
            None => CancellationToken::new(),
        };
        let outcome = ScanEngine::with_config(&config).scan(&root, &files, &cancel)?;

        let baseline_path = self.baseline_path(&root, &config);
        let baseline = load_baseline_or_default(&baseline_path);

        Ok(outcome.report(&BuildOptions {
            baseline,
            project_root: Some(root),
            generated_at: None,
        }))
    }

    /// `--baseline`, then `baseline` from the config (relative to the config
    /// file), then the default file in the project root.
    fn baseline_path(&self, root: &Path, config: &Config) -> PathBuf {
        if let Some(path) = &self.baseline {
            return path.clone();
        }
        if let Some(configured) = &config.baseline {
            let base = find_config_file(root)
                .and_then(|p| p.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| root.to_path_buf());
            return base.join(configured);
        }
        root.join(BASELINE_FILENAME)
    }

    fn configure_colors(&self) {
        let no_color_env = std::env::var("NO_COLOR").is_ok();
        if self.no_color || no_color_env || self.output.is_some() {
            colored::control::set_override(false);
        }
    }
}

/// Source files and migration SQL under `root`, in path order.
pub fn discover_files(root: &Path, exclude: &[String]) -> Result<Vec<FileInfo>> {
    if !root.is_dir() {
        anyhow::bail!("Not a directory: {}", root.display());
    }

    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| !is_excluded(root, e.path(), exclude))
        .filter_map(|e| classify_file(root, e.path()))
        .collect();

    Ok(files)
}

/// A `.sql` file is a migration when a directory between `root` and the
/// file is named `migrations`.
fn classify_file(root: &Path, path: &Path) -> Option<FileInfo> {
    let extension = path.extension().and_then(|ext| ext.to_str())?;
    if SOURCE_EXTENSIONS.contains(&extension) {
        return Some(FileInfo::source(path));
    }
    let in_migrations = path
        .strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .map(|dir| dir.components().any(|c| c.as_os_str() == "migrations"))
        .unwrap_or(false);
    if extension == "sql" && in_migrations {
        return Some(FileInfo::migration(path));
    }
    None
}

fn is_excluded(root: &Path, path: &Path, exclude: &[String]) -> bool {
    if exclude.is_empty() {
        return false;
    }
    let relative = shipcheck_core::normalize::relative_path(root, path);
    exclude.iter().any(|fragment| relative.contains(fragment.as_str()))
}

fn is_ignored(entry: &walkdir::DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.') || (entry.file_type().is_dir() && IGNORED_DIRS.contains(&name)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    fn relative_paths(root: &Path, files: &[FileInfo]) -> Vec<String> {
        files
            .iter()
            .map(|f| shipcheck_core::normalize::relative_path(root, &f.path))
            .collect()
    }

    fn scan_args(path: &Path) -> ScanArgs {
        ScanArgs {
            path: Some(path.to_path_buf()),
            format: OutputFormat::Json,
            output: None,
            baseline: None,
            fail_on: FailOn::Never,
            timeout: None,
            no_color: true,
        }
    }

    #[test]
    fn discovers_sources_and_migrations_in_order() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "app/page.tsx");
        touch(dir.path(), "app/api/x/route.ts");
        touch(dir.path(), "supabase/migrations/0001.sql");
        touch(dir.path(), "scripts/seed.sql");
        touch(dir.path(), "README.md");

        let files = discover_files(dir.path(), &[]).unwrap();

        assert_eq!(
            relative_paths(dir.path(), &files),
            vec!["app/api/x/route.ts", "app/page.tsx", "supabase/migrations/0001.sql"]
        );
        assert!(!files[0].is_migration);
        assert!(files[2].is_migration);
    }

    #[test]
    fn skips_build_output_and_hidden_directories() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "node_modules/dep/index.js");
        touch(dir.path(), ".next/server/page.js");
        touch(dir.path(), "dist/main.js");
        touch(dir.path(), "coverage/lcov.js");
        touch(dir.path(), ".git/hooks/pre-commit.js");
        touch(dir.path(), "lib/ok.ts");

        let files = discover_files(dir.path(), &[]).unwrap();

        assert_eq!(relative_paths(dir.path(), &files), vec!["lib/ok.ts"]);
    }

    #[test]
    fn exclude_fragments_filter_relative_paths() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "lib/a.ts");
        touch(dir.path(), "fixtures/b.ts");

        let files = discover_files(dir.path(), &["fixtures/".to_string()]).unwrap();

        assert_eq!(relative_paths(dir.path(), &files), vec!["lib/a.ts"]);
    }

    #[test]
    fn discover_rejects_missing_directory() {
        assert!(discover_files(Path::new("/no/such/project"), &[]).is_err());
    }

    #[test]
    fn fail_on_thresholds() {
        assert!(FailOn::NoShip.is_reached(ShipStatus::NoShip));
        assert!(!FailOn::NoShip.is_reached(ShipStatus::NeedsReview));
        assert!(FailOn::NeedsReview.is_reached(ShipStatus::NeedsReview));
        assert!(FailOn::NeedsReview.is_reached(ShipStatus::NoShip));
        assert!(!FailOn::NeedsReview.is_reached(ShipStatus::Ship));
        assert!(!FailOn::Never.is_reached(ShipStatus::NoShip));
    }

    #[test]
    fn build_report_applies_project_baseline() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("supabase/migrations")).unwrap();
        fs::write(
            dir.path().join("supabase/migrations/0001.sql"),
            "CREATE POLICY p ON orders USING (true);\n",
        )
        .unwrap();

        let unsuppressed = scan_args(dir.path()).build_report().unwrap();
        fs::write(
            dir.path().join(BASELINE_FILENAME),
            r#"{"suppress":[{"ruleId":"DB-1"}]}"#,
        )
        .unwrap();
        let suppressed = scan_args(dir.path()).build_report().unwrap();

        assert_eq!(unsuppressed.ship_checklist_status, ShipStatus::NoShip);
        assert_eq!(suppressed.ship_checklist_status, ShipStatus::Ship);
        assert_eq!(suppressed.suppressed_count, 1);
    }

    #[test]
    fn configured_baseline_is_relative_to_config_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("shipcheck.toml"),
            "baseline = \"ci/baseline.json\"\n",
        )
        .unwrap();
        let config = Config {
            baseline: Some("ci/baseline.json".to_string()),
            ..Default::default()
        };

        let path = scan_args(dir.path()).baseline_path(dir.path(), &config);

        assert_eq!(path, dir.path().join("ci/baseline.json"));
    }

    #[test]
    fn run_writes_report_file() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("app")).unwrap();
        fs::write(
            dir.path().join("app/page.tsx"),
            "export default function Home() { return null; }\n",
        )
        .unwrap();
        let out = dir.path().join("report.json");
        let mut args = scan_args(dir.path());
        args.output = Some(out.clone());

        let status = args.run().unwrap();

        assert_eq!(status, CommandStatus::Success);
        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(report["shipChecklistStatus"], "ship");
        assert_eq!(report["routes"][0]["path"], "/");
    }

    #[test]
    fn run_reports_failure_when_threshold_is_reached() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("supabase/migrations")).unwrap();
        fs::write(
            dir.path().join("supabase/migrations/0001.sql"),
            "CREATE POLICY p ON orders USING (true);\n",
        )
        .unwrap();
        let out = dir.path().join("report.json");
        let mut args = scan_args(dir.path());
        args.output = Some(out.clone());

        args.fail_on = FailOn::Never;
        assert_eq!(args.run().unwrap(), CommandStatus::Success);

        args.fail_on = FailOn::NoShip;
        assert_eq!(args.run().unwrap(), CommandStatus::Failure);
        assert!(out.exists());
    }

    #[test]
    fn migrations_directory_above_root_is_ignored() {
        let outer = tempdir().unwrap();
        let root = outer.path().join("migrations").join("web");
        touch(&root, "db/seed.sql");
        touch(&root, "supabase/migrations/0001.sql");

        let files = discover_files(&root, &[]).unwrap();

        assert_eq!(relative_paths(&root, &files), vec!["supabase/migrations/0001.sql"]);
        assert!(files[0].is_migration);
    }
}
