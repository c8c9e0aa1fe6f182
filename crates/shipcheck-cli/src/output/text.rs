//! Human-readable terminal output.

use std::fmt::Write;

use colored::{ColoredString, Colorize};
use shipcheck_core::report::{Gap, ShipStatus, ValidationContext};

const SEVERITY_ORDER: &[&str] = &["critical", "high", "medium", "low"];

#[derive(Debug, Default)]
pub struct TextFormatter;

impl TextFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, report: &ValidationContext) -> String {
        let mut out = String::new();

        for gap in &report.gaps {
            write_gap(&mut out, gap);
        }

        if !report.gaps.is_empty() {
            out.push('\n');
        }

        let counts: Vec<String> = SEVERITY_ORDER
            .iter()
            .map(|severity| {
                let count = report.gaps.iter().filter(|g| g.severity == *severity).count();
                format!("{count} {severity}")
            })
            .collect();

        let _ = writeln!(
            out,
            "{} {} route(s), {} gap(s) ({}), {} suppressed",
            "scanned:".dimmed(),
            report.routes.len(),
            report.gaps.len(),
            counts.join(", "),
            report.suppressed_count
        );
        let _ = writeln!(out, "{} {}", "status:".bold(), format_status(report.ship_checklist_status));

        out
    }
}

fn write_gap(out: &mut String, gap: &Gap) {
    let location = match gap.line {
        Some(line) => format!("{}:{}", gap.file_path, line),
        None => gap.file_path.clone(),
    };

    let _ = writeln!(
        out,
        "{}: {} [{}]: {}",
        location,
        format_severity(&gap.severity),
        gap.code.dimmed(),
        gap.title
    );
    let _ = writeln!(out, "  {}", gap.description);
    for note in &gap.recommended_fix.notes {
        let _ = writeln!(out, "  {} {}", "fix:".green(), note);
    }
}

fn format_severity(severity: &str) -> ColoredString {
    match severity {
        "critical" => severity.red().bold(),
        "high" => severity.red(),
        "medium" => severity.yellow(),
        _ => severity.cyan(),
    }
}

fn format_status(status: ShipStatus) -> ColoredString {
    match status {
        ShipStatus::Ship => status.as_str().green().bold(),
        ShipStatus::NeedsReview => status.as_str().yellow().bold(),
        ShipStatus::NoShip => status.as_str().red().bold(),
    }
}
