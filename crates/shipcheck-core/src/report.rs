//! Validation report: active gaps, route summary, ship checklist and the
//! overall ship decision.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::baseline::ValidationBaseline;
use crate::finding::{EvidenceRef, Finding, RecommendedFix};
use crate::graph::{Graph, RouteNode};
use crate::normalize::relative_path;
use crate::rules::{Confidence, RuleCategory, Severity};

pub const SCHEMA_VERSION: &str = "1.0";
pub const SCANNER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationContext {
    pub schema_version: String,
    pub generated_at: String,
    pub scanner_version: String,
    pub routes: Vec<RouteSummary>,
    pub gaps: Vec<Gap>,
    pub ship_checklist: Vec<ChecklistItem>,
    pub ship_checklist_status: ShipStatus,
    pub suppressed_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub path: String,
    pub status: String,
    pub description: String,
}

/// A finding with its primary evidence inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gap {
    pub id: String,
    pub code: String,
    pub category: RuleCategory,
    /// Lower-case severity name.
    pub severity: String,
    pub confidence: Confidence,
    pub title: String,
    pub description: String,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub evidence: Vec<EvidenceRef>,
    pub recommended_fix: RecommendedFix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecklistStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub status: ChecklistStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShipStatus {
    Ship,
    NeedsReview,
    NoShip,
}

impl ShipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipStatus::Ship => "ship",
            ShipStatus::NeedsReview => "needs-review",
            ShipStatus::NoShip => "no-ship",
        }
    }
}

impl std::fmt::Display for ShipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub baseline: ValidationBaseline,
    /// Absolute evidence paths under this root are rewritten relative to it.
    pub project_root: Option<PathBuf>,
    /// Defaults to now.
    pub generated_at: Option<DateTime<Utc>>,
}

pub fn is_finding_suppressed(finding: &Finding, baseline: &ValidationBaseline) -> bool {
    let evidence = finding.primary_evidence();

    baseline.suppress.iter().any(|entry| {
        if entry.rule_id != finding.code {
            return false;
        }
        if entry.gap_id.is_none() && entry.file_path.is_none() {
            return true;
        }
        if entry.gap_id.as_deref() == Some(finding.id.as_str()) {
            return true;
        }
        match (entry.file_path.as_deref(), evidence) {
            (Some(fragment), Some(evidence)) => {
                evidence.file_path.contains(fragment)
                    && (entry.line.is_none() || entry.line == evidence.line)
            }
            _ => false,
        }
    })
}

/// `no-ship` on any CRITICAL; `needs-review` on HIGH auth or security
/// findings; `ship` otherwise.
pub fn ship_status<'a>(active: impl IntoIterator<Item = &'a Finding>) -> ShipStatus {
    let mut status = ShipStatus::Ship;
    for finding in active {
        match finding.severity {
            Severity::Critical => return ShipStatus::NoShip,
            Severity::High
                if matches!(
                    finding.category,
                    RuleCategory::Auth | RuleCategory::Security
                ) =>
            {
                status = ShipStatus::NeedsReview;
            }
            _ => {}
        }
    }
    status
}

pub fn build_validation_context(
    graph: &Graph,
    findings: &[Finding],
    options: &BuildOptions,
) -> ValidationContext {
    let (suppressed, active): (Vec<&Finding>, Vec<&Finding>) = findings
        .iter()
        .partition(|finding| is_finding_suppressed(finding, &options.baseline));

    let generated_at = options
        .generated_at
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    ValidationContext {
        schema_version: SCHEMA_VERSION.to_string(),
        generated_at,
        scanner_version: SCANNER_VERSION.to_string(),
        routes: graph.routes().map(route_summary).collect(),
        gaps: active
            .iter()
            .map(|finding| to_gap(finding, options.project_root.as_deref()))
            .collect(),
        ship_checklist: ship_checklist(),
        ship_checklist_status: ship_status(active.iter().copied()),
        suppressed_count: suppressed.len(),
    }
}

fn route_summary(route: &RouteNode) -> RouteSummary {
    let description = match (route.is_api, route.is_page) {
        (true, true) => "API route and page",
        (true, false) => "API route",
        (false, true) => "Page",
        (false, false) => "Route",
    };
    RouteSummary {
        path: route.path.clone(),
        status: "ok".to_string(),
        description: format!("{description} ({})", route.file_path),
    }
}

fn to_gap(finding: &Finding, project_root: Option<&Path>) -> Gap {
    let evidence: Vec<EvidenceRef> = finding
        .evidence
        .iter()
        .map(|evidence| EvidenceRef {
            file_path: display_path(&evidence.file_path, project_root),
            ..evidence.clone()
        })
        .collect();
    let (file_path, line) = evidence
        .first()
        .map(|e| (e.file_path.clone(), e.line))
        .unwrap_or_default();

    Gap {
        id: finding.id.clone(),
        code: finding.code.clone(),
        category: finding.category,
        severity: finding.severity.as_lowercase().to_string(),
        confidence: finding.confidence,
        title: finding.title.clone(),
        description: finding.description.clone(),
        file_path,
        line,
        evidence,
        recommended_fix: finding.recommended_fix.clone(),
    }
}

fn display_path(path: &str, project_root: Option<&Path>) -> String {
    match project_root {
        Some(root) if Path::new(path).is_absolute() => relative_path(root, Path::new(path)),
        _ => path.to_string(),
    }
}

fn ship_checklist() -> Vec<ChecklistItem> {
    [
        ("env-site-url", "Site URL environment variable is configured"),
        ("env-supabase", "Supabase URL and anon key are configured"),
        ("env-stripe-webhook", "Payment webhook secret is configured"),
    ]
    .into_iter()
    .map(|(id, label)| ChecklistItem {
        id: id.to_string(),
        label: label.to_string(),
        status: ChecklistStatus::Pass,
    })
    .collect()
}
