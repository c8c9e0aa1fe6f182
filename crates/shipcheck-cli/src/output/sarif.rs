//! SARIF output formatter for GitHub Code Scanning
//!
//! Emits SARIF 2.1.0 with one result per active gap. Rule metadata comes
//! from the finding-code catalog.

use std::collections::BTreeSet;

use serde::Serialize;
use shipcheck_core::report::{Gap, ValidationContext};
use shipcheck_core::rules::catalog::{self, CodeInfo};
use shipcheck_core::rules::{Confidence, RuleCategory, Severity};

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";
const SRCROOT: &str = "%SRCROOT%";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifOutput {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub version: &'static str,
    pub runs: Vec<SarifRun>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<SarifArtifact>,
    pub properties: SarifRunProperties,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRunProperties {
    pub ship_checklist_status: String,
    pub suppressed_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: &'static str,
    pub semantic_version: String,
    pub rules: Vec<SarifRule>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub short_description: SarifMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_description: Option<SarifMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<SarifMessage>,
    pub default_configuration: SarifRuleConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<SarifRuleProperties>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRuleConfiguration {
    pub level: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRuleProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "security-severity")]
    pub security_severity: Option<String>,
    pub precision: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
    pub partial_fingerprints: SarifPartialFingerprints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<SarifResultProperties>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    pub artifact_location: SarifArtifactLocation,
    pub region: SarifRegion,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifArtifactLocation {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri_base_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    pub start_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPartialFingerprints {
    /// The gap id, stable across runs over unchanged input.
    #[serde(rename = "shipcheckGapId/v1")]
    pub gap_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifArtifact {
    pub location: SarifArtifactLocation,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResultProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[derive(Debug, Default)]
pub struct SarifFormatter;

impl SarifFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, report: &ValidationContext) -> String {
        let output = self.build_output(report);
        let mut rendered = serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string());
        rendered.push('\n');
        rendered
    }

    fn build_output(&self, report: &ValidationContext) -> SarifOutput {
        let rules = catalog::catalog().iter().map(rule_from_catalog).collect();
        let results = report.gaps.iter().map(convert_result).collect();
        let artifacts = build_artifacts(&report.gaps);

        SarifOutput {
            schema: SARIF_SCHEMA,
            version: SARIF_VERSION,
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "shipcheck",
                        semantic_version: report.scanner_version.clone(),
                        rules,
                    },
                },
                results,
                artifacts,
                properties: SarifRunProperties {
                    ship_checklist_status: report.ship_checklist_status.to_string(),
                    suppressed_count: report.suppressed_count,
                },
            }],
        }
    }
}

fn rule_from_catalog(info: &CodeInfo) -> SarifRule {
    let (level, security_severity) = severity_to_sarif(info.severity, info.category);

    let mut tags = vec![info.category.as_str().to_string()];
    if security_severity.is_some() {
        tags.push("security".to_string());
    }
    tags.dedup();

    SarifRule {
        id: info.code.to_string(),
        name: Some(info.title.to_string()),
        short_description: SarifMessage {
            text: info.title.to_string(),
        },
        full_description: Some(SarifMessage {
            text: info.summary.to_string(),
        }),
        help: Some(SarifMessage {
            text: info.fix_notes.join("\n"),
        }),
        default_configuration: SarifRuleConfiguration { level },
        properties: Some(SarifRuleProperties {
            security_severity,
            precision: confidence_to_precision(info.confidence).to_string(),
            tags,
        }),
    }
}

fn convert_result(gap: &Gap) -> SarifResult {
    let severity = parse_severity(&gap.severity);
    let (level, _) = severity_to_sarif(severity, gap.category);
    let end_line = gap
        .evidence
        .first()
        .and_then(|e| e.end_line)
        .filter(|end| Some(*end) != gap.line);

    let properties = if gap.confidence != Confidence::High || !gap.recommended_fix.notes.is_empty() {
        Some(SarifResultProperties {
            confidence: (gap.confidence != Confidence::High)
                .then(|| gap.confidence.as_str().to_lowercase()),
            suggestion: gap.recommended_fix.notes.first().cloned(),
        })
    } else {
        None
    };

    SarifResult {
        rule_id: gap.code.clone(),
        level,
        message: SarifMessage {
            text: format!("{}: {}", gap.title, gap.description),
        },
        locations: vec![SarifLocation {
            physical_location: SarifPhysicalLocation {
                artifact_location: SarifArtifactLocation {
                    uri: normalize_path(&gap.file_path),
                    uri_base_id: Some(SRCROOT.to_string()),
                },
                region: SarifRegion {
                    start_line: gap.line.unwrap_or(1),
                    end_line,
                },
            },
        }],
        partial_fingerprints: SarifPartialFingerprints {
            gap_id: gap.id.clone(),
        },
        properties,
    }
}

fn build_artifacts(gaps: &[Gap]) -> Vec<SarifArtifact> {
    let files: BTreeSet<&str> = gaps.iter().map(|g| g.file_path.as_str()).collect();
    files
        .into_iter()
        .map(|file| SarifArtifact {
            location: SarifArtifactLocation {
                uri: normalize_path(file),
                uri_base_id: Some(SRCROOT.to_string()),
            },
        })
        .collect()
}

fn parse_severity(value: &str) -> Severity {
    match value {
        "critical" => Severity::Critical,
        "high" => Severity::High,
        "medium" => Severity::Medium,
        _ => Severity::Low,
    }
}

fn severity_to_sarif(severity: Severity, category: RuleCategory) -> (String, Option<String>) {
    let level = match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low => "note",
    };

    let security_severity = matches!(
        category,
        RuleCategory::Security | RuleCategory::Auth | RuleCategory::Database
    )
    .then(|| {
        match severity {
            Severity::Critical => "9.0",
            Severity::High => "7.5",
            Severity::Medium => "5.0",
            Severity::Low => "2.0",
        }
        .to_string()
    });

    (level.to_string(), security_severity)
}

fn confidence_to_precision(confidence: Confidence) -> &'static str {
    match confidence {
        Confidence::High => "high",
        Confidence::Medium => "medium",
        Confidence::Low => "low",
    }
}

fn normalize_path(path: &str) -> String {
    path.trim_start_matches("./").to_string()
}
