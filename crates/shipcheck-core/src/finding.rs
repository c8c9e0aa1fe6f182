//! Findings produced by the rule engine.

use serde::{Deserialize, Serialize};

use crate::rules::{Confidence, RuleCategory, Severity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRef {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EvidenceRef {
    pub fn new(file_path: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            end_line: None,
            snippet: None,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixType {
    WireHandler,
    FixLink,
    RemoveDeadCode,
    MoveToServer,
    DocumentEnv,
    EnableRls,
    AddPolicy,
    ReviewMigration,
    AddPagination,
    SelectColumns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFix {
    #[serde(rename = "type")]
    pub fix_type: FixType,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub code: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub confidence: Confidence,
    pub title: String,
    pub description: String,
    pub evidence: Vec<EvidenceRef>,
    pub recommended_fix: RecommendedFix,
}

impl Finding {
    /// The id is `<code>:<node id>`, so re-running on unchanged input
    /// reproduces it.
    pub fn new(
        code: &str,
        node_id: &str,
        category: RuleCategory,
        severity: Severity,
        confidence: Confidence,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("{code}:{node_id}"),
            code: code.to_string(),
            category,
            severity,
            confidence,
            title: title.into(),
            description: description.into(),
            evidence: Vec::new(),
            recommended_fix: RecommendedFix {
                fix_type: FixType::ReviewMigration,
                notes: Vec::new(),
            },
        }
    }

    pub fn with_evidence(mut self, evidence: EvidenceRef) -> Self {
        self.evidence.push(evidence);
        self
    }

    pub fn with_fix(mut self, fix_type: FixType, notes: &[&str]) -> Self {
        self.recommended_fix = RecommendedFix {
            fix_type,
            notes: notes.iter().map(|n| n.to_string()).collect(),
        };
        self
    }

    pub fn primary_evidence(&self) -> Option<&EvidenceRef> {
        self.evidence.first()
    }
}
