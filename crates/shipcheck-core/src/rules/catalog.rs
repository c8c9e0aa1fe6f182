//! Static description of every finding code.
//!
//! Rules build their findings from these entries so titles, severities and
//! fix hints stay identical between the report, `explain` and SARIF output.

use crate::finding::{EvidenceRef, Finding, FixType};
use crate::rules::{Confidence, RuleCategory, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeInfo {
    pub code: &'static str,
    /// Id of the rule module that emits this code.
    pub module: &'static str,
    pub title: &'static str,
    pub category: RuleCategory,
    pub severity: Severity,
    pub confidence: Confidence,
    pub summary: &'static str,
    pub fix_type: FixType,
    pub fix_notes: &'static [&'static str],
}

impl CodeInfo {
    pub fn finding(&self, node_id: &str, description: impl Into<String>, evidence: EvidenceRef) -> Finding {
        Finding::new(
            self.code,
            node_id,
            self.category,
            self.severity,
            self.confidence,
            self.title,
            description,
        )
        .with_evidence(evidence)
        .with_fix(self.fix_type, self.fix_notes)
    }
}

pub const UI_1: CodeInfo = CodeInfo {
    code: "UI-1",
    module: "ui",
    title: "Unwired UI control",
    category: RuleCategory::Ui,
    severity: Severity::Medium,
    confidence: Confidence::High,
    summary: "A button or link has no handler, no submit behaviour, or a handler that does nothing.",
    fix_type: FixType::WireHandler,
    fix_notes: &[
        "Attach an onClick handler that performs the action",
        "Or make the control submit its form with type=\"submit\"",
    ],
};

pub const UI_2: CodeInfo = CodeInfo {
    code: "UI-2",
    module: "ui",
    title: "Dead link",
    category: RuleCategory::Ui,
    severity: Severity::Medium,
    confidence: Confidence::High,
    summary: "An internal href points at a path that no page or route serves.",
    fix_type: FixType::FixLink,
    fix_notes: &["Point the link at an existing route", "Or add the missing page"],
};

pub const UI_3: CodeInfo = CodeInfo {
    code: "UI-3",
    module: "routes",
    title: "Orphan API route",
    category: RuleCategory::Routes,
    severity: Severity::Low,
    confidence: Confidence::Medium,
    summary: "An API route is never called by a literal fetch, axios or router call in the project.",
    fix_type: FixType::RemoveDeadCode,
    fix_notes: &[
        "Remove the route if it is unused",
        "Calls built from dynamic or templated paths are not matched",
    ],
};

pub const SEC_1: CodeInfo = CodeInfo {
    code: "SEC-1",
    module: "security",
    title: "Service-role secret exposed to the browser",
    category: RuleCategory::Security,
    severity: Severity::Critical,
    confidence: Confidence::High,
    summary: "A public-prefixed environment variable carries a service-role credential, which is inlined into client bundles.",
    fix_type: FixType::MoveToServer,
    fix_notes: &[
        "Drop the public prefix and read the key only in server code",
        "Rotate the exposed key",
    ],
};

pub const SEC_2: CodeInfo = CodeInfo {
    code: "SEC-2",
    module: "security",
    title: "Secret-like value in public env namespace",
    category: RuleCategory::Security,
    severity: Severity::High,
    confidence: Confidence::High,
    summary: "A public-prefixed environment variable is named like a secret, token or key.",
    fix_type: FixType::MoveToServer,
    fix_notes: &[
        "Move the value to a server-only variable",
        "Add the name to env.safe_public_keys if it is meant to be public",
    ],
};

pub const DB_1: CodeInfo = CodeInfo {
    code: "DB-1",
    module: "database",
    title: "Table without row level security",
    category: RuleCategory::Database,
    severity: Severity::Critical,
    confidence: Confidence::High,
    summary: "A migration defines policies or touches a table without enabling row level security on it.",
    fix_type: FixType::EnableRls,
    fix_notes: &["ALTER TABLE <table> ENABLE ROW LEVEL SECURITY;"],
};

pub const DB_2: CodeInfo = CodeInfo {
    code: "DB-2",
    module: "database",
    title: "Row level security without policies",
    category: RuleCategory::Database,
    severity: Severity::High,
    confidence: Confidence::High,
    summary: "Row level security is enabled but no policy grants access, so every non-service query is denied.",
    fix_type: FixType::AddPolicy,
    fix_notes: &["CREATE POLICY ... ON <table> FOR SELECT USING (...);"],
};

pub const DB_4: CodeInfo = CodeInfo {
    code: "DB-4",
    module: "database",
    title: "Destructive migration",
    category: RuleCategory::Database,
    severity: Severity::High,
    confidence: Confidence::Medium,
    summary: "A migration drops, truncates or retypes data.",
    fix_type: FixType::ReviewMigration,
    fix_notes: &[
        "Confirm the data loss is intended",
        "Take a backup before applying in production",
    ],
};

pub const PERF_1: CodeInfo = CodeInfo {
    code: "PERF-1",
    module: "performance",
    title: "Unbounded select",
    category: RuleCategory::Performance,
    severity: Severity::Medium,
    confidence: Confidence::Medium,
    summary: "A select query has no range or limit and is not a single-row or count-only query.",
    fix_type: FixType::AddPagination,
    fix_notes: &["Add .range(from, to) or .limit(n) to the query"],
};

pub const PERF_2: CodeInfo = CodeInfo {
    code: "PERF-2",
    module: "performance",
    title: "Select of all columns",
    category: RuleCategory::Performance,
    severity: Severity::Low,
    confidence: Confidence::High,
    summary: "A select query fetches every column.",
    fix_type: FixType::SelectColumns,
    fix_notes: &["List the columns the caller needs in .select(...)"],
};

pub const SEC_3: CodeInfo = CodeInfo {
    code: "SEC-3",
    module: "env",
    title: "Undocumented environment variable",
    category: RuleCategory::Env,
    severity: Severity::Medium,
    confidence: Confidence::Low,
    summary: "A server-side environment variable is read but not declared in .env.example.",
    fix_type: FixType::DocumentEnv,
    fix_notes: &["Add NAME= to .env.example"],
};

/// Every code in rule evaluation order.
pub const ALL: &[CodeInfo] = &[
    UI_1, UI_2, UI_3, SEC_1, SEC_2, DB_1, DB_2, DB_4, PERF_1, PERF_2, SEC_3,
];

pub fn catalog() -> &'static [CodeInfo] {
    ALL
}

/// Case-insensitive lookup by finding code.
pub fn lookup(code: &str) -> Option<&'static CodeInfo> {
    ALL.iter().find(|info| info.code.eq_ignore_ascii_case(code))
}

pub fn codes_for_module(module: &str) -> impl Iterator<Item = &'static CodeInfo> + '_ {
    ALL.iter().filter(move |info| info.module == module)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::rules::RuleRegistry;

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<_> = ALL.iter().map(|info| info.code).collect();
        assert_eq!(codes.len(), ALL.len());
    }

    #[test]
    fn every_code_belongs_to_a_registered_module() {
        let registry = RuleRegistry::with_defaults();
        for info in ALL {
            let rule = registry
                .get_rule(info.module)
                .unwrap_or_else(|| panic!("no module {} for {}", info.module, info.code));
            assert!(
                rule.metadata().codes.contains(&info.code),
                "{} not declared by module {}",
                info.code,
                info.module
            );
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("db-2").map(|i| i.code), Some("DB-2"));
        assert!(lookup("DB-3").is_none());
    }

    #[test]
    fn module_codes() {
        let codes: Vec<_> = codes_for_module("security").map(|i| i.code).collect();
        assert_eq!(codes, vec!["SEC-1", "SEC-2"]);
    }

    #[test]
    fn finding_carries_catalog_values() {
        let finding = DB_1.finding(
            "migration:m.sql:orders",
            "orders has no RLS",
            EvidenceRef::new("m.sql", None),
        );

        assert_eq!(finding.id, "DB-1:migration:m.sql:orders");
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.confidence, Confidence::High);
        assert_eq!(finding.recommended_fix.fix_type, FixType::EnableRls);
        assert_eq!(finding.evidence.len(), 1);
    }
}
