//! Rule system for production-readiness checks
//!
//! Each rule module reads the finished [`Graph`] and emits [`Finding`]s.
//! Modules run in a fixed order so the concatenated output is stable.

pub mod catalog;
pub mod database;
pub mod env;
pub mod performance;
pub mod routes;
pub mod security;
pub mod ui;

use std::collections::{HashMap, HashSet};
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{EnvConfig, RulesConfig};
use crate::finding::Finding;
use crate::graph::Graph;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    pub fn as_lowercase(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    #[default]
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Auth,
    Security,
    Database,
    Ui,
    Routes,
    Performance,
    Env,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Auth => "auth",
            RuleCategory::Security => "security",
            RuleCategory::Database => "database",
            RuleCategory::Ui => "ui",
            RuleCategory::Routes => "routes",
            RuleCategory::Performance => "performance",
            RuleCategory::Env => "env",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    pub codes: &'static [&'static str],
}

/// Inputs rules need beyond the graph itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleContext {
    pub public_prefix: String,
    pub service_role_markers: Vec<String>,
    pub safe_public_keys: Vec<String>,
    /// Server-side names exempt from SEC-3.
    pub runtime_vars: Vec<String>,
}

impl RuleContext {
    pub fn from_env_config(env: &EnvConfig) -> Self {
        Self {
            public_prefix: env.public_prefix.clone(),
            service_role_markers: env.service_role_markers.clone(),
            safe_public_keys: env.safe_public_keys.clone(),
            runtime_vars: env.runtime_vars.clone(),
        }
    }

    pub fn is_public(&self, name: &str) -> bool {
        name.starts_with(&self.public_prefix)
    }
}

impl Default for RuleContext {
    fn default() -> Self {
        Self::from_env_config(&EnvConfig::default())
    }
}

pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;
    fn check(&self, graph: &Graph, ctx: &RuleContext) -> Vec<Finding>;
}

pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
    disabled_rules: HashSet<String>,
    severity_overrides: HashMap<String, Severity>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            disabled_rules: HashSet::new(),
            severity_overrides: HashMap::new(),
        }
    }

    /// All six rule modules in evaluation order.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ui::UiRules::new()));
        registry.register(Box::new(routes::RouteRules::new()));
        registry.register(Box::new(security::SecurityRules::new()));
        registry.register(Box::new(database::DatabaseRules::new()));
        registry.register(Box::new(performance::PerformanceRules::new()));
        registry.register(Box::new(env::EnvRules::new()));
        registry
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn configure(&mut self, config: &RulesConfig) {
        self.disabled_rules.clear();
        self.severity_overrides.clear();

        for rule_ref in &config.disabled {
            self.disabled_rules.insert(rule_ref.clone());
        }

        for (code, severity_value) in &config.severity {
            self.severity_overrides
                .insert(code.clone(), (*severity_value).into());
        }
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Runs every enabled module concurrently; output keeps registration
    /// order.
    pub fn run_all(&self, graph: &Graph, ctx: &RuleContext) -> Vec<Finding> {
        let per_rule: Vec<Vec<Finding>> = self
            .rules
            .par_iter()
            .filter(|rule| self.should_run_rule(rule.as_ref()))
            .map(|rule| {
                let mut findings = rule.check(graph, ctx);
                findings.retain(|finding| !self.disabled_rules.contains(&finding.code));
                self.apply_severity_overrides(&mut findings);
                findings
            })
            .collect();

        per_rule.into_iter().flatten().collect()
    }

    fn should_run_rule(&self, rule: &dyn Rule) -> bool {
        !self.is_rule_disabled(rule.metadata())
    }

    fn is_rule_disabled(&self, metadata: &RuleMetadata) -> bool {
        self.disabled_rules.contains(metadata.id) || self.disabled_rules.contains(metadata.name)
    }

    fn apply_severity_overrides(&self, findings: &mut [Finding]) {
        if self.severity_overrides.is_empty() {
            return;
        }
        for finding in findings.iter_mut() {
            if let Some(severity) = self.severity_overrides.get(&finding.code) {
                finding.severity = *severity;
            }
        }
    }

    /// Accepts a module id, module name, or finding code.
    pub fn is_rule_enabled(&self, reference: &str) -> bool {
        if let Some(rule) = self
            .get_rule(reference)
            .or_else(|| self.get_rule_by_name(reference))
        {
            return self.should_run_rule(rule);
        }

        match self.get_rule_by_code(reference) {
            Some(rule) => self.should_run_rule(rule) && !self.disabled_rules.contains(reference),
            None => false,
        }
    }

    pub fn get_rule(&self, id: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().id == id)
            .map(|r| r.as_ref())
    }

    pub fn get_rule_by_name(&self, name: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().name == name)
            .map(|r| r.as_ref())
    }

    pub fn get_rule_by_code(&self, code: &str) -> Option<&dyn Rule> {
        self.rules
            .iter()
            .find(|r| r.metadata().codes.contains(&code))
            .map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[macro_export]
macro_rules! declare_rule {
    (
        $name:ident,
        id = $id:literal,
        name = $rule_name:literal,
        description = $desc:literal,
        category = $cat:ident,
        codes = [$($code:literal),+ $(,)?]
    ) => {
        pub struct $name {
            metadata: $crate::rules::RuleMetadata,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    metadata: $crate::rules::RuleMetadata {
                        id: $id,
                        name: $rule_name,
                        description: $desc,
                        category: $crate::rules::RuleCategory::$cat,
                        codes: &[$($code),+],
                    },
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeverityValue;
    use crate::finding::EvidenceRef;

    struct TestRule {
        metadata: RuleMetadata,
        findings_to_return: Vec<Finding>,
    }

    impl TestRule {
        fn new(id: &'static str, codes: &'static [&'static str]) -> Self {
            Self {
                metadata: RuleMetadata {
                    id,
                    name: "test-rule",
                    description: "A test rule",
                    category: RuleCategory::Database,
                    codes,
                },
                findings_to_return: Vec::new(),
            }
        }

        fn with_name(mut self, name: &'static str) -> Self {
            self.metadata.name = name;
            self
        }

        fn with_finding(mut self, code: &str, severity: Severity) -> Self {
            self.findings_to_return.push(
                Finding::new(
                    code,
                    "migration:m.sql",
                    RuleCategory::Database,
                    severity,
                    Confidence::High,
                    "title",
                    "description",
                )
                .with_evidence(EvidenceRef::new("m.sql", Some(1))),
            );
            self
        }
    }

    impl Rule for TestRule {
        fn metadata(&self) -> &RuleMetadata {
            &self.metadata
        }

        fn check(&self, _graph: &Graph, _ctx: &RuleContext) -> Vec<Finding> {
            self.findings_to_return.clone()
        }
    }

    fn run(registry: &RuleRegistry) -> Vec<Finding> {
        registry.run_all(&Graph::new(), &RuleContext::default())
    }

    #[test]
    fn default_registry_runs_modules_in_fixed_order() {
        let registry = RuleRegistry::with_defaults();
        let ids: Vec<_> = registry.rules().map(|r| r.metadata().id).collect();

        assert_eq!(
            ids,
            vec!["ui", "routes", "security", "database", "performance", "env"]
        );
    }

    #[test]
    fn run_all_preserves_registration_order() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(TestRule::new("a", &["A-1"]).with_finding("A-1", Severity::Low)));
        registry.register(Box::new(TestRule::new("b", &["B-1"]).with_finding("B-1", Severity::Low)));
        registry.register(Box::new(TestRule::new("c", &["C-1"]).with_finding("C-1", Severity::Low)));
        registry.register(Box::new(TestRule::new("d", &["D-1"]).with_finding("D-1", Severity::Low)));

        let codes: Vec<_> = run(&registry).into_iter().map(|f| f.code).collect();

        assert_eq!(codes, vec!["A-1", "B-1", "C-1", "D-1"]);
    }

    #[test]
    fn disabled_module_by_id_or_name_is_skipped() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(
            TestRule::new("first", &["F-1"]).with_finding("F-1", Severity::High),
        ));
        registry.register(Box::new(
            TestRule::new("second", &["S-1"])
                .with_name("second-name")
                .with_finding("S-1", Severity::High),
        ));

        registry.configure(&RulesConfig {
            disabled: vec!["first".to_string(), "second-name".to_string()],
            ..Default::default()
        });

        assert!(run(&registry).is_empty());
        assert!(!registry.is_rule_enabled("first"));
        assert!(!registry.is_rule_enabled("second"));
    }

    #[test]
    fn disabled_code_drops_only_that_code() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(
            TestRule::new("db", &["DB-1", "DB-4"])
                .with_finding("DB-1", Severity::Critical)
                .with_finding("DB-4", Severity::High),
        ));
        registry.configure(&RulesConfig {
            disabled: vec!["DB-4".to_string()],
            ..Default::default()
        });

        let findings = run(&registry);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, "DB-1");
        assert!(registry.is_rule_enabled("DB-1"));
        assert!(!registry.is_rule_enabled("DB-4"));
    }

    #[test]
    fn severity_override_applies_per_code() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(
            TestRule::new("db", &["DB-1", "DB-4"])
                .with_finding("DB-1", Severity::Critical)
                .with_finding("DB-4", Severity::High),
        ));
        let mut severity = HashMap::new();
        severity.insert("DB-4".to_string(), SeverityValue::Low);
        registry.configure(&RulesConfig {
            severity,
            ..Default::default()
        });

        let findings = run(&registry);

        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[1].severity, Severity::Low);
    }

    #[test]
    fn lookups_by_id_name_and_code() {
        let registry = RuleRegistry::with_defaults();

        assert_eq!(registry.get_rule("database").unwrap().metadata().id, "database");
        assert_eq!(
            registry.get_rule_by_name("query-performance").unwrap().metadata().id,
            "performance"
        );
        assert_eq!(registry.get_rule_by_code("SEC-3").unwrap().metadata().id, "env");
        assert!(registry.get_rule("UNKNOWN").is_none());
        assert!(!registry.is_rule_enabled("UNKNOWN"));
        assert_eq!(registry.len(), 6);
        assert!(!registry.is_empty());
    }

    #[test]
    fn severity_serializes_uppercase() {
        assert_eq!(serde_json::to_value(Severity::Critical).unwrap(), "CRITICAL");
        assert_eq!(serde_json::to_value(Confidence::Low).unwrap(), "LOW");
        assert_eq!(serde_json::to_value(RuleCategory::Security).unwrap(), "security");
        assert_eq!(Severity::High.as_lowercase(), "high");
    }

    #[test]
    fn rule_context_public_prefix() {
        let ctx = RuleContext::default();

        assert!(ctx.is_public("NEXT_PUBLIC_SITE_URL"));
        assert!(!ctx.is_public("DATABASE_URL"));
    }
}
