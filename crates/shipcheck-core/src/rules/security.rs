//! Public env namespace leaks: service-role keys (SEC-1) and secret-like
//! names (SEC-2).

use std::sync::LazyLock;

use regex::Regex;

use crate::declare_rule;
use crate::finding::{EvidenceRef, Finding};
use crate::graph::{EnvVarNode, Graph};
use crate::rules::catalog::{SEC_1, SEC_2};
use crate::rules::{Rule, RuleContext, RuleMetadata};

static SECRET_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)SECRET|TOKEN|KEY").expect("Invalid regex pattern"));

declare_rule!(
    SecurityRules,
    id = "security",
    name = "public-secrets",
    description = "Secrets must not be exposed through the public env namespace",
    category = Security,
    codes = ["SEC-1", "SEC-2"]
);

impl Rule for SecurityRules {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, graph: &Graph, ctx: &RuleContext) -> Vec<Finding> {
        let mut findings: Vec<Finding> = graph
            .env_vars()
            .filter(|var| var.is_public && has_service_role_marker(&var.name, ctx))
            .map(service_role_leak)
            .collect();

        for var in graph.env_vars() {
            if is_secret_like_public(&var.name, ctx) {
                findings.push(secret_like_public(var, ctx));
            }
        }

        findings
    }
}

fn has_service_role_marker(name: &str, ctx: &RuleContext) -> bool {
    let upper = name.to_ascii_uppercase();
    ctx.service_role_markers
        .iter()
        .any(|marker| upper.contains(&marker.to_ascii_uppercase()))
}

fn is_secret_like_public(name: &str, ctx: &RuleContext) -> bool {
    match name.strip_prefix(ctx.public_prefix.as_str()) {
        Some(rest) => {
            SECRET_LIKE.is_match(rest) && !ctx.safe_public_keys.iter().any(|safe| safe == name)
        }
        None => false,
    }
}

fn service_role_leak(var: &EnvVarNode) -> Finding {
    SEC_1.finding(
        &var.id,
        format!(
            "{} is exposed to the browser and looks like a service-role credential",
            var.name
        ),
        EvidenceRef::new(&var.file_path, Some(var.line)).with_snippet(var.name.clone()),
    )
}

fn secret_like_public(var: &EnvVarNode, ctx: &RuleContext) -> Finding {
    SEC_2.finding(
        &var.id,
        format!(
            "{} uses the {} prefix but is named like a secret",
            var.name, ctx.public_prefix
        ),
        EvidenceRef::new(&var.file_path, Some(var.line)).with_snippet(var.name.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EnvVarOptions, env_var_node};

    fn graph_with(names: &[&str]) -> Graph {
        let ctx = RuleContext::default();
        let mut graph = Graph::new();
        for (index, name) in names.iter().enumerate() {
            graph.add_node(env_var_node(
                name,
                "lib/env.ts",
                index + 1,
                EnvVarOptions {
                    is_public: ctx.is_public(name),
                    in_example: false,
                },
            ));
        }
        graph
    }

    fn run_security(graph: &Graph) -> Vec<Finding> {
        SecurityRules::new().check(graph, &RuleContext::default())
    }

    fn codes(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.code.as_str()).collect()
    }

    #[test]
    fn public_service_role_key_raises_sec_1_and_sec_2() {
        let findings = run_security(&graph_with(&["NEXT_PUBLIC_SERVICE_ROLE_KEY"]));

        assert_eq!(codes(&findings), vec!["SEC-1", "SEC-2"]);
        assert_eq!(findings[0].severity, crate::rules::Severity::Critical);
        assert_eq!(findings[1].severity, crate::rules::Severity::High);
    }

    #[test]
    fn server_side_service_role_key_is_fine() {
        let findings = run_security(&graph_with(&["SUPABASE_SERVICE_ROLE_KEY"]));
        assert!(findings.is_empty());
    }

    #[test]
    fn secret_like_public_names_raise_sec_2() {
        let findings = run_security(&graph_with(&[
            "NEXT_PUBLIC_STRIPE_SECRET",
            "NEXT_PUBLIC_GITHUB_TOKEN",
            "NEXT_PUBLIC_SITE_URL",
        ]));

        assert_eq!(codes(&findings), vec!["SEC-2", "SEC-2"]);
    }

    #[test]
    fn allow_listed_public_keys_are_skipped() {
        let findings = run_security(&graph_with(&[
            "NEXT_PUBLIC_SUPABASE_ANON_KEY",
            "NEXT_PUBLIC_STRIPE_PUBLISHABLE_KEY",
        ]));

        assert!(findings.is_empty());
    }
}
