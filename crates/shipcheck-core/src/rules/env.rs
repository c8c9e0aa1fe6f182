//! Undocumented server-side environment variables (SEC-3).

use crate::declare_rule;
use crate::finding::{EvidenceRef, Finding};
use crate::graph::Graph;
use crate::rules::catalog::SEC_3;
use crate::rules::{Rule, RuleContext, RuleMetadata};

declare_rule!(
    EnvRules,
    id = "env",
    name = "env-documentation",
    description = "Server-side environment variables should be declared in .env.example",
    category = Env,
    codes = ["SEC-3"]
);

impl Rule for EnvRules {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, graph: &Graph, ctx: &RuleContext) -> Vec<Finding> {
        graph
            .env_vars()
            .filter(|var| !var.in_example && !ctx.is_public(&var.name))
            .filter(|var| !ctx.runtime_vars.iter().any(|name| *name == var.name))
            .map(|var| {
                SEC_3.finding(
                    &var.id,
                    format!("{} is read but not declared in .env.example", var.name),
                    EvidenceRef::new(&var.file_path, Some(var.line)).with_snippet(var.name.clone()),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EnvVarOptions, env_var_node};

    fn run_env(vars: &[(&str, bool)]) -> Vec<Finding> {
        run_env_with(&RuleContext::default(), vars)
    }

    fn run_env_with(ctx: &RuleContext, vars: &[(&str, bool)]) -> Vec<Finding> {
        let mut graph = Graph::new();
        for (name, in_example) in vars {
            graph.add_node(env_var_node(
                name,
                "lib/config.ts",
                1,
                EnvVarOptions {
                    is_public: ctx.is_public(name),
                    in_example: *in_example,
                },
            ));
        }
        EnvRules::new().check(&graph, ctx)
    }

    #[test]
    fn undocumented_server_var_is_reported() {
        let findings = run_env(&[("STRIPE_WEBHOOK_SECRET", false)]);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, "SEC-3");
        assert_eq!(findings[0].confidence, crate::rules::Confidence::Low);
    }

    #[test]
    fn documented_and_public_vars_are_skipped() {
        let findings = run_env(&[
            ("DATABASE_URL", true),
            ("NEXT_PUBLIC_SERVICE_ROLE_KEY", false),
        ]);

        assert!(findings.is_empty());
    }

    #[test]
    fn host_provided_vars_are_reported_by_default() {
        let findings = run_env(&[("NODE_ENV", false), ("PORT", false)]);

        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.code == "SEC-3"));
    }

    #[test]
    fn configured_runtime_vars_are_skipped() {
        let ctx = RuleContext {
            runtime_vars: vec!["NODE_ENV".to_string()],
            ..RuleContext::default()
        };

        let findings = run_env_with(&ctx, &[("NODE_ENV", false), ("PORT", false)]);

        assert_eq!(findings.len(), 1);
        assert!(findings[0].description.contains("PORT"));
    }
}
