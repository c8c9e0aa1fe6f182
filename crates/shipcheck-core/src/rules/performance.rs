//! Query shape checks over Supabase selects (PERF-1, PERF-2).

use crate::declare_rule;
use crate::finding::{EvidenceRef, Finding};
use crate::graph::{Graph, QueryOperation};
use crate::rules::catalog::{PERF_1, PERF_2};
use crate::rules::{Rule, RuleContext, RuleMetadata};

declare_rule!(
    PerformanceRules,
    id = "performance",
    name = "query-performance",
    description = "Select queries should be paginated and name their columns",
    category = Performance,
    codes = ["PERF-1", "PERF-2"]
);

impl Rule for PerformanceRules {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, graph: &Graph, _ctx: &RuleContext) -> Vec<Finding> {
        let mut findings = Vec::new();

        for query in graph
            .supabase_queries()
            .filter(|q| q.operation == QueryOperation::Select)
        {
            let count_only = query.is_count_only == Some(true);
            let evidence = || {
                EvidenceRef::new(&query.file_path, Some(query.line))
                    .with_snippet(format!(".from('{}').select(...)", query.table))
            };

            if query.has_pagination != Some(true) && query.is_single_row != Some(true) && !count_only {
                findings.push(PERF_1.finding(
                    &query.id,
                    format!("Select on {} has no range or limit", query.table),
                    evidence().with_reason("unbounded result set"),
                ));
            }

            if query.select_all == Some(true) && !count_only {
                findings.push(PERF_2.finding(
                    &query.id,
                    format!("Select on {} fetches every column", query.table),
                    evidence().with_reason("select() or select('*')"),
                ));
            }
        }

        findings
    }
}
