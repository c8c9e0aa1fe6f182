//! Orphan API route detection (UI-3).

use std::collections::HashSet;

use crate::declare_rule;
use crate::finding::{EvidenceRef, Finding};
use crate::graph::Graph;
use crate::normalize::{route_path_to_url_form, strip_query};
use crate::rules::catalog::UI_3;
use crate::rules::{Rule, RuleContext, RuleMetadata};

declare_rule!(
    RouteRules,
    id = "routes",
    name = "orphan-routes",
    description = "API routes should be called from somewhere in the project",
    category = Routes,
    codes = ["UI-3"]
);

impl Rule for RouteRules {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, graph: &Graph, _ctx: &RuleContext) -> Vec<Finding> {
        let targets: HashSet<&str> = graph
            .callsites()
            .filter_map(|call| call.target_path.as_deref())
            .map(strip_query)
            .collect();

        graph
            .routes()
            .filter(|route| route.is_api)
            .filter(|route| {
                !targets.contains(route.path.as_str())
                    && !targets.contains(route_path_to_url_form(&route.path).as_str())
            })
            .map(|route| {
                UI_3.finding(
                    &route.id,
                    format!("No literal call to {} was found", route.path),
                    EvidenceRef::new(&route.file_path, None).with_reason("no matching callsite"),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CallType, CallsiteOptions, callsite_node, route_node};

    fn run_routes(graph: &Graph) -> Vec<Finding> {
        RouteRules::new().check(graph, &RuleContext::default())
    }

    fn call(graph: &mut Graph, line: usize, target: &str) {
        graph.add_node(callsite_node(
            "app/page.tsx",
            line,
            CallType::Fetch,
            CallsiteOptions {
                target_path: Some(target.to_string()),
                target_symbol: Some("fetch".to_string()),
            },
        ));
    }

    #[test]
    fn uncalled_api_route_is_reported() {
        let mut graph = Graph::new();
        graph.add_node(route_node("/api/widgets", "app/api/widgets/route.ts", true, false));

        let findings = run_routes(&graph);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, "UI-3");
        assert_eq!(findings[0].evidence[0].file_path, "app/api/widgets/route.ts");
    }

    #[test]
    fn called_route_is_clean_even_with_query() {
        let mut graph = Graph::new();
        graph.add_node(route_node("/api/widgets", "app/api/widgets/route.ts", true, false));
        graph.add_node(route_node("/api/orders", "app/api/orders/route.ts", true, false));
        call(&mut graph, 5, "/api/widgets");
        call(&mut graph, 6, "/api/orders?page=2");

        assert!(run_routes(&graph).is_empty());
    }

    #[test]
    fn pages_are_not_checked() {
        let mut graph = Graph::new();
        graph.add_node(route_node("/about", "app/about/page.tsx", false, true));

        assert!(run_routes(&graph).is_empty());
    }
}
