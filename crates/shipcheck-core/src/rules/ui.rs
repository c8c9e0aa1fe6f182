//! UI wiring rules: unwired controls (UI-1) and dead internal links (UI-2).

use std::collections::HashSet;

use crate::declare_rule;
use crate::finding::{EvidenceRef, Finding};
use crate::graph::{Graph, UiActionNode};
use crate::normalize::{route_path_to_url_form, strip_query};
use crate::rules::catalog::{UI_1, UI_2};
use crate::rules::{Rule, RuleContext, RuleMetadata};

declare_rule!(
    UiRules,
    id = "ui",
    name = "ui-wiring",
    description = "Buttons and links must do something and lead somewhere",
    category = Ui,
    codes = ["UI-1", "UI-2"]
);

impl Rule for UiRules {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, graph: &Graph, _ctx: &RuleContext) -> Vec<Finding> {
        let routes = KnownRoutes::from_graph(graph);
        let mut findings = Vec::new();

        for action in graph.ui_actions() {
            if action.suspicious {
                findings.push(unwired(action));
            }

            if let Some(href) = action.href.as_deref() {
                if is_internal_href(href) && !routes.matches(href) {
                    findings.push(dead_link(action, href));
                }
            }
        }

        findings
    }
}

fn unwired(action: &UiActionNode) -> Finding {
    let label = action
        .label
        .as_deref()
        .map(|l| format!(" \"{l}\""))
        .unwrap_or_default();
    let description = format!(
        "<{}>{} in {} does not trigger any action",
        action.element, label, action.file_path
    );

    UI_1.finding(
        &action.id,
        description,
        EvidenceRef::new(&action.file_path, Some(action.line))
            .with_reason("control has no effective handler"),
    )
}

fn dead_link(action: &UiActionNode, href: &str) -> Finding {
    UI_2.finding(
        &action.id,
        format!("Link to {href} does not match any page or route"),
        EvidenceRef::new(&action.file_path, Some(action.line))
            .with_snippet(format!("href=\"{href}\""))
            .with_reason("no route serves this path"),
    )
}

fn is_internal_href(href: &str) -> bool {
    !(href.is_empty() || href == "-" || href.starts_with('#') || href.starts_with("http"))
}

/// Route paths in both raw and group-stripped form. Matching is literal:
/// `/orders/42` does not match `/orders/[id]`.
struct KnownRoutes {
    paths: HashSet<String>,
}

impl KnownRoutes {
    fn from_graph(graph: &Graph) -> Self {
        let mut paths = HashSet::new();
        for route in graph.routes() {
            paths.insert(route_path_to_url_form(&route.path));
            paths.insert(route.path.clone());
        }
        Self { paths }
    }

    fn matches(&self, href: &str) -> bool {
        self.paths.contains(href) || self.paths.contains(strip_query(href))
    }
}
