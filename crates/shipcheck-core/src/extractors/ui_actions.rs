//! Interactive JSX controls: buttons, anchors, `Link`s and anything with an
//! `onClick`.

use std::ops::ControlFlow;
use std::sync::LazyLock;

use regex::Regex;
use swc_common::Spanned;
use swc_ecma_ast::{JSXAttrOrSpread, JSXElement, JSXElementChild};

use crate::extractors::routes::{RouteFileKind, route_file_kind};
use crate::extractors::{Extractor, ExtractorInput, collect_nodes};
use crate::graph::{Graph, Node, UiActionOptions, ui_action_node};
use crate::normalize::app_route_path;
use crate::scan::ScanError;
use crate::visitor::{AstVisitor, VisitorContext, walk_ast};

const CONTROL_ELEMENTS: &[&str] = &["button", "a", "Link"];

static NOOP_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:async\s*)?(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>\s*(?:\{\s*\}|null|undefined|void\s+0|\(\s*\))$|^(?:null|undefined)$",
    )
    .expect("Invalid regex pattern")
});

static HANDLER_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*$").expect("Invalid regex pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrValue {
    /// Boolean attribute with no value.
    Absent,
    Literal(String),
    /// Text inside `{...}`.
    Expr(String),
}

impl AttrValue {
    fn literal(&self) -> Option<&str> {
        match self {
            AttrValue::Literal(value) => Some(value),
            _ => None,
        }
    }
}

pub struct UiActionsExtractor;

impl Extractor for UiActionsExtractor {
    fn name(&self) -> &'static str {
        "ui-actions"
    }

    fn extract(&self, input: &ExtractorInput) -> Result<Graph, ScanError> {
        collect_nodes(&input.source_files(), input.cancel, |file| {
            let Some(parsed) = input.sources.get(&file.path) else {
                return Vec::new();
            };
            let Some(module) = parsed.module() else {
                return Vec::new();
            };

            let relative = input.relative(&file.path);
            let route_path = match route_file_kind(&relative) {
                Some(RouteFileKind::Page) => Some(app_route_path(&relative)),
                _ => None,
            };
            let ctx = VisitorContext::new(&parsed);
            let mut visitor = UiActionVisitor {
                file_path: &relative,
                route_path,
                nodes: Vec::new(),
            };
            walk_ast(module, &mut visitor, &ctx);
            visitor.nodes
        })
    }
}

struct UiActionVisitor<'a> {
    file_path: &'a str,
    route_path: Option<String>,
    nodes: Vec<Node>,
}

impl AstVisitor for UiActionVisitor<'_> {
    fn visit_jsx_element(&mut self, node: &JSXElement, ctx: &VisitorContext) -> ControlFlow<()> {
        let Some(element) = ctx.get_source_text(node.opening.name.span()) else {
            return ControlFlow::Continue(());
        };

        let mut attrs: Vec<(String, AttrValue)> = Vec::new();
        let mut has_spread = false;
        for attr in &node.opening.attrs {
            match attr {
                JSXAttrOrSpread::JSXAttr(attr) => {
                    let Some(name) = ctx.get_source_text(attr.name.span()) else {
                        continue;
                    };
                    let value = match &attr.value {
                        Some(value) => ctx
                            .get_source_text(value.span())
                            .map(parse_attr_value)
                            .unwrap_or(AttrValue::Absent),
                        None => AttrValue::Absent,
                    };
                    attrs.push((name.to_string(), value));
                }
                JSXAttrOrSpread::SpreadElement(_) => has_spread = true,
            }
        }
        let attr = |name: &str| attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v);

        let on_click = attr("onClick");
        if !CONTROL_ELEMENTS.contains(&element) && on_click.is_none() {
            return ControlFlow::Continue(());
        }

        let href = attr("href").and_then(AttrValue::literal).map(str::to_string);
        let handler_name = match on_click {
            Some(AttrValue::Expr(expr)) if HANDLER_REFERENCE.is_match(expr) => Some(expr.clone()),
            _ => None,
        };
        let noop_click = matches!(on_click, Some(AttrValue::Expr(expr)) if NOOP_HANDLER.is_match(expr));

        let unwired = !has_spread
            && on_click.is_none()
            && match element {
                "button" => {
                    attr("type").and_then(AttrValue::literal) != Some("submit")
                        && attr("formAction").is_none()
                }
                "a" => attr("href").is_none(),
                _ => false,
            };

        self.nodes.push(ui_action_node(
            self.file_path,
            ctx.span_line(node.span),
            element,
            UiActionOptions {
                label: label_of(node, ctx),
                href,
                handler_name,
                suspicious: noop_click || unwired,
                route_path: self.route_path.clone(),
            },
        ));

        ControlFlow::Continue(())
    }
}

fn parse_attr_value(text: &str) -> AttrValue {
    let text = text.trim();
    if let Some(literal) = quoted(text) {
        return AttrValue::Literal(literal.to_string());
    }

    let inner = text
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .map(str::trim)
        .unwrap_or(text);

    match quoted(inner) {
        Some(literal) if !(inner.starts_with('`') && literal.contains("${")) => {
            AttrValue::Literal(literal.to_string())
        }
        _ => AttrValue::Expr(inner.to_string()),
    }
}

fn quoted(text: &str) -> Option<&str> {
    ['"', '\'', '`'].into_iter().find_map(|q| {
        text.strip_prefix(q)
            .and_then(|t| t.strip_suffix(q))
            .filter(|inner| !inner.contains(q))
    })
}

fn label_of(node: &JSXElement, ctx: &VisitorContext) -> Option<String> {
    let text = node
        .children
        .iter()
        .filter_map(|child| match child {
            JSXElementChild::JSXText(text) => ctx.get_source_text(text.span),
            _ => None,
        })
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    (!text.is_empty()).then_some(text)
}
