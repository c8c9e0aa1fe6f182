//! Outgoing HTTP and navigation calls: `fetch`, axios and `router.push`.

use std::ops::ControlFlow;

use swc_common::Spanned;
use swc_ecma_ast::{CallExpr, Callee, Expr, Lit};

use crate::extractors::{Extractor, ExtractorInput, collect_nodes};
use crate::graph::{CallType, CallsiteOptions, Graph, Node, callsite_node};
use crate::scan::ScanError;
use crate::visitor::{AstVisitor, VisitorContext, walk_ast};

const AXIOS_METHODS: &[&str] = &[".get", ".post", ".put", ".patch", ".delete"];

pub struct CallsitesExtractor;

impl Extractor for CallsitesExtractor {
    fn name(&self) -> &'static str {
        "callsites"
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
            let ctx = VisitorContext::new(&parsed);
            let mut visitor = CallsiteVisitor {
                file_path: &relative,
                nodes: Vec::new(),
            };
            walk_ast(module, &mut visitor, &ctx);
            visitor.nodes
        })
    }
}

struct CallsiteVisitor<'a> {
    file_path: &'a str,
    nodes: Vec<Node>,
}

impl AstVisitor for CallsiteVisitor<'_> {
    fn visit_call_expr(&mut self, node: &CallExpr, ctx: &VisitorContext) -> ControlFlow<()> {
        if let Some((call_type, target, symbol)) = classify_call(node, ctx) {
            self.nodes.push(callsite_node(
                self.file_path,
                ctx.span_line(node.span),
                call_type,
                CallsiteOptions {
                    target_path: target,
                    target_symbol: Some(symbol),
                },
            ));
        }
        ControlFlow::Continue(())
    }
}

fn classify_call(
    call: &CallExpr,
    ctx: &VisitorContext,
) -> Option<(CallType, Option<String>, String)> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let callee_text: String = ctx
        .get_source_text(callee.span())?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let first_arg = call.args.first().filter(|arg| arg.spread.is_none());
    let target = first_arg
        .and_then(|arg| ctx.get_source_text(arg.expr.span()))
        .map(strip_quotes);
    let is_literal = first_arg.is_some_and(|arg| is_string_literal(&arg.expr));

    let call_type = if callee_text == "fetch" {
        let target = target.as_deref()?;
        if !is_literal || !(target.starts_with('/') || target.starts_with("http")) {
            return None;
        }
        CallType::Fetch
    } else if callee_text.contains("axios")
        && AXIOS_METHODS.iter().any(|m| callee_text.ends_with(m))
    {
        CallType::Axios
    } else if is_router_push(&callee_text) {
        if !target.as_deref().is_some_and(|t| t.starts_with('/')) {
            return None;
        }
        CallType::Router
    } else {
        return None;
    };

    Some((call_type, target, callee_text))
}

fn is_router_push(callee: &str) -> bool {
    if callee == "push" || callee == "router.push" {
        return true;
    }
    match callee.strip_suffix(".push") {
        Some(receiver) => receiver.to_ascii_lowercase().contains("router"),
        None => false,
    }
}

fn is_string_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Lit(Lit::Str(_)) | Expr::Tpl(_))
}

fn strip_quotes(text: &str) -> String {
    text.trim().trim_matches(['"', '\'', '`']).to_string()
}
