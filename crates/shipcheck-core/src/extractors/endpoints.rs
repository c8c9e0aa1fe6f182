//! Route handler verbs and server actions.

use std::collections::HashSet;

use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    Decl, DefaultDecl, ExportSpecifier, Expr, Module, ModuleDecl, ModuleExportName, ModuleItem,
    Pat, Stmt, VarDecl,
};

use crate::extractors::routes::{RouteFileKind, route_file_kind};
use crate::extractors::{Extractor, ExtractorInput, collect_nodes};
use crate::graph::{EndpointOptions, Graph, Node, endpoint_node};
use crate::normalize::app_route_path;
use crate::scan::ScanError;
use crate::visitor::VisitorContext;

pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedBinding {
    pub name: String,
    pub span: Span,
    /// Declared as a function, or bound to an arrow / function expression.
    pub function_shaped: bool,
}

pub struct EndpointsExtractor;

impl Extractor for EndpointsExtractor {
    fn name(&self) -> &'static str {
        "endpoints"
    }

    fn extract(&self, input: &ExtractorInput) -> Result<Graph, ScanError> {
        collect_nodes(&input.source_files(), input.cancel, |file| {
            let relative = input.relative(&file.path);
            let api_path = match route_file_kind(&relative) {
                Some(RouteFileKind::Api) => {
                    Some(app_route_path(&relative)).filter(|path| path.starts_with("/api"))
                }
                _ => None,
            };
            let boundary = input.boundary(&file.path);

            if api_path.is_none() && !boundary.is_server_action {
                return Vec::new();
            }

            let Some(parsed) = input.sources.get(&file.path) else {
                return Vec::new();
            };
            let Some(module) = parsed.module() else {
                return Vec::new();
            };
            let ctx = VisitorContext::new(&parsed);
            let exports = exported_bindings(module, &ctx);

            let mut nodes: Vec<Node> = Vec::new();
            if let Some(path) = api_path.as_deref() {
                for export in exports.iter().filter(|e| HTTP_METHODS.contains(&e.name.as_str())) {
                    nodes.push(endpoint_node(
                        path,
                        &relative,
                        &export.name,
                        EndpointOptions {
                            is_api_route: true,
                            line: Some(ctx.span_line(export.span)),
                            ..Default::default()
                        },
                    ));
                }
            }

            if boundary.is_server_action {
                for export in exports.iter().filter(|e| e.function_shaped) {
                    nodes.push(endpoint_node(
                        &export.name,
                        &relative,
                        "POST",
                        EndpointOptions {
                            is_server_action: true,
                            line: Some(ctx.span_line(export.span)),
                            ..Default::default()
                        },
                    ));
                }
            }

            nodes
        })
    }
}

/// Top-level exports of a module in source order.
pub fn exported_bindings(module: &Module, ctx: &VisitorContext) -> Vec<ExportedBinding> {
    let local_functions = local_function_names(module);
    let mut exports = Vec::new();

    for item in &module.body {
        let ModuleItem::ModuleDecl(decl) = item else {
            continue;
        };

        match decl {
            ModuleDecl::ExportDecl(export) => match &export.decl {
                Decl::Fn(f) => exports.push(ExportedBinding {
                    name: f.ident.sym.to_string(),
                    span: f.ident.span,
                    function_shaped: true,
                }),
                Decl::Var(var) => exports.extend(var_bindings(var)),
                _ => {}
            },
            ModuleDecl::ExportNamed(named) => {
                for specifier in &named.specifiers {
                    let ExportSpecifier::Named(spec) = specifier else {
                        continue;
                    };
                    if spec.is_type_only {
                        continue;
                    }
                    let orig = export_name(&spec.orig, ctx);
                    let name = spec
                        .exported
                        .as_ref()
                        .map(|exported| export_name(exported, ctx))
                        .unwrap_or_else(|| orig.clone());
                    exports.push(ExportedBinding {
                        name,
                        span: spec.span,
                        function_shaped: named.src.is_none() && local_functions.contains(&orig),
                    });
                }
            }
            ModuleDecl::ExportDefaultDecl(default) => {
                if let DefaultDecl::Fn(f) = &default.decl {
                    let name = f
                        .ident
                        .as_ref()
                        .map(|ident| ident.sym.to_string())
                        .unwrap_or_else(|| "default".to_string());
                    exports.push(ExportedBinding {
                        name,
                        span: default.span,
                        function_shaped: true,
                    });
                }
            }
            ModuleDecl::ExportDefaultExpr(default) => {
                if is_function_expr(&default.expr) {
                    exports.push(ExportedBinding {
                        name: "default".to_string(),
                        span: default.span,
                        function_shaped: true,
                    });
                }
            }
            _ => {}
        }
    }

    exports
}

fn var_bindings(var: &VarDecl) -> Vec<ExportedBinding> {
    var.decls
        .iter()
        .filter_map(|declarator| match &declarator.name {
            Pat::Ident(binding) => Some(ExportedBinding {
                name: binding.id.sym.to_string(),
                span: binding.id.span,
                function_shaped: declarator
                    .init
                    .as_deref()
                    .is_some_and(is_function_expr),
            }),
            _ => None,
        })
        .collect()
}

fn local_function_names(module: &Module) -> HashSet<String> {
    let mut names = HashSet::new();
    for item in &module.body {
        let decl = match item {
            ModuleItem::Stmt(Stmt::Decl(decl)) => decl,
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => &export.decl,
            _ => continue,
        };
        match decl {
            Decl::Fn(f) => {
                names.insert(f.ident.sym.to_string());
            }
            Decl::Var(var) => {
                for binding in var_bindings(var).into_iter().filter(|b| b.function_shaped) {
                    names.insert(binding.name);
                }
            }
            _ => {}
        }
    }
    names
}

fn export_name(name: &ModuleExportName, ctx: &VisitorContext) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        other => ctx
            .get_source_text(other.span())
            .map(|text| text.trim_matches(['"', '\'']).to_string())
            .unwrap_or_default(),
    }
}

fn is_function_expr(expr: &Expr) -> bool {
    match expr {
        Expr::Arrow(_) | Expr::Fn(_) => true,
        Expr::Paren(paren) => is_function_expr(&paren.expr),
        _ => false,
    }
}
