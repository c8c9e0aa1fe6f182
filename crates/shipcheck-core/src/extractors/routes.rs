//! App Router pages (`page.*`) and route handlers (`route.*`).

use crate::extractors::{Extractor, ExtractorInput, collect_nodes};
use crate::graph::{Graph, route_node};
use crate::normalize::app_route_path;
use crate::scan::ScanError;

const PAGE_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js"];
const HANDLER_EXTENSIONS: &[&str] = &["ts", "js"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFileKind {
    Page,
    Api,
}

/// Classifies a project-relative path by its App Router file name.
pub fn route_file_kind(relative: &str) -> Option<RouteFileKind> {
    if has_marker(relative, "/page.", PAGE_EXTENSIONS) {
        Some(RouteFileKind::Page)
    } else if has_marker(relative, "/route.", HANDLER_EXTENSIONS) {
        Some(RouteFileKind::Api)
    } else {
        None
    }
}

fn has_marker(relative: &str, marker: &str, extensions: &[&str]) -> bool {
    let prefixed = format!("/{relative}");
    match prefixed.rfind(marker) {
        Some(index) => extensions.contains(&&prefixed[index + marker.len()..]),
        None => false,
    }
}

pub struct RoutesExtractor;

impl Extractor for RoutesExtractor {
    fn name(&self) -> &'static str {
        "routes"
    }

    fn extract(&self, input: &ExtractorInput) -> Result<Graph, ScanError> {
        collect_nodes(&input.source_files(), input.cancel, |file| {
            let relative = input.relative(&file.path);
            match route_file_kind(&relative) {
                Some(kind) => {
                    let path = app_route_path(&relative);
                    let is_api = kind == RouteFileKind::Api;
                    vec![route_node(&path, &relative, is_api, !is_api)]
                }
                None => Vec::new(),
            }
        })
    }
}
