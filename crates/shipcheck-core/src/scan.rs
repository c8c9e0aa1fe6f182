//! Scan pipeline: extract, merge, link, evaluate rules.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::Config;
use crate::extractors::{
    ExtractSettings, Extractor, ExtractorInput, FileInfo, default_extractors,
};
use crate::finding::Finding;
use crate::graph::{EdgeType, Graph};
use crate::normalize::{route_path_to_url_form, strip_query};
use crate::report::{BuildOptions, ValidationContext, build_validation_context};
use crate::rules::{RuleContext, RuleRegistry};
use crate::source::SourceCache;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan cancelled")]
    Cancelled,
    #[error("scan deadline exceeded")]
    DeadlineExceeded,
    #[error("project root '{0}' is not a directory")]
    InvalidRoot(PathBuf),
}

/// Cooperative cancellation checked between files. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.check().is_err()
    }

    pub fn check(&self) -> Result<(), ScanError> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(ScanError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ScanError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub graph: Graph,
    pub findings: Vec<Finding>,
}

impl ScanOutcome {
    pub fn report(&self, options: &BuildOptions) -> ValidationContext {
        build_validation_context(&self.graph, &self.findings, options)
    }
}

pub struct ScanEngine {
    registry: RuleRegistry,
    extractors: Vec<Box<dyn Extractor>>,
    settings: ExtractSettings,
    rule_context: RuleContext,
}

impl ScanEngine {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let mut registry = RuleRegistry::with_defaults();
        registry.configure(&config.rules);
        Self {
            registry,
            extractors: default_extractors(),
            settings: ExtractSettings::from_config(config),
            rule_context: RuleContext::from_env_config(&config.env),
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Runs every extractor concurrently and merges their graphs in
    /// extractor order, then derives edges.
    pub fn build_graph(
        &self,
        project_root: &Path,
        files: &[FileInfo],
        cancel: &CancellationToken,
    ) -> Result<Graph, ScanError> {
        if !project_root.is_dir() {
            return Err(ScanError::InvalidRoot(project_root.to_path_buf()));
        }

        let sources = SourceCache::new();
        let input = ExtractorInput {
            files,
            project_root,
            sources: &sources,
            settings: &self.settings,
            cancel,
        };

        let partials: Vec<Result<Graph, ScanError>> = self
            .extractors
            .par_iter()
            .map(|extractor| {
                let started = Instant::now();
                let result = extractor.extract(&input);
                if let Ok(graph) = &result {
                    debug!(
                        extractor = extractor.name(),
                        nodes = graph.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "extractor finished"
                    );
                }
                result
            })
            .collect();

        let mut graph = Graph::new();
        for partial in partials {
            graph.merge(partial?);
        }
        cancel.check()?;

        link(&mut graph);
        debug!(sources = sources.len(), "source cache released");
        Ok(graph)
    }

    pub fn scan(
        &self,
        project_root: &Path,
        files: &[FileInfo],
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome, ScanError> {
        let started = Instant::now();
        let graph = self.build_graph(project_root, files, cancel)?;
        let findings = self.registry.run_all(&graph, &self.rule_context);
        cancel.check()?;

        info!(
            files = files.len(),
            nodes = graph.len(),
            edges = graph.edge_count(),
            findings = findings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan complete"
        );

        Ok(ScanOutcome { graph, findings })
    }
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Adds `route -exposes-> endpoint` for handlers defined in the route file
/// and `callsite -calls-> route` for literal targets matching a route path.
pub fn link(graph: &mut Graph) {
    let mut edges: Vec<(String, String, EdgeType)> = Vec::new();

    for route in graph.routes() {
        for endpoint in graph
            .endpoints()
            .filter(|e| e.is_api_route && e.file_path == route.file_path)
        {
            edges.push((route.id.clone(), endpoint.id.clone(), EdgeType::Exposes));
        }
    }

    for callsite in graph.callsites() {
        let Some(target) = callsite.target_path.as_deref().map(strip_query) else {
            continue;
        };
        for route in graph
            .routes()
            .filter(|r| r.path == target || route_path_to_url_form(&r.path) == target)
        {
            edges.push((callsite.id.clone(), route.id.clone(), EdgeType::Calls));
        }
    }

    for (from, to, edge_type) in edges {
        graph.add_edge(&from, &to, edge_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        CallType, CallsiteOptions, EndpointOptions, callsite_node, endpoint_node, route_node,
    };

    #[test]
    fn cancelled_token_reports_cancelled() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());

        clone.cancel();

        assert!(matches!(token.check(), Err(ScanError::Cancelled)));
        assert!(token.is_cancelled());
    }

    #[test]
    fn past_deadline_reports_exceeded() {
        let token = CancellationToken::with_deadline(Instant::now());

        assert!(matches!(token.check(), Err(ScanError::DeadlineExceeded)));
    }

    #[test]
    fn generous_timeout_is_ok() {
        let token = CancellationToken::with_timeout(Duration::from_secs(3600));

        assert!(token.check().is_ok());
    }

    #[test]
    fn invalid_root_is_rejected() {
        let engine = ScanEngine::new();
        let result = engine.scan(
            Path::new("/definitely/not/a/dir"),
            &[],
            &CancellationToken::new(),
        );

        assert!(matches!(result, Err(ScanError::InvalidRoot(_))));
    }

    #[test]
    fn cancelled_scan_returns_no_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app/page.tsx");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "export default function P() { return null; }").unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let result = ScanEngine::new().scan(dir.path(), &[FileInfo::source(path)], &token);

        assert!(matches!(result, Err(ScanError::Cancelled)));
    }

    #[test]
    fn link_adds_exposes_and_calls_edges() {
        let mut graph = Graph::new();
        graph.add_node(route_node("/api/widgets", "app/api/widgets/route.ts", true, false));
        graph.add_node(endpoint_node(
            "/api/widgets",
            "app/api/widgets/route.ts",
            "GET",
            EndpointOptions {
                is_api_route: true,
                ..Default::default()
            },
        ));
        graph.add_node(callsite_node(
            "app/page.tsx",
            5,
            CallType::Fetch,
            CallsiteOptions {
                target_path: Some("/api/widgets?limit=5".to_string()),
                target_symbol: Some("fetch".to_string()),
            },
        ));

        link(&mut graph);

        let route_id = graph.routes().next().unwrap().id.clone();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.out_edges(&route_id).count(), 1);
        assert_eq!(graph.in_edges(&route_id).count(), 1);
        assert_eq!(
            graph.in_edges(&route_id).next().unwrap().edge_type,
            EdgeType::Calls
        );
    }
}
