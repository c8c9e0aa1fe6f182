//! Extractors turn project files into graph nodes.
//!
//! Each extractor builds its own local [`Graph`]; the scan pipeline merges
//! them in [`default_extractors`] order.

pub mod callsites;
pub mod endpoints;
pub mod env_vars;
pub mod migrations;
pub mod routes;
pub mod supabase;
pub mod ui_actions;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::boundary::{Boundary, BoundaryDirectives, detect_boundary};
use crate::config::Config;
use crate::graph::{Graph, Node};
use crate::normalize::relative_path;
use crate::scan::{CancellationToken, ScanError};
use crate::source::SourceCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub is_migration: bool,
}

impl FileInfo {
    pub fn source(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_migration: false,
        }
    }

    pub fn migration(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_migration: true,
        }
    }
}

/// Extraction knobs taken from `shipcheck.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSettings {
    pub public_prefix: String,
    pub getter_functions: Vec<String>,
    pub directives: BoundaryDirectives,
}

impl ExtractSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_prefix: config.env.public_prefix.clone(),
            getter_functions: config.env.getter_functions.clone(),
            directives: config.boundary.clone(),
        }
    }
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct ExtractorInput<'a> {
    pub files: &'a [FileInfo],
    pub project_root: &'a Path,
    pub sources: &'a SourceCache,
    pub settings: &'a ExtractSettings,
    pub cancel: &'a CancellationToken,
}

impl ExtractorInput<'_> {
    pub fn source_files(&self) -> Vec<&FileInfo> {
        self.files.iter().filter(|f| !f.is_migration).collect()
    }

    pub fn migration_files(&self) -> Vec<&FileInfo> {
        self.files.iter().filter(|f| f.is_migration).collect()
    }

    pub fn relative(&self, path: &Path) -> String {
        relative_path(self.project_root, path)
    }

    pub fn boundary(&self, path: &Path) -> Boundary {
        detect_boundary(path, &self.settings.directives)
    }
}

pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, input: &ExtractorInput) -> Result<Graph, ScanError>;
}

/// Runs `per_file` over `files` on the rayon pool, checking `cancel`
/// before each file. Nodes are inserted in file order.
pub fn collect_nodes<F>(
    files: &[&FileInfo],
    cancel: &CancellationToken,
    per_file: F,
) -> Result<Graph, ScanError>
where
    F: Fn(&FileInfo) -> Vec<Node> + Sync,
{
    let per_file_nodes = files
        .par_iter()
        .map(|file| {
            cancel.check()?;
            Ok(per_file(file))
        })
        .collect::<Result<Vec<_>, ScanError>>()?;

    let mut graph = Graph::new();
    for node in per_file_nodes.into_iter().flatten() {
        graph.add_node(node);
    }
    Ok(graph)
}

/// 1-based line of a byte offset.
pub fn line_at(source: &str, offset: usize) -> usize {
    let mut end = offset.min(source.len());
    while !source.is_char_boundary(end) {
        end -= 1;
    }
    source[..end].matches('\n').count() + 1
}

pub fn default_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(routes::RoutesExtractor),
        Box::new(ui_actions::UiActionsExtractor),
        Box::new(endpoints::EndpointsExtractor),
        Box::new(callsites::CallsitesExtractor),
        Box::new(supabase::SupabaseExtractor),
        Box::new(env_vars::EnvVarsExtractor),
        Box::new(migrations::MigrationsExtractor),
    ]
}


#[cfg(test)]
mod tests {
    use super::testing::Fixture;
    use super::*;

    #[test]
    fn line_at_counts_newlines() {
        let source = "a\nb\nc";
        assert_eq!(line_at(source, 0), 1);
        assert_eq!(line_at(source, 2), 2);
        assert_eq!(line_at(source, 4), 3);
        assert_eq!(line_at(source, 100), 3);
    }

    #[test]
    fn input_partitions_migration_files() {
        let fixture = Fixture::new()
            .file("app/page.tsx", "export default function P() { return null; }")
            .file("supabase/migrations/0001.sql", "select 1;");
        let input = ExtractorInput {
            files: &fixture.files,
            project_root: fixture.dir.path(),
            sources: &fixture.sources,
            settings: &fixture.settings,
            cancel: &fixture.cancel,
        };

        assert_eq!(input.source_files().len(), 1);
        assert_eq!(input.migration_files().len(), 1);
        assert_eq!(input.relative(&fixture.files[0].path), "app/page.tsx");
    }

    #[test]
    fn collect_nodes_stops_when_cancelled() {
        let fixture = Fixture::new().file("a.ts", "");
        fixture.cancel.cancel();
        let files: Vec<&FileInfo> = fixture.files.iter().collect();

        let result = collect_nodes(&files, &fixture.cancel, |_| Vec::new());

        assert!(matches!(result, Err(ScanError::Cancelled)));
    }

    #[test]
    fn default_extractor_order() {
        let names: Vec<_> = default_extractors().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["routes", "ui-actions", "endpoints", "callsites", "supabase", "env-vars", "migrations"]
        );
    }
}
