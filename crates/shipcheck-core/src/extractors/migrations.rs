//! SQL migrations: row level security, policies, indexes, destructive DDL.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::extractors::{Extractor, ExtractorInput, collect_nodes};
use crate::graph::{Graph, MigrationOptions, Node, migration_node};
use crate::scan::ScanError;

static ENABLE_RLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)ALTER\s+TABLE\s+[^;]*?ENABLE\s+ROW\s+LEVEL\s+SECURITY")
        .expect("Invalid regex pattern")
});

static ALTER_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?([\w."]+)"#)
        .expect("Invalid regex pattern")
});

static CREATE_POLICY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)CREATE\s+POLICY\s+(?:"[^"]*"|\S+)\s+ON\s+(?:TABLE\s+)?([\w."]+)"#)
        .expect("Invalid regex pattern")
});

static CREATE_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)CREATE\s+(?:UNIQUE\s+)?INDEX\s+(?:CONCURRENTLY\s+)?(?:IF\s+NOT\s+EXISTS\s+)?(?:[\w."]+\s+)?ON\s+(?:ONLY\s+)?([\w."]+)"#,
    )
    .expect("Invalid regex pattern")
});

static DESTRUCTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)\bDROP\s+TABLE\b|\bDROP\s+COLUMN\b|\bTRUNCATE\b|\bALTER\s+COLUMN\s+[\w\x22]+\s+(?:SET\s+DATA\s+)?TYPE\b",
    )
    .expect("Invalid regex pattern")
});

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFacts {
    pub rls_enabled: bool,
    pub policy_count: u32,
    pub has_index: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Tables touched by RLS or policy statements.
    pub tables: BTreeMap<String, TableFacts>,
    pub has_destructive_ddl: bool,
}

pub struct MigrationsExtractor;

impl Extractor for MigrationsExtractor {
    fn name(&self) -> &'static str {
        "migrations"
    }

    fn extract(&self, input: &ExtractorInput) -> Result<Graph, ScanError> {
        collect_nodes(&input.migration_files(), input.cancel, |file| {
            let sql = match std::fs::read_to_string(&file.path) {
                Ok(sql) => sql,
                Err(err) => {
                    debug!(path = %file.path.display(), error = %err, "failed to read migration");
                    return Vec::new();
                }
            };
            migration_nodes(&input.relative(&file.path), &summarize_sql(&sql))
        })
    }
}

/// Lowercased, unquoted, without the default `public.` schema.
pub fn canonical_table(raw: &str) -> String {
    let unquoted = raw.replace('"', "").to_lowercase();
    match unquoted.strip_prefix("public.") {
        Some(rest) => rest.to_string(),
        None => unquoted,
    }
}

pub fn summarize_sql(sql: &str) -> MigrationSummary {
    let mut rls = BTreeSet::new();
    let mut policies: BTreeMap<String, u32> = BTreeMap::new();
    let mut indexed = BTreeSet::new();

    for found in ENABLE_RLS.find_iter(sql) {
        if let Some(caps) = ALTER_TABLE.captures(&sql[found.start()..]) {
            if let Some(table) = caps.get(1) {
                rls.insert(canonical_table(table.as_str()));
            }
        }
    }

    for caps in CREATE_POLICY.captures_iter(sql) {
        if let Some(table) = caps.get(1) {
            *policies.entry(canonical_table(table.as_str())).or_insert(0) += 1;
        }
    }

    for caps in CREATE_INDEX.captures_iter(sql) {
        if let Some(table) = caps.get(1) {
            indexed.insert(canonical_table(table.as_str()));
        }
    }

    let tables = rls
        .iter()
        .chain(policies.keys())
        .map(|table| {
            let facts = TableFacts {
                rls_enabled: rls.contains(table),
                policy_count: policies.get(table).copied().unwrap_or(0),
                has_index: indexed.contains(table),
            };
            (table.clone(), facts)
        })
        .collect();

    MigrationSummary {
        tables,
        has_destructive_ddl: DESTRUCTIVE.is_match(sql),
    }
}

fn migration_nodes(file_path: &str, summary: &MigrationSummary) -> Vec<Node> {
    if summary.tables.is_empty() {
        return vec![migration_node(
            file_path,
            MigrationOptions {
                has_destructive_ddl: summary.has_destructive_ddl,
                ..Default::default()
            },
        )];
    }

    summary
        .tables
        .iter()
        .map(|(table, facts)| {
            migration_node(
                file_path,
                MigrationOptions {
                    table: Some(table.clone()),
                    rls_enabled: Some(facts.rls_enabled),
                    policy_count: (facts.policy_count > 0).then_some(facts.policy_count),
                    has_destructive_ddl: summary.has_destructive_ddl,
                    has_index: Some(facts.has_index),
                },
            )
        })
        .collect()
}
