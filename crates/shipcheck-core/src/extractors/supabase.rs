//! Supabase query-builder chains: `.from("table")...`.

use std::sync::LazyLock;

use regex::Regex;

use crate::extractors::{Extractor, ExtractorInput, collect_nodes, line_at};
use crate::graph::{Graph, Node, QueryOperation, SupabaseQueryOptions, supabase_query_node};
use crate::scan::ScanError;

static FROM_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\.from\(\s*['"`]([^'"`]+)['"`]\s*\)"#).expect("Invalid regex pattern")
});

static HEAD_TRUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"head\s*:\s*true").expect("Invalid regex pattern"));

const MAX_CHAIN_LEN: usize = 2000;

const WRITE_OPERATIONS: &[(&str, QueryOperation)] = &[
    (".insert(", QueryOperation::Insert),
    (".upsert(", QueryOperation::Upsert),
    (".update(", QueryOperation::Update),
    (".delete(", QueryOperation::Delete),
    (".rpc(", QueryOperation::Rpc),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryShape {
    pub operation: QueryOperation,
    pub has_pagination: bool,
    pub is_single_row: bool,
    pub is_count_only: bool,
    pub select_all: bool,
}

pub struct SupabaseExtractor;

impl Extractor for SupabaseExtractor {
    fn name(&self) -> &'static str {
        "supabase"
    }

    fn extract(&self, input: &ExtractorInput) -> Result<Graph, ScanError> {
        collect_nodes(&input.source_files(), input.cancel, |file| {
            let Some(parsed) = input.sources.get(&file.path) else {
                return Vec::new();
            };
            let source = parsed.source();
            if !source.contains(".from(") {
                return Vec::new();
            }

            let relative = input.relative(&file.path);
            let is_client = input.boundary(&file.path).is_client;

            FROM_CALL
                .captures_iter(source)
                .filter_map(|caps| {
                    let whole = caps.get(0)?;
                    let table = caps.get(1)?.as_str();
                    let chain = call_chain(&source[whole.end()..]);
                    let shape = classify_chain(chain);
                    Some(query_node(&relative, table, line_at(source, whole.start()), is_client, &shape))
                })
                .collect()
        })
    }
}

fn query_node(file_path: &str, table: &str, line: usize, is_client: bool, shape: &QueryShape) -> Node {
    let opts = if shape.operation == QueryOperation::Select {
        SupabaseQueryOptions {
            is_client,
            has_pagination: Some(shape.has_pagination),
            select_all: Some(shape.select_all),
            is_single_row: Some(shape.is_single_row),
            is_count_only: Some(shape.is_count_only),
        }
    } else {
        SupabaseQueryOptions {
            is_client,
            ..Default::default()
        }
    };
    supabase_query_node(file_path, table, shape.operation, line, opts)
}

/// The method chain following a `.from(...)` call: everything up to the end
/// of the statement, an unmatched closing bracket, or a line break that is
/// not followed by another `.method` continuation.
pub fn call_chain(rest: &str) -> &str {
    let mut depth: i32 = 0;
    let bytes = rest.as_bytes();
    let mut index = 0;

    while index < bytes.len() && index < MAX_CHAIN_LEN {
        match bytes[index] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth -= 1;
                if depth < 0 {
                    break;
                }
            }
            b';' if depth == 0 => break,
            b'\n' if depth == 0 => {
                let next = rest[index + 1..].trim_start();
                if !next.starts_with('.') {
                    break;
                }
            }
            _ => {}
        }
        index += 1;
    }

    let mut end = index.min(rest.len());
    while !rest.is_char_boundary(end) {
        end -= 1;
    }
    &rest[..end]
}

pub fn classify_chain(chain: &str) -> QueryShape {
    let operation = WRITE_OPERATIONS
        .iter()
        .filter_map(|(marker, op)| chain.find(marker).map(|pos| (pos, *op)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, op)| op)
        .unwrap_or(QueryOperation::Select);

    let select_args = select_arguments(chain);

    QueryShape {
        operation,
        has_pagination: chain.contains(".range(") || chain.contains(".limit("),
        is_single_row: chain.contains(".single(") || chain.contains(".maybeSingle("),
        is_count_only: select_args.is_some_and(|args| HEAD_TRUE.is_match(args)),
        select_all: select_args.is_some_and(|args| {
            let first = first_argument(args).trim();
            first.is_empty() || matches!(first, "*" | "'*'" | "\"*\"" | "`*`")
        }),
    }
}

/// Text between the parentheses of the first `.select(` call.
fn select_arguments(chain: &str) -> Option<&str> {
    let start = chain.find(".select(")? + ".select(".len();
    let mut depth = 0;
    for (offset, c) in chain[start..].char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' if depth == 0 => return Some(&chain[start..start + offset]),
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }
    Some(&chain[start..])
}

fn first_argument(args: &str) -> &str {
    let mut depth = 0;
    let mut quote: Option<char> = None;
    for (offset, c) in args.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth -= 1,
            (None, ',') if depth == 0 => return &args[..offset],
            _ => {}
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::testing::Fixture;
    use crate::graph::SupabaseQueryNode;

    fn run_supabase(path: &str, code: &str) -> Vec<SupabaseQueryNode> {
        let fixture = Fixture::new().file(path, code);
        let graph = fixture.run(&SupabaseExtractor);
        let mut queries: Vec<_> = graph.supabase_queries().cloned().collect();
        queries.sort_by_key(|q| q.line);
        queries
    }

    #[test]
    fn chain_stops_at_statement_end() {
        let rest = ".select('*')\n    .eq('id', 1);\nconst other = 2;";
        assert_eq!(call_chain(rest), ".select('*')\n    .eq('id', 1)");
    }

    #[test]
    fn chain_stops_at_unmatched_closer() {
        assert_eq!(call_chain(".select('id'))\n.then(x)"), ".select('id')");
    }

    #[test]
    fn chain_stops_at_line_without_continuation() {
        assert_eq!(call_chain(".select()\nawait other()"), ".select()");
    }

    #[test]
    fn classifies_write_operations() {
        assert_eq!(classify_chain(".insert({ a: 1 }).select()").operation, QueryOperation::Insert);
        assert_eq!(classify_chain(".upsert(rows)").operation, QueryOperation::Upsert);
        assert_eq!(classify_chain(".update({ a: 1 }).eq('id', 1)").operation, QueryOperation::Update);
        assert_eq!(classify_chain(".delete().eq('id', 1)").operation, QueryOperation::Delete);
        assert_eq!(classify_chain(".select('id')").operation, QueryOperation::Select);
    }

    #[test]
    fn classifies_select_shape() {
        let all = classify_chain(".select('*')");
        assert!(all.select_all && !all.has_pagination && !all.is_single_row);

        let empty = classify_chain(".select()");
        assert!(empty.select_all);

        let columns = classify_chain(".select('id, total').range(0, 9)");
        assert!(!columns.select_all && columns.has_pagination);

        let single = classify_chain(".select(\"id\").eq('id', 1).maybeSingle()");
        assert!(single.is_single_row);

        let count = classify_chain(".select('*', { count: 'exact', head: true })");
        assert!(count.is_count_only && count.select_all);

        let no_select = classify_chain(".eq('id', 1)");
        assert!(!no_select.select_all && !no_select.is_count_only);
    }

    #[test]
    fn extracts_queries_with_lines_and_boundary() {
        let code = r#"'use client';

export async function load(supabase) {
    const { data } = await supabase
        .from('orders')
        .select('*');
    await supabase.from("audit_log").insert({ event: "load" });
    return data;
}
"#;

        let queries = run_supabase("components/orders.tsx", code);

        assert_eq!(queries.len(), 2);
        let select = &queries[0];
        assert_eq!(select.table, "orders");
        assert_eq!(select.operation, QueryOperation::Select);
        assert_eq!(select.line, 5);
        assert!(select.is_client);
        assert_eq!(select.select_all, Some(true));
        assert_eq!(select.has_pagination, Some(false));

        let insert = &queries[1];
        assert_eq!(insert.operation, QueryOperation::Insert);
        assert_eq!(insert.line, 7);
        assert!(insert.select_all.is_none());
        assert!(insert.has_pagination.is_none());
    }

    #[test]
    fn files_without_from_calls_are_skipped() {
        assert!(run_supabase("lib/a.ts", "export const from = (x) => x;").is_empty());
    }
}
