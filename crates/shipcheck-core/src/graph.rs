//! Typed in-memory graph of the scanned project.
//!
//! Nodes are keyed by deterministic ids derived from their identity parts,
//! so re-running extraction over unchanged files yields the same graph.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Route,
    UiAction,
    Endpoint,
    Callsite,
    SupabaseQuery,
    Migration,
    EnvVar,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Route => "route",
            NodeKind::UiAction => "uiAction",
            NodeKind::Endpoint => "endpoint",
            NodeKind::Callsite => "callsite",
            NodeKind::SupabaseQuery => "supabaseQuery",
            NodeKind::Migration => "migration",
            NodeKind::EnvVar => "envVar",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds `kind:part1:part2...`, skipping empty parts and collapsing runs of
/// whitespace to `_`.
pub fn node_id(kind: NodeKind, parts: &[&str]) -> String {
    let joined = parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(":");
    let body = if joined.is_empty() { "default" } else { joined.as_str() };

    let raw = format!("{}:{}", kind.as_str(), body);
    let mut id = String::with_capacity(raw.len());
    let mut in_whitespace = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                id.push('_');
            }
            in_whitespace = true;
        } else {
            id.push(c);
            in_whitespace = false;
        }
    }
    id
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteNode {
    pub id: String,
    pub path: String,
    pub file_path: String,
    pub is_api: bool,
    pub is_page: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiActionNode {
    pub id: String,
    pub file_path: String,
    pub line: usize,
    pub element: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_name: Option<String>,
    pub suspicious: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointNode {
    pub id: String,
    pub path_or_name: String,
    pub file_path: String,
    pub method: String,
    pub mutates_data: bool,
    pub is_server_action: bool,
    pub is_api_route: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Fetch,
    Axios,
    Router,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Fetch => "fetch",
            CallType::Axios => "axios",
            CallType::Router => "router",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallsiteNode {
    pub id: String,
    pub file_path: String,
    pub line: usize,
    #[serde(rename = "type")]
    pub call_type: CallType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_symbol: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOperation {
    Select,
    Insert,
    Upsert,
    Update,
    Delete,
    Rpc,
}

impl QueryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOperation::Select => "select",
            QueryOperation::Insert => "insert",
            QueryOperation::Upsert => "upsert",
            QueryOperation::Update => "update",
            QueryOperation::Delete => "delete",
            QueryOperation::Rpc => "rpc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupabaseQueryNode {
    pub id: String,
    pub file_path: String,
    pub table: String,
    pub operation: QueryOperation,
    pub line: usize,
    pub is_client: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_pagination: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_single_row: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_count_only: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationNode {
    pub id: String,
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rls_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_count: Option<u32>,
    pub has_destructive_ddl: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_index: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarNode {
    pub id: String,
    pub name: String,
    pub file_path: String,
    pub is_public: bool,
    pub in_example: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    Route(RouteNode),
    UiAction(UiActionNode),
    Endpoint(EndpointNode),
    Callsite(CallsiteNode),
    SupabaseQuery(SupabaseQueryNode),
    Migration(MigrationNode),
    EnvVar(EnvVarNode),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Route(n) => &n.id,
            Node::UiAction(n) => &n.id,
            Node::Endpoint(n) => &n.id,
            Node::Callsite(n) => &n.id,
            Node::SupabaseQuery(n) => &n.id,
            Node::Migration(n) => &n.id,
            Node::EnvVar(n) => &n.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Route(_) => NodeKind::Route,
            Node::UiAction(_) => NodeKind::UiAction,
            Node::Endpoint(_) => NodeKind::Endpoint,
            Node::Callsite(_) => NodeKind::Callsite,
            Node::SupabaseQuery(_) => NodeKind::SupabaseQuery,
            Node::Migration(_) => NodeKind::Migration,
            Node::EnvVar(_) => NodeKind::EnvVar,
        }
    }
}

pub fn route_node(path: &str, file_path: &str, is_api: bool, is_page: bool) -> Node {
    Node::Route(RouteNode {
        id: node_id(NodeKind::Route, &[path, file_path]),
        path: path.to_string(),
        file_path: file_path.to_string(),
        is_api,
        is_page,
    })
}

#[derive(Debug, Clone, Default)]
pub struct UiActionOptions {
    pub label: Option<String>,
    pub href: Option<String>,
    pub handler_name: Option<String>,
    pub suspicious: bool,
    pub route_path: Option<String>,
}

pub fn ui_action_node(file_path: &str, line: usize, element: &str, opts: UiActionOptions) -> Node {
    let line_str = line.to_string();
    let href = opts.href.as_deref().unwrap_or("");
    Node::UiAction(UiActionNode {
        id: node_id(NodeKind::UiAction, &[file_path, &line_str, element, href]),
        file_path: file_path.to_string(),
        line,
        element: element.to_string(),
        label: opts.label,
        href: opts.href,
        handler_name: opts.handler_name,
        suspicious: opts.suspicious,
        route_path: opts.route_path,
    })
}

#[derive(Debug, Clone, Default)]
pub struct EndpointOptions {
    pub is_server_action: bool,
    pub is_api_route: bool,
    pub line: Option<usize>,
}

/// Mutating unless the method is `GET`.
pub fn endpoint_node(path_or_name: &str, file_path: &str, method: &str, opts: EndpointOptions) -> Node {
    Node::Endpoint(EndpointNode {
        id: node_id(NodeKind::Endpoint, &[method, path_or_name, file_path]),
        path_or_name: path_or_name.to_string(),
        file_path: file_path.to_string(),
        method: method.to_string(),
        mutates_data: method != "GET",
        is_server_action: opts.is_server_action,
        is_api_route: opts.is_api_route,
        line: opts.line,
    })
}

#[derive(Debug, Clone, Default)]
pub struct CallsiteOptions {
    pub target_path: Option<String>,
    pub target_symbol: Option<String>,
}

pub fn callsite_node(file_path: &str, line: usize, call_type: CallType, opts: CallsiteOptions) -> Node {
    let line_str = line.to_string();
    Node::Callsite(CallsiteNode {
        id: node_id(NodeKind::Callsite, &[file_path, &line_str, call_type.as_str()]),
        file_path: file_path.to_string(),
        line,
        call_type,
        target_path: opts.target_path,
        target_symbol: opts.target_symbol,
    })
}

#[derive(Debug, Clone, Default)]
pub struct SupabaseQueryOptions {
    pub is_client: bool,
    pub has_pagination: Option<bool>,
    pub select_all: Option<bool>,
    pub is_single_row: Option<bool>,
    pub is_count_only: Option<bool>,
}

pub fn supabase_query_node(
    file_path: &str,
    table: &str,
    operation: QueryOperation,
    line: usize,
    opts: SupabaseQueryOptions,
) -> Node {
    Node::SupabaseQuery(SupabaseQueryNode {
        id: node_id(NodeKind::SupabaseQuery, &[file_path, table, operation.as_str()]),
        file_path: file_path.to_string(),
        table: table.to_string(),
        operation,
        line,
        is_client: opts.is_client,
        has_pagination: opts.has_pagination,
        select_all: opts.select_all,
        is_single_row: opts.is_single_row,
        is_count_only: opts.is_count_only,
    })
}

#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    pub table: Option<String>,
    pub rls_enabled: Option<bool>,
    pub policy_count: Option<u32>,
    pub has_destructive_ddl: bool,
    pub has_index: Option<bool>,
}

pub fn migration_node(file_path: &str, opts: MigrationOptions) -> Node {
    let table = opts.table.as_deref().unwrap_or("");
    Node::Migration(MigrationNode {
        id: node_id(NodeKind::Migration, &[file_path, table]),
        file_path: file_path.to_string(),
        table: opts.table,
        rls_enabled: opts.rls_enabled,
        policy_count: opts.policy_count,
        has_destructive_ddl: opts.has_destructive_ddl,
        has_index: opts.has_index,
    })
}

#[derive(Debug, Clone, Default)]
pub struct EnvVarOptions {
    pub is_public: bool,
    pub in_example: bool,
}

pub fn env_var_node(name: &str, file_path: &str, line: usize, opts: EnvVarOptions) -> Node {
    Node::EnvVar(EnvVarNode {
        id: node_id(NodeKind::EnvVar, &[name, file_path]),
        name: name.to_string(),
        file_path: file_path.to_string(),
        is_public: opts.is_public,
        in_example: opts.in_example,
        line,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    /// Route exposes an endpoint defined in the same handler file.
    Exposes,
    /// Callsite targets a route path.
    Calls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    nodes: BTreeMap<String, Node>,
    edges: Vec<Edge>,
}

macro_rules! typed_nodes {
    ($($name:ident => $variant:ident($payload:ty)),* $(,)?) => {
        $(
            pub fn $name(&self) -> impl Iterator<Item = &$payload> {
                self.nodes.values().filter_map(|node| match node {
                    Node::$variant(payload) => Some(payload),
                    _ => None,
                })
            }
        )*
    };
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the node with the same id.
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id().to_string(), node);
    }

    pub fn add_edge(&mut self, from: &str, to: &str, edge_type: EdgeType) {
        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
            edge_type,
        });
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes_by_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |node| node.kind() == kind)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn out_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |edge| edge.from == id)
    }

    pub fn in_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |edge| edge.to == id)
    }

    /// Upserts `other`'s nodes into `self` and appends its edges.
    pub fn merge(&mut self, other: Graph) {
        self.nodes.extend(other.nodes);
        self.edges.extend(other.edges);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    typed_nodes! {
        routes => Route(RouteNode),
        ui_actions => UiAction(UiActionNode),
        endpoints => Endpoint(EndpointNode),
        callsites => Callsite(CallsiteNode),
        supabase_queries => SupabaseQuery(SupabaseQueryNode),
        migrations => Migration(MigrationNode),
        env_vars => EnvVar(EnvVarNode),
    }
}
