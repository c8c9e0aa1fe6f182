//! Migration safety: RLS coverage (DB-1, DB-2) and destructive DDL (DB-4).

use crate::declare_rule;
use crate::finding::{EvidenceRef, Finding};
use crate::graph::Graph;
use crate::rules::catalog::{DB_1, DB_2, DB_4};
use crate::rules::{Rule, RuleContext, RuleMetadata};

declare_rule!(
    DatabaseRules,
    id = "database",
    name = "database-safety",
    description = "Tables need row level security with policies, and migrations should not destroy data",
    category = Database,
    codes = ["DB-1", "DB-2", "DB-4"]
);

impl Rule for DatabaseRules {
    fn metadata(&self) -> &RuleMetadata {
        &self.metadata
    }

    fn check(&self, graph: &Graph, _ctx: &RuleContext) -> Vec<Finding> {
        let mut findings = Vec::new();

        for migration in graph.migrations() {
            if let Some(table) = migration.table.as_deref() {
                match migration.rls_enabled {
                    Some(false) => findings.push(DB_1.finding(
                        &migration.id,
                        format!("Table {table} is used without row level security enabled"),
                        EvidenceRef::new(&migration.file_path, None)
                            .with_reason("no ENABLE ROW LEVEL SECURITY statement"),
                    )),
                    Some(true) if migration.policy_count.unwrap_or(0) == 0 => {
                        findings.push(DB_2.finding(
                            &migration.id,
                            format!("Table {table} has row level security enabled but no policies"),
                            EvidenceRef::new(&migration.file_path, None)
                                .with_reason("no CREATE POLICY statement"),
                        ))
                    }
                    _ => {}
                }
            }

            if migration.has_destructive_ddl {
                let description = match migration.table.as_deref() {
                    Some(table) => format!(
                        "{} contains destructive DDL alongside changes to {table}",
                        migration.file_path
                    ),
                    None => format!("{} contains destructive DDL", migration.file_path),
                };
                findings.push(DB_4.finding(
                    &migration.id,
                    description,
                    EvidenceRef::new(&migration.file_path, None)
                        .with_reason("DROP, TRUNCATE or column type change"),
                ));
            }
        }

        findings
    }
}
