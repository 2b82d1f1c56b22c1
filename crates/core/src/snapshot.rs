//! Per-table content statistics handed to the plan proposer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CoreError;
use crate::store::ContentStore;
use crate::tables::ContentTable;
use crate::types::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub table: ContentTable,
    pub total: i64,
    /// Row counts keyed by the rendered status value. Empty for tables
    /// without a status field.
    pub by_status: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteSnapshot {
    pub tables: Vec<TableStats>,
    pub taken_at: Timestamp,
}

impl SiteSnapshot {
    /// Compact text rendering, one line per table, for prompt context.
    pub fn to_prompt_text(&self) -> String {
        self.tables
            .iter()
            .map(|stats| {
                if stats.by_status.is_empty() {
                    format!("- {}: {} records", stats.table, stats.total)
                } else {
                    let breakdown: Vec<String> = stats
                        .by_status
                        .iter()
                        .map(|(status, count)| format!("{status}={count}"))
                        .collect();
                    format!(
                        "- {}: {} records ({})",
                        stats.table,
                        stats.total,
                        breakdown.join(", ")
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Gather statistics for every allow-listed table.
pub async fn collect_snapshot(store: &dyn ContentStore) -> Result<SiteSnapshot, CoreError> {
    let mut tables = Vec::with_capacity(ContentTable::ALL.len());
    for table in ContentTable::ALL {
        tables.push(store.stats(*table).await?);
    }
    Ok(SiteSnapshot {
        tables,
        taken_at: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryContentStore;

    #[tokio::test]
    async fn snapshot_counts_rows_and_statuses() {
        let store = MemoryContentStore::new();
        store.seed(
            ContentTable::Articles,
            json!({"title": "a", "slug": "a", "category": "c", "published": true}),
        );
        store.seed(
            ContentTable::Articles,
            json!({"title": "b", "slug": "b", "category": "c", "published": false}),
        );
        store.seed(ContentTable::Skills, json!({"name": "Rust", "category": "lang"}));

        let snapshot = collect_snapshot(&store).await.unwrap();
        assert_eq!(snapshot.tables.len(), ContentTable::ALL.len());

        let articles = &snapshot.tables[0];
        assert_eq!(articles.table, ContentTable::Articles);
        assert_eq!(articles.total, 2);
        assert_eq!(articles.by_status.get("true"), Some(&1));
        assert_eq!(articles.by_status.get("false"), Some(&1));

        let text = snapshot.to_prompt_text();
        assert!(text.contains("- articles: 2 records (false=1, true=1)"));
        assert!(text.contains("- skills: 1 records"));
    }
}
