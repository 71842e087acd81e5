use crate::SourceFile;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub const INVENTORY_JSON: &str = "inventory.json";
pub const USAGE_GRAPH_JSON: &str = "usage_graph.json";
pub const CLASSIFICATION_JSON: &str = "classification.json";
pub const CLASSIFICATION_MD: &str = "classification.md";
pub const VALIDATION_PRE_JSON: &str = "validation_pre.json";
pub const VALIDATION_POST_JSON: &str = "validation_post.json";
pub const ORCHESTRATOR_REPORT_JSON: &str = "orchestrator-report.json";
pub const SELF_HEAL_LOG_JSON: &str = "self_heal_log.json";
pub const VERIFY_JSON: &str = "verify_unit_to_code.json";
pub const GUARD_METRICS_JSON: &str = "guard_metrics.json";
pub const FINAL_SUMMARY_MD: &str = "FINAL_SUMMARY.md";
pub const PRUNE_SUMMARY_JSON: &str = "prune_summary.json";

pub fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCounts {
    pub api: usize,
    pub ui: usize,
    pub component: usize,
    pub other: usize,
    pub tests: usize,
}

/// `inventory.json`: every categorized source file plus the test files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub generated_at_unix_ms: u64,
    pub counts: InventoryCounts,
    pub files: Vec<SourceFile>,
    pub tests: Vec<String>,
}
