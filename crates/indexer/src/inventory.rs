use crate::scanner::{ScanResult, SourceScanner};
use crate::{IndexerError, Result};
use specguard_protocol::{
    read_json_optional, unix_now_ms, write_json_atomic, FileCategory, InventoryCounts,
    InventoryReport, SpecguardConfig, INVENTORY_JSON,
};
use std::path::Path;

impl ScanResult {
    pub fn counts(&self) -> InventoryCounts {
        let mut counts = InventoryCounts {
            tests: self.tests.len(),
            ..InventoryCounts::default()
        };
        for file in &self.files {
            match file.category {
                FileCategory::Api => counts.api += 1,
                FileCategory::Ui => counts.ui += 1,
                FileCategory::Component => counts.component += 1,
                FileCategory::Other => counts.other += 1,
            }
        }
        counts
    }

    pub fn into_report(self) -> InventoryReport {
        InventoryReport {
            generated_at_unix_ms: unix_now_ms(),
            counts: self.counts(),
            files: self.files,
            tests: self.tests,
        }
    }
}

/// Scan `root` and persist `inventory.json` into the reports directory.
pub fn run_inventory(root: &Path, config: &SpecguardConfig) -> Result<InventoryReport> {
    let scanner = SourceScanner::new(root, &config.workspace)?;
    let report = scanner.scan().into_report();
    let path = config.report_path(root, INVENTORY_JSON);
    write_json_atomic(&path, &report)?;
    log::info!(
        "Inventory written to {} ({} api, {} ui, {} component, {} other, {} tests)",
        path.display(),
        report.counts.api,
        report.counts.ui,
        report.counts.component,
        report.counts.other,
        report.counts.tests
    );
    Ok(report)
}

/// Load a previously written inventory; absence is an error naming the file.
pub fn read_inventory(root: &Path, config: &SpecguardConfig) -> Result<InventoryReport> {
    let path = config.report_path(root, INVENTORY_JSON);
    read_json_optional(&path)?.ok_or(IndexerError::MissingInventory(path))
}
