use crate::classify::ClassificationReport;
use crate::{GraphError, Result};
use serde::{Deserialize, Serialize};
use specguard_protocol::paths::{normalize_dir, parent_dir};
use specguard_protocol::{
    read_json_optional, unix_now_ms, write_json_atomic, SpecguardConfig, WorkspaceConfig,
    CLASSIFICATION_JSON, PRUNE_SUMMARY_JSON,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path};

/// Load `classification.json` written by [`crate::run_classification`].
pub fn read_classification(root: &Path, config: &SpecguardConfig) -> Result<ClassificationReport> {
    let path = config.report_path(root, CLASSIFICATION_JSON);
    read_json_optional(&path)?.ok_or(GraphError::MissingClassification(path))
}

/// Removal candidates split by what is actually on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrunePlan {
    pub existing: Vec<String>,
    /// Listed as a candidate but already gone
    pub missing: Vec<String>,
    /// Never touched: paths leaving the root, or files also marked required
    pub rejected: Vec<String>,
}

impl PrunePlan {
    pub fn from_report(root: &Path, report: &ClassificationReport) -> Self {
        let required: BTreeSet<&str> = report
            .required_apis
            .iter()
            .chain(&report.required_ui)
            .map(|v| v.file.as_str())
            .collect();
        let candidates: BTreeSet<&str> = report
            .candidate_apis
            .iter()
            .chain(&report.candidate_ui)
            .map(|v| v.file.as_str())
            .collect();

        let mut plan = Self::default();
        for file in candidates {
            if required.contains(file) || !stays_inside_root(file) {
                log::warn!("Refusing to prune {file}");
                plan.rejected.push(file.to_string());
            } else if root.join(file).is_file() {
                plan.existing.push(file.to_string());
            } else {
                plan.missing.push(file.to_string());
            }
        }
        plan
    }

    pub fn candidates(&self) -> usize {
        self.existing.len() + self.missing.len() + self.rejected.len()
    }

    /// Delete the existing candidates unless `dry_run`, then drop directories
    /// the deletions left empty.
    pub fn apply(&self, root: &Path, workspace: &WorkspaceConfig, dry_run: bool) -> PruneSummary {
        let mut summary = PruneSummary {
            generated_at_unix_ms: unix_now_ms(),
            dry_run,
            candidates: self.candidates(),
            existing: self.existing.clone(),
            missing: self.missing.clone(),
            rejected: self.rejected.clone(),
            ..PruneSummary::default()
        };
        if dry_run {
            return summary;
        }

        let mut touched = BTreeSet::new();
        for file in &self.existing {
            match fs::remove_file(root.join(file)) {
                Ok(()) => {
                    log::debug!("Removed {file}");
                    touched.insert(parent_dir(file).to_string());
                    summary.removed.push(file.clone());
                }
                Err(e) => {
                    log::warn!("Could not remove {file}: {e}");
                    summary.failed.push(PruneFailure {
                        file: file.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        summary.removed_dirs = remove_empty_dirs(root, &protected_dirs(workspace), touched);
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneFailure {
    pub file: String,
    pub error: String,
}

/// `prune_summary.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PruneSummary {
    pub generated_at_unix_ms: u64,
    pub dry_run: bool,
    pub candidates: usize,
    pub existing: Vec<String>,
    pub missing: Vec<String>,
    pub rejected: Vec<String>,
    pub removed: Vec<String>,
    pub failed: Vec<PruneFailure>,
    pub removed_dirs: Vec<String>,
}

/// Plan from the persisted classification, apply it and write
/// `prune_summary.json`. Nothing is deleted unless `execute` is set.
pub fn run_prune(root: &Path, config: &SpecguardConfig, execute: bool) -> Result<PruneSummary> {
    let report = read_classification(root, config)?;
    let plan = PrunePlan::from_report(root, &report);
    let summary = plan.apply(root, &config.workspace, !execute);
    write_json_atomic(&config.report_path(root, PRUNE_SUMMARY_JSON), &summary)?;
    log::info!(
        "Prune {}: {} candidates, {} removed, {} failed",
        if execute { "executed" } else { "dry run" },
        summary.candidates,
        summary.removed.len(),
        summary.failed.len()
    );
    Ok(summary)
}

fn stays_inside_root(file: &str) -> bool {
    !file.is_empty()
        && Path::new(file)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Scan roots survive even when emptied.
fn protected_dirs(workspace: &WorkspaceConfig) -> BTreeSet<String> {
    std::iter::once(&workspace.api_root)
        .chain(&workspace.ui_roots)
        .chain(&workspace.component_roots)
        .map(|dir| normalize_dir(dir))
        .collect()
}

/// Walk up from each touched directory, removing it while empty.
fn remove_empty_dirs(root: &Path, protected: &BTreeSet<String>, touched: BTreeSet<String>) -> Vec<String> {
    let mut removed = BTreeSet::new();
    for dir in touched {
        let mut current = dir.as_str();
        while !current.is_empty() && !protected.contains(current) {
            let abs = root.join(current);
            let empty = fs::read_dir(&abs)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if !empty {
                break;
            }
            if let Err(e) = fs::remove_dir(&abs) {
                log::debug!("Kept directory {current}: {e}");
                break;
            }
            removed.insert(current.to_string());
            current = parent_dir(current);
        }
    }
    removed.into_iter().collect()
}
