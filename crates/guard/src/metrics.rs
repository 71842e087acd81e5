use crate::reports::{OrchestratorEntry, ValidationReport};
use crate::{GuardError, Result};
use serde::{Deserialize, Serialize};
use specguard_protocol::{
    read_json_optional, SpecguardConfig, ORCHESTRATOR_REPORT_JSON, VALIDATION_POST_JSON,
    VALIDATION_PRE_JSON,
};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitMapping {
    pub detected: usize,
    pub handled: usize,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardMetrics {
    pub total_units: usize,
    pub handled_units: usize,
    pub success_rate: u32,
    pub total_detected: usize,
    pub total_handled: usize,
    pub mapping_score: u32,
    pub per_unit_mapping: BTreeMap<String, UnitMapping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub success_rate: u32,
    pub mapping_score: u32,
}

impl Thresholds {
    pub fn from_config(config: &SpecguardConfig) -> Self {
        Self {
            success_rate: config.guard.required_success_rate,
            mapping_score: config.guard.required_mapping_score,
        }
    }
}

/// `round(part / whole * 100)`, and 0 when there is nothing to measure.
pub fn ratio_score(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

impl GuardMetrics {
    /// Handled counts are only credited for handled units.
    pub fn compute(pre: &ValidationReport, orchestrator: &[OrchestratorEntry]) -> Self {
        let handled_entries = || orchestrator.iter().filter(|e| e.handled);

        let total_units = pre.results.len();
        let handled_units = handled_entries().count();
        let total_detected = pre.total_detected;
        let total_handled = handled_entries().map(|e| e.counts.total).sum();

        let per_unit_mapping = pre
            .results
            .iter()
            .map(|(name, validation)| {
                let handled = orchestrator
                    .iter()
                    .find(|e| &e.name == name)
                    .filter(|e| e.handled)
                    .map(|e| e.counts.total)
                    .unwrap_or(0);
                let mapping = UnitMapping {
                    detected: validation.detected,
                    handled,
                    score: ratio_score(handled, validation.detected),
                };
                (name.clone(), mapping)
            })
            .collect();

        Self {
            total_units,
            handled_units,
            success_rate: ratio_score(handled_units, total_units),
            total_detected,
            total_handled,
            mapping_score: ratio_score(total_handled, total_detected),
            per_unit_mapping,
        }
    }

    pub fn needs_heal(&self, thresholds: Thresholds) -> bool {
        self.success_rate < thresholds.success_rate
            || self.mapping_score < thresholds.mapping_score
            || self
                .per_unit_mapping
                .values()
                .any(|m| m.score < thresholds.mapping_score)
    }
}

/// Recompute from the reports on disk. Every input report must exist.
pub fn load_metrics(root: &Path, config: &SpecguardConfig) -> Result<GuardMetrics> {
    let pre_path = config.report_path(root, VALIDATION_PRE_JSON);
    let post_path = config.report_path(root, VALIDATION_POST_JSON);
    let orchestrator_path = config.report_path(root, ORCHESTRATOR_REPORT_JSON);

    let pre: ValidationReport =
        read_json_optional(&pre_path)?.ok_or(GuardError::MissingReport(pre_path))?;
    let _post: ValidationReport =
        read_json_optional(&post_path)?.ok_or(GuardError::MissingReport(post_path))?;
    let orchestrator: Vec<OrchestratorEntry> = read_json_optional(&orchestrator_path)?
        .ok_or_else(|| GuardError::MissingReport(orchestrator_path.clone()))?;
    if orchestrator.is_empty() && !pre.results.is_empty() {
        return Err(GuardError::MissingReport(orchestrator_path));
    }

    Ok(GuardMetrics::compute(&pre, &orchestrator))
}
