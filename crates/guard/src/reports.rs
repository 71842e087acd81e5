use serde::{Deserialize, Serialize};
use specguard_spec::{DocumentPattern, HttpMethod};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPhase {
    Pre,
    Post,
}

impl fmt::Display for ValidationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationPhase::Pre => f.write_str("pre"),
            ValidationPhase::Post => f.write_str("post"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitStatus {
    Complete,
    Partial,
    Missing,
    /// Documentation only; complete without generation
    Narrative,
    NotFound,
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnitStatus::Complete => "COMPLETE",
            UnitStatus::Partial => "PARTIAL",
            UnitStatus::Missing => "MISSING",
            UnitStatus::Narrative => "NARRATIVE",
            UnitStatus::NotFound => "NOT_FOUND",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingEntry {
    pub method: HttpMethod,
    pub route: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitValidation {
    pub detected: usize,
    pub present: usize,
    pub status: UnitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<DocumentPattern>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub missing: Vec<MissingEntry>,
}

impl UnitValidation {
    pub fn not_found() -> Self {
        Self {
            detected: 0,
            present: 0,
            status: UnitStatus::NotFound,
            pattern: None,
            warnings: Vec::new(),
            missing: Vec::new(),
        }
    }
}

/// `validation_pre.json` / `validation_post.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub phase: ValidationPhase,
    pub generated_at_unix_ms: u64,
    pub results: BTreeMap<String, UnitValidation>,
    pub total_detected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    /// Every entry already had a handler
    Skip,
    Generated,
    Narrative,
    NotFound,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCounts {
    /// Entries with a handler on disk after the phase ran
    pub total: usize,
    pub existing: usize,
    pub generated: usize,
    pub failed: usize,
}

/// One element of `orchestrator-report.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorEntry {
    pub name: String,
    pub handled: bool,
    pub mode: GenerationMode,
    pub counts: EntryCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealStatus {
    Healed,
    Failed,
    FileNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealedUnit {
    pub name: String,
    pub reason: String,
    pub attempts: usize,
    pub success: bool,
    pub status: HealStatus,
}

/// `self_heal_log.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfHealLog {
    pub generated_at_unix_ms: u64,
    pub failed_count: usize,
    pub retried_count: usize,
    pub success_count: usize,
    pub units: Vec<HealedUnit>,
}

impl SelfHealLog {
    pub fn still_failed(&self) -> usize {
        self.failed_count.saturating_sub(self.success_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySummary {
    pub api_files: usize,
    pub ui_files: usize,
    pub min_api: usize,
    pub min_ui: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsFound {
    pub orchestrator: bool,
    pub validation_pre: bool,
    pub validation_post: bool,
}

/// `verify_unit_to_code.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    pub generated_at_unix_ms: u64,
    pub summary: VerifySummary,
    pub reports_found: ReportsFound,
    pub has_enough_api: bool,
    pub has_enough_ui: bool,
    pub pass: bool,
}
