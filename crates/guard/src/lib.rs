//! # specguard guard
//!
//! Release-readiness gate over the generated application.
//!
//! ```text
//! ENSURE_ARTIFACTS
//!     └─> PRE_VALIDATE ─> GENERATE ─> POST_VALIDATE ─> METRICS_1
//!                                                        │
//!                      needs heal? ── yes ─> SELF_HEAL ─> POST_VALIDATE_2 ─> METRICS_2
//!                                     │                                        │
//!                                     no ──────────────────────────────────────┤
//!                                                                              v
//!                                          VERIFY ─> METRICS_FINAL (+ checks) ─> DECISION
//! ```
//!
//! Phases only talk through report files, so every metric is recomputed from
//! disk and any phase can be swapped for a fake via
//! [`GuardOrchestrator::with_phase`].

mod artifacts;
mod checks;
mod codegen;
mod decision;
mod error;
mod metrics;
mod orchestrator;
mod phase;
mod phases;
mod reports;
mod validate;

pub use artifacts::{artifact_presence, ensure_artifacts};
pub use checks::{run_check, run_checks, CheckOutcome, CheckStatus};
pub use codegen::{
    generator_from_config, CodeGenerator, CommandGenerator, GenerationRequest, PlaceholderGenerator,
};
pub use decision::{decide, Decision};
pub use error::{GuardError, Result};
pub use metrics::{load_metrics, ratio_score, GuardMetrics, Thresholds, UnitMapping};
pub use orchestrator::{GuardOrchestrator, GuardReport, GuardState, PhaseRecord};
pub use phase::{GuardContext, Phase, PhaseKind, PhaseOutcome, PhaseStatus};
pub use phases::{heal_reason, GeneratePhase, SelfHealPhase, ValidatePhase, VerifyPhase};
pub use reports::{
    EntryCounts, GenerationMode, HealStatus, HealedUnit, MissingEntry, OrchestratorEntry,
    ReportsFound, SelfHealLog, UnitStatus, UnitValidation, ValidationPhase, ValidationReport,
    VerifyReport, VerifySummary,
};
pub use validate::{validate_catalog, validate_unit, UnitCatalog};
