use crate::artifacts::{artifact_presence, ensure_artifacts};
use crate::checks::{run_checks, CheckOutcome};
use crate::codegen::generator_from_config;
use crate::decision::{decide, Decision};
use crate::metrics::{load_metrics, GuardMetrics, Thresholds};
use crate::phase::{GuardContext, Phase, PhaseKind, PhaseOutcome, PhaseStatus};
use crate::phases::{GeneratePhase, SelfHealPhase, ValidatePhase, VerifyPhase};
use crate::reports::{SelfHealLog, VerifyReport};
use crate::{GuardError, Result};
use serde::Serialize;
use specguard_protocol::{
    emit, read_json_optional, unix_now_ms, write_json_atomic, ProgressEvent, GUARD_METRICS_JSON,
    SELF_HEAL_LOG_JSON, VERIFY_JSON,
};
use specguard_spec::discover_units;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Init,
    EnsureArtifacts,
    PreValidate,
    Generate,
    PostValidate,
    Metrics1,
    SelfHeal,
    PostValidate2,
    Metrics2,
    Verify,
    MetricsFinal,
    Decision,
    Done,
}

impl fmt::Display for GuardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GuardState::Init => "INIT",
            GuardState::EnsureArtifacts => "ENSURE_ARTIFACTS",
            GuardState::PreValidate => "PRE_VALIDATE",
            GuardState::Generate => "GENERATE",
            GuardState::PostValidate => "POST_VALIDATE",
            GuardState::Metrics1 => "METRICS_1",
            GuardState::SelfHeal => "SELF_HEAL",
            GuardState::PostValidate2 => "POST_VALIDATE_2",
            GuardState::Metrics2 => "METRICS_2",
            GuardState::Verify => "VERIFY",
            GuardState::MetricsFinal => "METRICS_FINAL",
            GuardState::Decision => "DECISION",
            GuardState::Done => "DONE",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseRecord {
    pub phase: PhaseKind,
    pub status: PhaseStatus,
    pub detail: String,
}

/// `guard_metrics.json`: the final state of one guard run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardReport {
    pub generated_at_unix_ms: u64,
    pub metrics: GuardMetrics,
    pub thresholds: Thresholds,
    pub heal_triggered: bool,
    pub self_heal: Option<SelfHealLog>,
    pub verify: Option<VerifyReport>,
    pub checks: Vec<CheckOutcome>,
    pub artifacts: BTreeMap<String, bool>,
    pub regenerated_artifacts: Vec<String>,
    pub phases: Vec<PhaseRecord>,
    pub decision: Decision,
}

impl GuardReport {
    pub fn exit_code(&self) -> u8 {
        self.decision.exit_code()
    }
}

#[derive(Default)]
struct RunState {
    phases: Vec<PhaseRecord>,
    regenerated: Vec<String>,
    heal_triggered: bool,
    metrics: Option<GuardMetrics>,
    checks: Vec<CheckOutcome>,
    artifacts: BTreeMap<String, bool>,
    decision: Option<Decision>,
}

/// Drives the guard state machine over a set of phases.
pub struct GuardOrchestrator {
    ctx: GuardContext,
    phases: HashMap<PhaseKind, Box<dyn Phase>>,
}

impl GuardOrchestrator {
    /// Default phases, generating through the configured command or
    /// placeholders when none is set.
    pub fn new(ctx: GuardContext) -> Self {
        let limit = Duration::from_secs(ctx.config.guard.timeout_secs);
        let generator = || generator_from_config(ctx.config.guard.generator.as_ref(), &ctx.root, limit);
        let defaults: Vec<Box<dyn Phase>> = vec![
            Box::new(ValidatePhase::pre()),
            Box::new(GeneratePhase::new(generator())),
            Box::new(ValidatePhase::post()),
            Box::new(SelfHealPhase::new(generator())),
            Box::new(VerifyPhase),
        ];
        let phases = defaults.into_iter().map(|p| (p.kind(), p)).collect();
        Self { ctx, phases }
    }

    /// Replace the phase of the same kind.
    pub fn with_phase(mut self, phase: Box<dyn Phase>) -> Self {
        self.phases.insert(phase.kind(), phase);
        self
    }

    pub fn context(&self) -> &GuardContext {
        &self.ctx
    }

    pub async fn run(&self) -> Result<GuardReport> {
        let ctx = &self.ctx;
        let thresholds = Thresholds::from_config(&ctx.config);
        let mut run = RunState::default();
        let mut state = GuardState::Init;

        while state != GuardState::Done {
            log::debug!("Guard state {state}");
            state = match state {
                GuardState::Init => GuardState::EnsureArtifacts,
                GuardState::EnsureArtifacts => {
                    let names: Vec<String> = discover_units(ctx.root(), &ctx.config.units)
                        .map_err(|e| GuardError::phase("ensure-artifacts", e))?
                        .into_iter()
                        .map(|u| u.name)
                        .collect();
                    run.regenerated =
                        ensure_artifacts(ctx.root(), &ctx.config.guard.required_artifacts, &names)?;
                    GuardState::PreValidate
                }
                GuardState::PreValidate => {
                    self.run_phase(PhaseKind::PreValidate, false, &mut run).await?;
                    GuardState::Generate
                }
                GuardState::Generate => {
                    self.run_phase(PhaseKind::Generate, false, &mut run).await?;
                    GuardState::PostValidate
                }
                GuardState::PostValidate => {
                    self.run_phase(PhaseKind::PostValidate, false, &mut run).await?;
                    GuardState::Metrics1
                }
                GuardState::Metrics1 => {
                    let metrics = self.metrics_stage("metrics-1")?;
                    let next = if metrics.needs_heal(thresholds) {
                        log::warn!(
                            "Quality below threshold (success {}%, mapping {}%), running self-heal",
                            metrics.success_rate,
                            metrics.mapping_score
                        );
                        GuardState::SelfHeal
                    } else {
                        GuardState::Verify
                    };
                    run.metrics = Some(metrics);
                    next
                }
                GuardState::SelfHeal => {
                    run.heal_triggered = true;
                    self.run_phase(PhaseKind::SelfHeal, true, &mut run).await?;
                    GuardState::PostValidate2
                }
                GuardState::PostValidate2 => {
                    self.run_phase(PhaseKind::PostValidate, true, &mut run).await?;
                    GuardState::Metrics2
                }
                GuardState::Metrics2 => {
                    run.metrics = Some(self.metrics_stage("metrics-2")?);
                    GuardState::Verify
                }
                GuardState::Verify => {
                    self.run_phase(PhaseKind::Verify, true, &mut run).await?;
                    GuardState::MetricsFinal
                }
                GuardState::MetricsFinal => {
                    run.metrics = Some(self.metrics_stage("metrics-final")?);
                    let limit = Duration::from_secs(ctx.config.guard.timeout_secs);
                    run.checks = run_checks(ctx.root(), &ctx.config.guard.checks, limit).await;
                    run.artifacts =
                        artifact_presence(ctx.root(), &ctx.config.guard.required_artifacts);
                    GuardState::Decision
                }
                GuardState::Decision => {
                    let metrics = run
                        .metrics
                        .as_ref()
                        .ok_or_else(|| GuardError::phase("decision", "no final metrics"))?;
                    run.decision = Some(decide(metrics, thresholds, &run.artifacts));
                    GuardState::Done
                }
                GuardState::Done => GuardState::Done,
            };
        }

        let (Some(metrics), Some(decision)) = (run.metrics, run.decision) else {
            return Err(GuardError::phase("decision", "run ended without a decision"));
        };
        // A log left by an earlier run says nothing about this one.
        let self_heal: Option<SelfHealLog> = if run.heal_triggered {
            read_json_optional(&ctx.report_path(SELF_HEAL_LOG_JSON))?
        } else {
            None
        };
        let report = GuardReport {
            generated_at_unix_ms: unix_now_ms(),
            metrics,
            thresholds,
            heal_triggered: run.heal_triggered,
            self_heal,
            verify: read_json_optional(&ctx.report_path(VERIFY_JSON))?,
            checks: run.checks,
            artifacts: run.artifacts,
            regenerated_artifacts: run.regenerated,
            phases: run.phases,
            decision,
        };
        write_json_atomic(&ctx.report_path(GUARD_METRICS_JSON), &report)?;

        if report.decision.passed {
            log::info!("Guard passed");
        } else {
            log::warn!("Guard failed: {}", report.decision.reasons.join("; "));
        }
        Ok(report)
    }

    fn metrics_stage(&self, stage: &str) -> Result<GuardMetrics> {
        emit(
            self.ctx.progress(),
            ProgressEvent::StageStarted {
                stage: stage.to_string(),
            },
        );
        let metrics = load_metrics(self.ctx.root(), &self.ctx.config)?;
        emit(
            self.ctx.progress(),
            ProgressEvent::StageFinished {
                stage: stage.to_string(),
                detail: format!(
                    "success {}% ({}/{}), mapping {}% ({}/{})",
                    metrics.success_rate,
                    metrics.handled_units,
                    metrics.total_units,
                    metrics.mapping_score,
                    metrics.total_handled,
                    metrics.total_detected
                ),
            },
        );
        Ok(metrics)
    }

    /// Run one phase. A `tolerant` phase that errors is recorded as failed
    /// and the run continues; otherwise the error aborts the run.
    async fn run_phase(&self, kind: PhaseKind, tolerant: bool, run: &mut RunState) -> Result<()> {
        let ctx = &self.ctx;
        let phase = self
            .phases
            .get(&kind)
            .ok_or_else(|| GuardError::phase(kind.as_str(), "no phase registered"))?;
        emit(
            ctx.progress(),
            ProgressEvent::StageStarted {
                stage: kind.to_string(),
            },
        );

        let report = ctx.report_path(phase.report_name());
        let outcome = if phase.reusable() && !ctx.force && report.is_file() {
            emit(
                ctx.progress(),
                ProgressEvent::StageSkipped {
                    stage: kind.to_string(),
                    reason: format!("{} already present", phase.report_name()),
                },
            );
            PhaseOutcome::skipped(report)
        } else {
            match phase.run(ctx).await {
                Ok(outcome) => outcome,
                Err(e) if tolerant => {
                    log::warn!("Phase {kind} failed, continuing: {e}");
                    emit(
                        ctx.progress(),
                        ProgressEvent::Warning {
                            message: format!("{kind} failed: {e}"),
                        },
                    );
                    run.phases.push(PhaseRecord {
                        phase: kind,
                        status: PhaseStatus::Failed,
                        detail: e.to_string(),
                    });
                    return Ok(());
                }
                Err(e) => {
                    log::error!("Phase {kind} failed: {e}");
                    return Err(GuardError::phase(kind.as_str(), e));
                }
            }
        };

        if outcome.status != PhaseStatus::Skipped {
            emit(
                ctx.progress(),
                ProgressEvent::StageFinished {
                    stage: kind.to_string(),
                    detail: outcome.detail.clone(),
                },
            );
        }
        log::info!("Phase {kind}: {} ({})", outcome.status, outcome.detail);
        run.phases.push(PhaseRecord {
            phase: kind,
            status: outcome.status,
            detail: outcome.detail,
        });
        Ok(())
    }
}
