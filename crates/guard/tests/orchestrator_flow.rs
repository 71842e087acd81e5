use async_trait::async_trait;
use pretty_assertions::assert_eq;
use specguard_guard::{
    EntryCounts, GenerationMode, GuardContext, GuardError, GuardOrchestrator, OrchestratorEntry,
    Phase, PhaseKind, PhaseOutcome, PhaseStatus, Result, UnitStatus, UnitValidation,
    ValidationPhase, ValidationReport,
};
use specguard_protocol::{
    write_json_atomic, SpecguardConfig, GUARD_METRICS_JSON, ORCHESTRATOR_REPORT_JSON,
    VALIDATION_POST_JSON, VALIDATION_PRE_JSON,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

fn unit_names(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("unit{i}.md")).collect()
}

fn handled(names: &[String], handled_count: usize) -> Vec<OrchestratorEntry> {
    names
        .iter()
        .enumerate()
        .map(|(idx, name)| OrchestratorEntry {
            name: name.clone(),
            handled: idx < handled_count,
            mode: GenerationMode::Generated,
            counts: EntryCounts {
                total: 2,
                generated: 2,
                ..EntryCounts::default()
            },
        })
        .collect()
}

struct FakeValidate {
    phase: ValidationPhase,
    names: Vec<String>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Phase for FakeValidate {
    fn kind(&self) -> PhaseKind {
        match self.phase {
            ValidationPhase::Pre => PhaseKind::PreValidate,
            ValidationPhase::Post => PhaseKind::PostValidate,
        }
    }

    fn report_name(&self) -> &'static str {
        match self.phase {
            ValidationPhase::Pre => VALIDATION_PRE_JSON,
            ValidationPhase::Post => VALIDATION_POST_JSON,
        }
    }

    fn reusable(&self) -> bool {
        self.phase == ValidationPhase::Pre
    }

    async fn run(&self, ctx: &GuardContext) -> Result<PhaseOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let results = self
            .names
            .iter()
            .map(|name| {
                let validation = UnitValidation {
                    detected: 2,
                    present: 2,
                    status: UnitStatus::Complete,
                    pattern: None,
                    warnings: Vec::new(),
                    missing: Vec::new(),
                };
                (name.clone(), validation)
            })
            .collect();
        let report = ValidationReport {
            phase: self.phase,
            generated_at_unix_ms: 0,
            results,
            total_detected: self.names.len() * 2,
        };
        let path = ctx.report_path(self.report_name());
        write_json_atomic(&path, &report)?;
        Ok(PhaseOutcome::completed(path, "fake"))
    }
}

/// Writes a fixed orchestrator report. Used for both generate and self-heal.
struct FakeGenerate {
    kind: PhaseKind,
    entries: Option<Vec<OrchestratorEntry>>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Phase for FakeGenerate {
    fn kind(&self) -> PhaseKind {
        self.kind
    }

    fn report_name(&self) -> &'static str {
        ORCHESTRATOR_REPORT_JSON
    }

    fn reusable(&self) -> bool {
        self.kind == PhaseKind::Generate
    }

    async fn run(&self, ctx: &GuardContext) -> Result<PhaseOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(entries) = &self.entries else {
            return Err(GuardError::phase(self.kind.as_str(), "generator crashed"));
        };
        let path = ctx.report_path(ORCHESTRATOR_REPORT_JSON);
        write_json_atomic(&path, entries)?;
        Ok(PhaseOutcome::completed(path, "fake"))
    }
}

struct Harness {
    temp: TempDir,
    pre_calls: Arc<AtomicUsize>,
    post_calls: Arc<AtomicUsize>,
    generate_calls: Arc<AtomicUsize>,
    heal_calls: Arc<AtomicUsize>,
}

impl Harness {
    fn new() -> Self {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("specs")).unwrap();
        Self {
            temp,
            pre_calls: Arc::default(),
            post_calls: Arc::default(),
            generate_calls: Arc::default(),
            heal_calls: Arc::default(),
        }
    }

    fn orchestrator(
        &self,
        names: &[String],
        generated: Option<Vec<OrchestratorEntry>>,
        healed: Option<Vec<OrchestratorEntry>>,
        force: bool,
    ) -> GuardOrchestrator {
        let ctx = GuardContext::new(self.temp.path(), SpecguardConfig::default()).with_force(force);
        GuardOrchestrator::new(ctx)
            .with_phase(Box::new(FakeValidate {
                phase: ValidationPhase::Pre,
                names: names.to_vec(),
                calls: self.pre_calls.clone(),
            }))
            .with_phase(Box::new(FakeValidate {
                phase: ValidationPhase::Post,
                names: names.to_vec(),
                calls: self.post_calls.clone(),
            }))
            .with_phase(Box::new(FakeGenerate {
                kind: PhaseKind::Generate,
                entries: generated,
                calls: self.generate_calls.clone(),
            }))
            .with_phase(Box::new(FakeGenerate {
                kind: PhaseKind::SelfHeal,
                entries: healed,
                calls: self.heal_calls.clone(),
            }))
    }
}

#[tokio::test]
async fn healthy_run_passes_without_healing() {
    let harness = Harness::new();
    let names = unit_names(4);
    let report = harness
        .orchestrator(&names, Some(handled(&names, 4)), Some(handled(&names, 4)), false)
        .run()
        .await
        .unwrap();

    assert_eq!(report.exit_code(), 0);
    assert!(report.decision.passed);
    assert!(!report.heal_triggered);
    assert_eq!(harness.heal_calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.metrics.success_rate, 100);
    assert_eq!(report.metrics.mapping_score, 100);
    assert_eq!(report.regenerated_artifacts.len(), 3);
    assert!(report.artifacts.values().all(|present| *present));
    assert!(harness
        .temp
        .path()
        .join("ops/reports")
        .join(GUARD_METRICS_JSON)
        .is_file());
}

#[tokio::test]
async fn below_threshold_heals_exactly_once() {
    let harness = Harness::new();
    let names = unit_names(10);
    let report = harness
        .orchestrator(&names, Some(handled(&names, 9)), Some(handled(&names, 10)), false)
        .run()
        .await
        .unwrap();

    assert!(report.heal_triggered);
    assert_eq!(harness.heal_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.pre_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.post_calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.metrics.success_rate, 100);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn failed_heal_is_recorded_and_gate_fails() {
    let harness = Harness::new();
    let names = unit_names(10);
    let report = harness
        .orchestrator(&names, Some(handled(&names, 9)), None, false)
        .run()
        .await
        .unwrap();

    assert_eq!(harness.heal_calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.exit_code(), 2);
    assert_eq!(report.metrics.success_rate, 90);
    assert!(report
        .decision
        .reasons
        .contains(&"Success rate 90% < 95%".to_string()));
    let heal = report
        .phases
        .iter()
        .find(|p| p.phase == PhaseKind::SelfHeal)
        .unwrap();
    assert_eq!(heal.status, PhaseStatus::Failed);
}

#[tokio::test]
async fn generate_failure_aborts_with_exit_three() {
    let harness = Harness::new();
    let names = unit_names(2);
    let err = harness
        .orchestrator(&names, None, None, false)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("generate"));
    let reports = harness.temp.path().join("ops/reports");
    assert!(reports.join(VALIDATION_PRE_JSON).is_file());
    assert!(!reports.join(GUARD_METRICS_JSON).exists());
}

#[tokio::test]
async fn existing_reports_are_reused_unless_forced() {
    let harness = Harness::new();
    let names = unit_names(2);
    let run = |force| {
        harness.orchestrator(&names, Some(handled(&names, 2)), Some(handled(&names, 2)), force)
    };

    run(false).run().await.unwrap();
    run(false).run().await.unwrap();
    assert_eq!(harness.pre_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.generate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.post_calls.load(Ordering::SeqCst), 2);

    let report = run(true).run().await.unwrap();
    assert_eq!(harness.pre_calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.generate_calls.load(Ordering::SeqCst), 2);
    assert!(report
        .phases
        .iter()
        .all(|p| p.status != PhaseStatus::Skipped));
}

#[tokio::test]
async fn missing_units_dir_stops_before_any_phase() {
    let harness = Harness::new();
    std::fs::remove_dir(harness.temp.path().join("specs")).unwrap();
    let names = unit_names(2);
    let err = harness
        .orchestrator(&names, Some(handled(&names, 2)), Some(handled(&names, 2)), false)
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 3);
    let message = err.to_string();
    assert!(message.contains("ensure-artifacts"), "{message}");
    assert!(message.contains("Units directory not found"), "{message}");
    assert_eq!(harness.pre_calls.load(Ordering::SeqCst), 0);
    assert!(!harness
        .temp
        .path()
        .join("ops/reports")
        .join(VALIDATION_PRE_JSON)
        .exists());
}
