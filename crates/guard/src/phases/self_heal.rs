use crate::artifacts::ensure_artifacts;
use crate::codegen::CodeGenerator;
use crate::phase::{GuardContext, Phase, PhaseKind, PhaseOutcome};
use super::generate::realize_unit;
use crate::reports::{HealStatus, HealedUnit, OrchestratorEntry, SelfHealLog, ValidationReport};
use crate::validate::UnitCatalog;
use crate::{GuardError, Result};
use async_trait::async_trait;
use specguard_protocol::{
    read_json_optional, unix_now_ms, write_json_atomic, ORCHESTRATOR_REPORT_JSON,
    SELF_HEAL_LOG_JSON, VALIDATION_POST_JSON, VALIDATION_PRE_JSON,
};
use specguard_spec::UnitLoad;

/// Why a unit needs another generation pass, or `None` when it is healthy.
pub fn heal_reason(
    name: &str,
    detected: usize,
    post: &ValidationReport,
    orchestrator: &[OrchestratorEntry],
) -> Option<&'static str> {
    let Some(entry) = orchestrator.iter().find(|e| e.name == name) else {
        return Some("missing orchestrator entry");
    };
    if !post.results.contains_key(name) {
        return Some("missing post-validation result");
    }
    if !entry.handled {
        return Some("not handled");
    }
    if entry.counts.total < detected {
        return Some("handled fewer entries than detected");
    }
    None
}

/// Regenerates every failing unit once and rewrites the orchestrator report
/// with the new results.
pub struct SelfHealPhase {
    generator: Box<dyn CodeGenerator>,
}

impl SelfHealPhase {
    pub fn new(generator: Box<dyn CodeGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Phase for SelfHealPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::SelfHeal
    }

    fn report_name(&self) -> &'static str {
        SELF_HEAL_LOG_JSON
    }

    async fn run(&self, ctx: &GuardContext) -> Result<PhaseOutcome> {
        let pre_path = ctx.report_path(VALIDATION_PRE_JSON);
        let post_path = ctx.report_path(VALIDATION_POST_JSON);
        let pre: ValidationReport =
            read_json_optional(&pre_path)?.ok_or(GuardError::MissingReport(pre_path))?;
        let post: ValidationReport =
            read_json_optional(&post_path)?.ok_or(GuardError::MissingReport(post_path))?;
        let orchestrator_path = ctx.report_path(ORCHESTRATOR_REPORT_JSON);
        let mut orchestrator: Vec<OrchestratorEntry> =
            read_json_optional(&orchestrator_path)?.unwrap_or_default();

        let catalog = UnitCatalog::load(ctx.root(), &ctx.config)?;
        let regenerated =
            ensure_artifacts(ctx.root(), &ctx.config.guard.required_artifacts, &catalog.names())?;

        let failing: Vec<(String, &'static str)> = pre
            .results
            .iter()
            .filter_map(|(name, validation)| {
                heal_reason(name, validation.detected, &post, &orchestrator)
                    .map(|reason| (name.clone(), reason))
            })
            .collect();

        let mut heal_log = SelfHealLog {
            generated_at_unix_ms: unix_now_ms(),
            failed_count: failing.len(),
            ..SelfHealLog::default()
        };

        for (name, reason) in failing {
            let load = match catalog.get(&name) {
                Some((_, load @ UnitLoad::Parsed(_))) => load,
                _ => {
                    log::warn!("Self-heal: {name} not found, skipping");
                    heal_log.units.push(HealedUnit {
                        name,
                        reason: reason.to_string(),
                        attempts: 0,
                        success: false,
                        status: HealStatus::FileNotFound,
                    });
                    continue;
                }
            };

            heal_log.retried_count += 1;
            let entry = realize_unit(ctx, self.generator.as_ref(), &name, load).await;
            let detected = pre.results.get(&name).map(|v| v.detected).unwrap_or(0);
            let success = entry.handled && entry.counts.total >= detected;
            if success {
                heal_log.success_count += 1;
                log::info!("Self-heal: {name} healed");
            } else {
                log::warn!("Self-heal: {name} still failing ({reason})");
            }

            match orchestrator.iter_mut().find(|e| e.name == name) {
                Some(existing) => *existing = entry,
                None => orchestrator.push(entry),
            }
            heal_log.units.push(HealedUnit {
                name,
                reason: reason.to_string(),
                attempts: 1,
                success,
                status: if success {
                    HealStatus::Healed
                } else {
                    HealStatus::Failed
                },
            });
        }

        write_json_atomic(&orchestrator_path, &orchestrator)?;
        let path = ctx.report_path(SELF_HEAL_LOG_JSON);
        write_json_atomic(&path, &heal_log)?;

        let detail = format!(
            "{} failing, {} healed, {} artifacts regenerated",
            heal_log.failed_count,
            heal_log.success_count,
            regenerated.len()
        );
        if heal_log.still_failed() > 0 {
            Ok(PhaseOutcome::degraded(path, detail))
        } else {
            Ok(PhaseOutcome::completed(path, detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{EntryCounts, GenerationMode, UnitValidation, ValidationPhase};
    use std::collections::BTreeMap;

    fn post(names: &[&str]) -> ValidationReport {
        ValidationReport {
            phase: ValidationPhase::Post,
            generated_at_unix_ms: 0,
            results: names
                .iter()
                .map(|n| (n.to_string(), UnitValidation::not_found()))
                .collect::<BTreeMap<_, _>>(),
            total_detected: 0,
        }
    }

    fn entry(name: &str, handled: bool, total: usize) -> OrchestratorEntry {
        OrchestratorEntry {
            name: name.to_string(),
            handled,
            mode: GenerationMode::Generated,
            counts: EntryCounts {
                total,
                ..EntryCounts::default()
            },
        }
    }

    #[test]
    fn reasons_in_priority_order() {
        let report = post(&["a.md", "b.md", "c.md"]);
        let orchestrator = vec![entry("a.md", false, 0), entry("b.md", true, 1), entry("d.md", true, 3)];

        assert_eq!(heal_reason("a.md", 2, &report, &orchestrator), Some("not handled"));
        assert_eq!(
            heal_reason("b.md", 2, &report, &orchestrator),
            Some("handled fewer entries than detected")
        );
        assert_eq!(
            heal_reason("c.md", 0, &report, &orchestrator),
            Some("missing orchestrator entry")
        );
        assert_eq!(
            heal_reason("d.md", 3, &report, &orchestrator),
            Some("missing post-validation result")
        );
        assert_eq!(heal_reason("b.md", 1, &report, &orchestrator), None);
    }
}
