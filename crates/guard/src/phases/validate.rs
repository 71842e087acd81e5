use crate::phase::{GuardContext, Phase, PhaseKind, PhaseOutcome};
use crate::reports::ValidationPhase;
use crate::validate::{validate_catalog, UnitCatalog};
use crate::Result;
use async_trait::async_trait;
use specguard_protocol::{write_json_atomic, VALIDATION_POST_JSON, VALIDATION_PRE_JSON};

/// Parses every unit and checks which requested handlers exist on disk.
pub struct ValidatePhase {
    phase: ValidationPhase,
}

impl ValidatePhase {
    pub fn pre() -> Self {
        Self {
            phase: ValidationPhase::Pre,
        }
    }

    pub fn post() -> Self {
        Self {
            phase: ValidationPhase::Post,
        }
    }
}

#[async_trait]
impl Phase for ValidatePhase {
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

    /// The post-validation report always reflects the current tree.
    fn reusable(&self) -> bool {
        self.phase == ValidationPhase::Pre
    }

    async fn run(&self, ctx: &GuardContext) -> Result<PhaseOutcome> {
        let catalog = UnitCatalog::load(ctx.root(), &ctx.config)?;
        let report = validate_catalog(ctx.root(), &catalog, self.phase, ctx.progress());
        let path = ctx.report_path(self.report_name());
        write_json_atomic(&path, &report)?;

        let present: usize = report.results.values().map(|v| v.present).sum();
        Ok(PhaseOutcome::completed(
            path,
            format!(
                "{} units, {present}/{} entries present",
                report.results.len(),
                report.total_detected
            ),
        ))
    }
}
