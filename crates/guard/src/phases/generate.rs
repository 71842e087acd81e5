use crate::codegen::{CodeGenerator, GenerationRequest};
use crate::phase::{GuardContext, Phase, PhaseKind, PhaseOutcome};
use crate::reports::{EntryCounts, GenerationMode, OrchestratorEntry};
use crate::validate::UnitCatalog;
use crate::Result;
use async_trait::async_trait;
use specguard_protocol::{emit, write_json_atomic, ProgressEvent, ORCHESTRATOR_REPORT_JSON};
use specguard_spec::{ParsedUnit, UnitLoad};

/// Generate every missing handler of one unit and summarise the result.
pub(crate) async fn realize_unit(
    ctx: &GuardContext,
    generator: &dyn CodeGenerator,
    name: &str,
    load: &UnitLoad,
) -> OrchestratorEntry {
    let parsed: &ParsedUnit = match load {
        UnitLoad::NotFound => {
            return OrchestratorEntry {
                name: name.to_string(),
                handled: false,
                mode: GenerationMode::NotFound,
                counts: EntryCounts::default(),
            }
        }
        UnitLoad::Parsed(parsed) if parsed.is_narrative() => {
            return OrchestratorEntry {
                name: name.to_string(),
                handled: true,
                mode: GenerationMode::Narrative,
                counts: EntryCounts::default(),
            }
        }
        UnitLoad::Parsed(parsed) => parsed,
    };

    let mut counts = EntryCounts::default();
    for entry in &parsed.entries {
        let target = ctx.root().join(&entry.path);
        if target.is_file() {
            counts.existing += 1;
            continue;
        }
        let request = GenerationRequest {
            unit: name,
            entry,
            target,
        };
        match generator.generate(&request).await {
            Ok(()) => {
                log::debug!("Generated {} for {name}", entry.path);
                counts.generated += 1;
            }
            Err(e) => {
                log::warn!("{name}: {e}");
                counts.failed += 1;
            }
        }
    }
    counts.total = counts.existing + counts.generated;

    let entry = OrchestratorEntry {
        name: name.to_string(),
        handled: counts.failed == 0,
        mode: if counts.generated > 0 || counts.failed > 0 {
            GenerationMode::Generated
        } else {
            GenerationMode::Skip
        },
        counts,
    };
    emit(
        ctx.progress(),
        ProgressEvent::UnitProcessed {
            unit: name.to_string(),
            status: if entry.handled { "handled" } else { "failed" }.to_string(),
            detected: parsed.entries.len(),
            present: counts.total,
        },
    );
    entry
}

/// Fills in handlers the validated units ask for but the tree lacks.
pub struct GeneratePhase {
    generator: Box<dyn CodeGenerator>,
}

impl GeneratePhase {
    pub fn new(generator: Box<dyn CodeGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Phase for GeneratePhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Generate
    }

    fn report_name(&self) -> &'static str {
        ORCHESTRATOR_REPORT_JSON
    }

    fn reusable(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &GuardContext) -> Result<PhaseOutcome> {
        let catalog = UnitCatalog::load(ctx.root(), &ctx.config)?;
        let mut entries = Vec::new();
        for (unit, load) in catalog.iter() {
            entries.push(realize_unit(ctx, self.generator.as_ref(), &unit.name, load).await);
        }

        let path = ctx.report_path(ORCHESTRATOR_REPORT_JSON);
        write_json_atomic(&path, &entries)?;

        let generated: usize = entries.iter().map(|e| e.counts.generated).sum();
        let handled = entries.iter().filter(|e| e.handled).count();
        Ok(PhaseOutcome::completed(
            path,
            format!(
                "{handled}/{} units handled, {generated} handlers generated",
                entries.len()
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::PlaceholderGenerator;
    use crate::GuardError;
    use pretty_assertions::assert_eq;
    use specguard_protocol::{read_json, SpecguardConfig};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    struct RejectingGenerator;

    #[async_trait]
    impl CodeGenerator for RejectingGenerator {
        async fn generate(&self, request: &GenerationRequest<'_>) -> Result<()> {
            Err(GuardError::Generator {
                target: request.target.display().to_string(),
                message: "rejected".to_string(),
            })
        }
    }

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        write(
            temp.path(),
            "specs/unit1.md",
            "### API GET /api/users\n\n### API POST /api/orders\n",
        );
        write(temp.path(), "specs/unit2.md", "# Overview only\n");
        write(temp.path(), "src/pages/api/users.ts", "export default h;");
        temp
    }

    #[tokio::test]
    async fn generates_missing_handlers_only() {
        let temp = fixture();
        let ctx = GuardContext::new(temp.path(), SpecguardConfig::default());
        let outcome = GeneratePhase::new(Box::new(PlaceholderGenerator))
            .run(&ctx)
            .await
            .unwrap();

        let entries: Vec<OrchestratorEntry> = read_json(&outcome.report_path.unwrap()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "unit1.md");
        assert_eq!(entries[0].mode, GenerationMode::Generated);
        assert_eq!(
            entries[0].counts,
            EntryCounts {
                total: 2,
                existing: 1,
                generated: 1,
                failed: 0
            }
        );
        assert!(entries[0].handled);
        assert_eq!(entries[1].mode, GenerationMode::Narrative);
        assert!(temp.path().join("src/pages/api/orders.ts").is_file());
        assert_eq!(
            fs::read_to_string(temp.path().join("src/pages/api/users.ts")).unwrap(),
            "export default h;"
        );
    }

    #[tokio::test]
    async fn generator_failures_leave_unit_unhandled() {
        let temp = fixture();
        let ctx = GuardContext::new(temp.path(), SpecguardConfig::default());
        let catalog = UnitCatalog::load(temp.path(), &ctx.config).unwrap();
        let (unit, load) = catalog.get("unit1.md").unwrap();
        let entry = realize_unit(&ctx, &RejectingGenerator, &unit.name, load).await;
        assert!(!entry.handled);
        assert_eq!(entry.counts.failed, 1);
        assert_eq!(entry.counts.total, 1);
    }
}
