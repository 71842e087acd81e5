use crate::phase::{GuardContext, Phase, PhaseKind, PhaseOutcome};
use crate::reports::{ReportsFound, VerifyReport, VerifySummary};
use crate::Result;
use async_trait::async_trait;
use specguard_indexer::SourceScanner;
use specguard_protocol::{
    unix_now_ms, write_json_atomic, FileCategory, ORCHESTRATOR_REPORT_JSON, VALIDATION_POST_JSON,
    VALIDATION_PRE_JSON, VERIFY_JSON,
};

/// Confirms the tree holds real code: enough API handlers and UI files,
/// plus the earlier reports. The result is advisory.
pub struct VerifyPhase;

#[async_trait]
impl Phase for VerifyPhase {
    fn kind(&self) -> PhaseKind {
        PhaseKind::Verify
    }

    fn report_name(&self) -> &'static str {
        VERIFY_JSON
    }

    async fn run(&self, ctx: &GuardContext) -> Result<PhaseOutcome> {
        let scan = SourceScanner::new(ctx.root(), &ctx.config.workspace)?.scan();
        let api_files = scan
            .files
            .iter()
            .filter(|f| f.category == FileCategory::Api)
            .count();
        let ui_files = scan
            .files
            .iter()
            .filter(|f| f.category.is_ui_facing())
            .count();

        let guard = &ctx.config.guard;
        let has_enough_api = api_files >= guard.min_api_files;
        let has_enough_ui = ui_files >= guard.min_ui_files;
        let report = VerifyReport {
            generated_at_unix_ms: unix_now_ms(),
            summary: VerifySummary {
                api_files,
                ui_files,
                min_api: guard.min_api_files,
                min_ui: guard.min_ui_files,
            },
            reports_found: ReportsFound {
                orchestrator: ctx.report_path(ORCHESTRATOR_REPORT_JSON).is_file(),
                validation_pre: ctx.report_path(VALIDATION_PRE_JSON).is_file(),
                validation_post: ctx.report_path(VALIDATION_POST_JSON).is_file(),
            },
            has_enough_api,
            has_enough_ui,
            pass: has_enough_api && has_enough_ui,
        };

        let path = ctx.report_path(VERIFY_JSON);
        write_json_atomic(&path, &report)?;
        let detail = format!(
            "{api_files} API files (min {}), {ui_files} UI files (min {})",
            guard.min_api_files, guard.min_ui_files
        );
        if report.pass {
            Ok(PhaseOutcome::completed(path, detail))
        } else {
            log::warn!("Verification below minimums: {detail}");
            Ok(PhaseOutcome::degraded(path, detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseStatus;
    use pretty_assertions::assert_eq;
    use specguard_protocol::{read_json, SpecguardConfig};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn counts_api_and_ui_files() {
        let temp = tempdir().unwrap();
        for rel in [
            "src/pages/api/users.ts",
            "src/app/users/page.tsx",
            "src/components/Card.tsx",
        ] {
            let path = temp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "export default 1;").unwrap();
        }

        let mut config = SpecguardConfig::default();
        config.guard.min_ui_files = 3;
        let ctx = GuardContext::new(temp.path(), config);
        let outcome = VerifyPhase.run(&ctx).await.unwrap();
        assert_eq!(outcome.status, PhaseStatus::Degraded);

        let report: VerifyReport = read_json(&ctx.report_path(VERIFY_JSON)).unwrap();
        assert_eq!(report.summary.api_files, 1);
        assert_eq!(report.summary.ui_files, 2);
        assert!(report.has_enough_api);
        assert!(!report.has_enough_ui);
        assert!(!report.reports_found.validation_pre);
    }
}
