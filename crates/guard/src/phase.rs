use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use specguard_protocol::{ProgressSender, SpecguardConfig};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseKind {
    PreValidate,
    Generate,
    PostValidate,
    SelfHeal,
    Verify,
}

impl PhaseKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            PhaseKind::PreValidate => "pre-validate",
            PhaseKind::Generate => "generate",
            PhaseKind::PostValidate => "post-validate",
            PhaseKind::SelfHeal => "self-heal",
            PhaseKind::Verify => "verify",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed,
    /// Ran, but reported a problem that does not stop the pipeline
    Degraded,
    /// Reused an existing report
    Skipped,
    /// Errored in a phase whose failure the pipeline tolerates
    Failed,
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhaseStatus::Completed => "completed",
            PhaseStatus::Degraded => "degraded",
            PhaseStatus::Skipped => "skipped",
            PhaseStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseOutcome {
    pub status: PhaseStatus,
    pub report_path: Option<PathBuf>,
    pub detail: String,
}

impl PhaseOutcome {
    pub fn completed(report_path: PathBuf, detail: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Completed,
            report_path: Some(report_path),
            detail: detail.into(),
        }
    }

    pub fn degraded(report_path: PathBuf, detail: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Degraded,
            report_path: Some(report_path),
            detail: detail.into(),
        }
    }

    pub fn skipped(report_path: PathBuf) -> Self {
        Self {
            status: PhaseStatus::Skipped,
            report_path: Some(report_path),
            detail: "report reused".to_string(),
        }
    }
}

/// Everything a phase may read. Phases communicate only through the report
/// files under the reports directory.
pub struct GuardContext {
    pub root: PathBuf,
    pub config: SpecguardConfig,
    /// Ignore reusable reports and rerun every phase
    pub force: bool,
    pub progress: Option<ProgressSender>,
}

impl GuardContext {
    pub fn new(root: impl Into<PathBuf>, config: SpecguardConfig) -> Self {
        Self {
            root: root.into(),
            config,
            force: false,
            progress: None,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn report_path(&self, name: &str) -> PathBuf {
        self.config.report_path(&self.root, name)
    }

    pub fn progress(&self) -> Option<&ProgressSender> {
        self.progress.as_ref()
    }
}

#[async_trait]
pub trait Phase: Send + Sync {
    fn kind(&self) -> PhaseKind;

    /// Report this phase writes; when it already exists and the run is not
    /// forced, a reusable phase is skipped.
    fn report_name(&self) -> &'static str;

    fn reusable(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &GuardContext) -> Result<PhaseOutcome>;
}
