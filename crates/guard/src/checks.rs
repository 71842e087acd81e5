use serde::{Deserialize, Serialize};
use specguard_protocol::{ExternalCheck, FailureMode};
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Pass,
    Advisory,
    Fail,
    /// The program could not be started
    Skipped,
    Timeout,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Advisory => "ADVISORY",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "SKIPPED",
            CheckStatus::Timeout => "TIMEOUT",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub name: String,
    pub status: CheckStatus,
}

/// Run one check to completion. Never errors: every failure mode is a status.
pub async fn run_check(root: &Path, check: &ExternalCheck, limit: Duration) -> CheckOutcome {
    let child = Command::new(&check.program)
        .args(&check.args)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let status = match child {
        Err(e) => {
            log::warn!("Check {} could not start: {e}", check.name);
            CheckStatus::Skipped
        }
        Ok(child) => match timeout(limit, child.wait_with_output()).await {
            Err(_) => {
                log::warn!("Check {} timed out after {}s", check.name, limit.as_secs());
                CheckStatus::Timeout
            }
            Ok(Err(e)) => {
                log::warn!("Check {} failed to run: {e}", check.name);
                CheckStatus::Skipped
            }
            Ok(Ok(output)) if output.status.success() => CheckStatus::Pass,
            Ok(Ok(output)) => {
                log::debug!(
                    "Check {} stderr: {}",
                    check.name,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                match check.on_failure {
                    FailureMode::Advisory => CheckStatus::Advisory,
                    FailureMode::Fail => CheckStatus::Fail,
                }
            }
        },
    };

    log::info!("Check {}: {status}", check.name);
    CheckOutcome {
        name: check.name.clone(),
        status,
    }
}

pub async fn run_checks(root: &Path, checks: &[ExternalCheck], limit: Duration) -> Vec<CheckOutcome> {
    let mut outcomes = Vec::with_capacity(checks.len());
    for check in checks {
        outcomes.push(run_check(root, check, limit).await);
    }
    outcomes
}
