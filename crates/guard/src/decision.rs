use crate::metrics::{GuardMetrics, Thresholds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub passed: bool,
    /// One line per missed threshold and per missing artifact
    pub reasons: Vec<String>,
}

impl Decision {
    pub fn exit_code(&self) -> u8 {
        if self.passed {
            0
        } else {
            2
        }
    }
}

/// Release gate. Reads nothing but its arguments.
pub fn decide(
    metrics: &GuardMetrics,
    thresholds: Thresholds,
    artifacts: &BTreeMap<String, bool>,
) -> Decision {
    let mut reasons = Vec::new();
    if metrics.success_rate < thresholds.success_rate {
        reasons.push(format!(
            "Success rate {}% < {}%",
            metrics.success_rate, thresholds.success_rate
        ));
    }
    if metrics.mapping_score < thresholds.mapping_score {
        reasons.push(format!(
            "Mapping score {}% < {}%",
            metrics.mapping_score, thresholds.mapping_score
        ));
    }
    for (artifact, present) in artifacts {
        if !present {
            reasons.push(format!("Missing: {artifact}"));
        }
    }
    Decision {
        passed: reasons.is_empty(),
        reasons,
    }
}
