use serde::Serialize;
use tokio::sync::mpsc;

/// One-line progress notifications. Library crates emit these instead of
/// printing; the CLI decides how to render them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    StageStarted { stage: String },
    StageFinished { stage: String, detail: String },
    StageSkipped { stage: String, reason: String },
    FileClassified {
        /// 1-based position of the file just classified
        index: usize,
        total: usize,
        path: String,
        required: bool,
    },
    UnitProcessed {
        unit: String,
        status: String,
        detected: usize,
        present: usize,
    },
    Warning { message: String },
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

/// Send when a listener is attached. A closed receiver is not an error.
pub fn emit(sender: Option<&ProgressSender>, event: ProgressEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn emit_without_listener_is_noop() {
        emit(
            None,
            ProgressEvent::Warning {
                message: "dropped".to_string(),
            },
        );
    }

    #[test]
    fn emit_delivers_in_order_and_tolerates_closed_receiver() {
        let (tx, mut rx) = progress_channel();
        emit(
            Some(&tx),
            ProgressEvent::StageStarted {
                stage: "inventory".to_string(),
            },
        );
        emit(
            Some(&tx),
            ProgressEvent::StageFinished {
                stage: "inventory".to_string(),
                detail: "3 files".to_string(),
            },
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressEvent::StageStarted {
                stage: "inventory".to_string()
            }
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            ProgressEvent::StageFinished { .. }
        ));
        drop(rx);
        emit(
            Some(&tx),
            ProgressEvent::Warning {
                message: "late".to_string(),
            },
        );
    }
}
