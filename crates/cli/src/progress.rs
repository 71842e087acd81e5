use specguard_protocol::{progress_channel, ProgressEvent, ProgressSender};
use tokio::task::JoinHandle;

/// Classification progress is printed every this many files.
const FILE_STEP: usize = 50;

/// Drains progress events onto stderr while a command runs.
pub(crate) struct ProgressPrinter {
    tx: Option<ProgressSender>,
    task: Option<JoinHandle<()>>,
}

impl ProgressPrinter {
    /// A disabled printer hands out no sender, so library code skips emitting.
    pub(crate) fn start(enabled: bool) -> Self {
        if !enabled {
            return Self {
                tx: None,
                task: None,
            };
        }
        let (tx, mut rx) = progress_channel();
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Some(line) = progress_line(&event) {
                    eprintln!("{line}");
                }
            }
        });
        Self {
            tx: Some(tx),
            task: Some(task),
        }
    }

    pub(crate) fn sender(&self) -> Option<&ProgressSender> {
        self.tx.as_ref()
    }

    /// Close the channel and wait until every queued event is printed.
    pub(crate) async fn finish(mut self) {
        drop(self.tx.take());
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

pub(crate) fn progress_line(event: &ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::StageStarted { stage } => Some(format!("▶ {stage}")),
        ProgressEvent::StageFinished { stage, detail } => Some(format!("✔ {stage}: {detail}")),
        ProgressEvent::StageSkipped { stage, reason } => {
            Some(format!("↷ {stage} skipped ({reason})"))
        }
        ProgressEvent::FileClassified { index, total, .. } => {
            (index == total || index % FILE_STEP == 0)
                .then(|| format!("  classified {index}/{total}"))
        }
        ProgressEvent::UnitProcessed {
            unit,
            status,
            detected,
            present,
        } => Some(format!("  {unit}: {status} ({present}/{detected})")),
        ProgressEvent::Warning { message } => Some(format!("⚠ {message}")),
    }
}
