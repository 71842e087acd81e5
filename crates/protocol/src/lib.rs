//! # specguard protocol
//!
//! Types shared by every stage of the tool-chain: configuration, the
//! categorized source-file model, report file names, atomic report IO and the
//! progress events the CLI renders.

mod config;
mod error;
mod io;
pub mod paths;
mod progress;
mod reports;
mod source;

pub use config::{
    ContractsConfig, ExternalCheck, FailureMode, GeneratorCommand, GuardConfig,
    SpecguardConfig, UnitsConfig, WorkspaceConfig, CONFIG_FILE_NAME,
};
pub use error::{ProtocolError, Result};
pub use io::{read_json, read_json_optional, write_json_atomic, write_text_atomic};
pub use progress::{emit, progress_channel, ProgressEvent, ProgressReceiver, ProgressSender};
pub use reports::{
    unix_now_ms, InventoryCounts, InventoryReport, CLASSIFICATION_JSON, CLASSIFICATION_MD,
    FINAL_SUMMARY_MD, GUARD_METRICS_JSON, INVENTORY_JSON, ORCHESTRATOR_REPORT_JSON,
    PRUNE_SUMMARY_JSON, SELF_HEAL_LOG_JSON, USAGE_GRAPH_JSON, VALIDATION_POST_JSON, VALIDATION_PRE_JSON,
    VERIFY_JSON,
};
pub use source::{FileCategory, SourceFile};
