//! # specguard contracts
//!
//! Captures the observable API surface of one unit revision and compares two
//! revisions.
//!
//! A [`ContractSnapshot`] maps endpoints to methods, middleware and schema ids,
//! exported type names to their defining file, and component names to theirs.
//! [`diff`] sorts every difference into breaking, additive, unchanged or
//! removed, then rolls the result up into a [`ContractStatus`].

mod diff;
mod error;
mod extract;
mod snapshot;
mod tasks;

pub use diff::{
    diff, diff_apis, diff_components, diff_types, Breaking, ContractChange, ContractDiff,
    ContractStatus, DimensionDiff,
};
pub use error::{ContractError, Result};
pub use extract::ContractExtractor;
pub use snapshot::{snapshot_path, ApiContract, ContractSnapshot, SNAPSHOT_SCHEMA_VERSION};
pub use tasks::reconciliation_tasks;
