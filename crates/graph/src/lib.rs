//! # specguard graph
//!
//! Static reachability over the generated application.
//!
//! ```text
//! SourceDocument[]
//!     │
//!     ├──> UsageGraphBuilder (literal imports + UI fetch targets)
//!     │      └─ UsageGraph (petgraph: Imports / Fetches edges)
//!     │
//!     └──> Classifier
//!            ├─ imported     (any path variant referenced)
//!            ├─ fetched      (API route called from UI)
//!            ├─ in_registry  (StaticRegistry mention)
//!            └─ tested       (TestIndex hit)
//!
//! ClassificationReport ──> prune (dry run unless asked to delete)
//! ```

mod builder;
mod classify;
mod error;
mod graph;
mod pipeline;
mod prune;
mod registry;
mod test_index;
mod types;
mod variants;

pub use builder::UsageGraphBuilder;
pub use classify::{
    classify_all, percent, ClassificationReport, ClassificationStats, ClassificationVerdict,
    Classifier, Reason,
};
pub use error::{GraphError, Result};
pub use pipeline::{run_classification, ClassificationOutcome, UsageGraphReport};
pub use prune::{read_classification, run_prune, PruneFailure, PrunePlan, PruneSummary};
pub use registry::StaticRegistry;
pub use test_index::TestIndex;
pub use types::{FileNode, NodeKind, Relationship, UsageEdge, UsageGraph};
pub use variants::PathRules;
