//! # specguard indexer
//!
//! Walks the generated application and produces the categorized inventory
//! every later stage starts from.
//!
//! ```text
//! Directory
//!     │
//!     ├──> SourceScanner (.gitignore aware, exclusion globs)
//!     │      └─> api / ui / component / other + tests
//!     │
//!     └──> inventory.json
//! ```

mod documents;
mod error;
mod inventory;
mod scanner;

pub use documents::{load_documents, SourceDocument};
pub use error::{IndexerError, Result};
pub use inventory::{read_inventory, run_inventory};
pub use scanner::{ScanResult, SourceScanner};
