use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a scanned file lives in the application layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Request handler under the API root
    Api,
    /// Page or route module
    Ui,
    /// Shared UI component
    Component,
    /// Everything else with a source extension (services, lib, middleware)
    Other,
}

impl FileCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            FileCategory::Api => "api",
            FileCategory::Ui => "ui",
            FileCategory::Component => "component",
            FileCategory::Other => "other",
        }
    }

    /// UI-facing files are the only ones whose network calls are indexed.
    pub const fn is_ui_facing(self) -> bool {
        matches!(self, FileCategory::Ui | FileCategory::Component)
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file found by the scanner. `path` is root-relative with `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub category: FileCategory,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, category: FileCategory) -> Self {
        Self {
            path: path.into(),
            category,
        }
    }
}
