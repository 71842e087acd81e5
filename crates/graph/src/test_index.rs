use specguard_protocol::paths::{file_name, file_stem};
use specguard_protocol::WorkspaceConfig;
use std::collections::HashMap;

/// Test files keyed by file name, for `<base>.<suffix>.<ext>` lookups.
#[derive(Debug, Clone, Default)]
pub struct TestIndex {
    by_name: HashMap<String, String>,
    suffixes: Vec<String>,
    extensions: Vec<String>,
}

impl TestIndex {
    pub fn new(tests: &[String], config: &WorkspaceConfig) -> Self {
        let mut by_name = HashMap::new();
        for path in tests {
            by_name
                .entry(file_name(path).to_string())
                .or_insert_with(|| path.clone());
        }
        Self {
            by_name,
            suffixes: config.test_suffixes.clone(),
            extensions: config
                .test_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
        }
    }

    /// The test covering `file`, if any.
    pub fn test_for(&self, file: &str) -> Option<&str> {
        let stem = file_stem(file);
        if stem.is_empty() {
            return None;
        }
        for suffix in &self.suffixes {
            for ext in &self.extensions {
                if let Some(path) = self.by_name.get(&format!("{stem}.{suffix}.{ext}")) {
                    return Some(path.as_str());
                }
            }
        }
        None
    }
}
