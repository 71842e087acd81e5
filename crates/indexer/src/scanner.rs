use crate::{IndexerError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use specguard_protocol::paths::{extension, has_dir_prefix, normalize_dir, relative_key};
use specguard_protocol::{FileCategory, SourceFile, WorkspaceConfig};
use std::path::{Path, PathBuf};

/// Result of one walk: categorized sources plus the test files found under
/// the test root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub files: Vec<SourceFile>,
    pub tests: Vec<String>,
}

/// Walks an application tree and sorts every source file into a category
pub struct SourceScanner {
    root: PathBuf,
    layout: Layout,
    extensions: Vec<String>,
    exclude: GlobSet,
}

#[derive(Debug, Clone)]
struct Layout {
    api_root: String,
    ui_roots: Vec<String>,
    component_roots: Vec<String>,
    test_root: String,
}

impl SourceScanner {
    pub fn new(root: impl AsRef<Path>, config: &WorkspaceConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(IndexerError::InvalidRoot(root.display().to_string()));
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            let glob = Glob::new(pattern).map_err(|source| IndexerError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let exclude = builder.build().map_err(|source| IndexerError::InvalidGlob {
            pattern: config.exclude.join(", "),
            source,
        })?;

        Ok(Self {
            root,
            layout: Layout {
                api_root: normalize_dir(&config.api_root),
                ui_roots: config.ui_roots.iter().map(|d| normalize_dir(d)).collect(),
                component_roots: config
                    .component_roots
                    .iter()
                    .map(|d| normalize_dir(d))
                    .collect(),
                test_root: normalize_dir(&config.test_root),
            },
            extensions: config
                .source_extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the tree (.gitignore aware). Output is sorted by path.
    pub fn scan(&self) -> ScanResult {
        let mut result = ScanResult::default();

        let root = self.root.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true);
        builder.filter_entry(move |entry| !is_ignored_scope(entry.path(), &root));

        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Failed to read entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Some(key) = relative_key(&self.root, entry.path()) else {
                continue;
            };
            if !self.is_source_key(&key) {
                continue;
            }
            if self.exclude.is_match(&key) {
                log::debug!("Skipping excluded file {key}");
                continue;
            }

            if self.is_test_key(&key) {
                result.tests.push(key);
            } else {
                let category = self.categorize(&key);
                result.files.push(SourceFile::new(key, category));
            }
        }

        result.files.sort();
        result.tests.sort();
        log::info!(
            "Found {} source files and {} test files",
            result.files.len(),
            result.tests.len()
        );
        result
    }

    /// The API root sits inside a UI root in the default layout, so it is
    /// checked first.
    pub fn categorize(&self, key: &str) -> FileCategory {
        let layout = &self.layout;
        if has_dir_prefix(key, &layout.api_root) {
            return FileCategory::Api;
        }
        if layout
            .component_roots
            .iter()
            .any(|dir| has_dir_prefix(key, dir))
        {
            return FileCategory::Component;
        }
        if layout.ui_roots.iter().any(|dir| has_dir_prefix(key, dir)) {
            return FileCategory::Ui;
        }
        FileCategory::Other
    }

    fn is_test_key(&self, key: &str) -> bool {
        !self.layout.test_root.is_empty() && has_dir_prefix(key, &self.layout.test_root)
    }

    fn is_source_key(&self, key: &str) -> bool {
        extension(key)
            .map(|ext| ext.to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|candidate| candidate == &ext))
    }
}

fn is_ignored_scope(path: &Path, root: &Path) -> bool {
    if let Ok(relative) = path.strip_prefix(root) {
        for component in relative.components() {
            if let std::path::Component::Normal(name) = component {
                let lowered = name.to_string_lossy().to_lowercase();
                if IGNORED_SCOPES.iter().any(|ignored| ignored == &lowered) {
                    return true;
                }
            }
        }
    }
    false
}

const IGNORED_SCOPES: &[&str] = &[
    // VCS / tooling
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".husky",
    ".yarn",
    // caches / builds
    ".cache",
    "node_modules",
    ".next",
    ".turbo",
    ".vercel",
    ".output",
    "build",
    "dist",
    "out",
    "coverage",
    "storybook-static",
];
