use crate::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "specguard.toml";

/// Top-level `specguard.toml`. Every field has a default, so an absent file
/// describes the conventional layout of the generated application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecguardConfig {
    pub workspace: WorkspaceConfig,
    pub units: UnitsConfig,
    pub contracts: ContractsConfig,
    pub guard: GuardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// On-disk directory holding request handlers
    pub api_root: String,
    /// Logical route prefix the API root is served under
    pub api_route_prefix: String,
    /// Extension appended to normalized handler paths
    pub api_extension: String,
    pub ui_roots: Vec<String>,
    pub component_roots: Vec<String>,
    pub test_root: String,
    /// `<base>.<suffix>.<ext>` names that count as a test for `<base>`
    pub test_suffixes: Vec<String>,
    pub test_extensions: Vec<String>,
    /// Import alias (e.g. `@/`) and the directory it stands for (e.g. `src/`)
    pub root_alias: String,
    pub alias_target: String,
    pub source_extensions: Vec<String>,
    /// Glob patterns excluded from scanning, matched against root-relative paths
    pub exclude: Vec<String>,
    pub registry_documents: Vec<String>,
    pub reports_dir: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            api_root: "src/pages/api".to_string(),
            api_route_prefix: "/api".to_string(),
            api_extension: "ts".to_string(),
            ui_roots: vec!["src/app".to_string(), "src/pages".to_string()],
            component_roots: vec!["src/components".to_string()],
            test_root: "tests".to_string(),
            test_suffixes: vec!["test".to_string(), "spec".to_string()],
            test_extensions: vec!["ts".to_string(), "tsx".to_string()],
            root_alias: "@/".to_string(),
            alias_target: "src/".to_string(),
            source_extensions: ["ts", "tsx", "js", "jsx", "mjs", "cjs"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            exclude: vec!["**/*.d.ts".to_string()],
            registry_documents: vec![
                "src/config/system-registry.ts".to_string(),
                "src/config/binder-map.json".to_string(),
            ],
            reports_dir: "ops/reports".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitsConfig {
    /// Directory holding specification-unit documents
    pub dir: String,
    /// Ordered unit file names; empty means every `*.md` in `dir`
    pub files: Vec<String>,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            dir: "specs".to_string(),
            files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    pub api_globs: Vec<String>,
    pub type_globs: Vec<String>,
    pub component_globs: Vec<String>,
    pub ignore_globs: Vec<String>,
    /// Tag that pins a file to one unit, e.g. `Binder7`
    pub unit_marker: String,
    pub output_dir: String,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            api_globs: vec!["src/pages/api/**/*.ts".to_string()],
            type_globs: vec!["src/server/services/**/*.ts".to_string()],
            component_globs: vec![
                "src/app/**/*.tsx".to_string(),
                "src/components/**/*.tsx".to_string(),
            ],
            ignore_globs: vec!["**/*.test.*".to_string(), "**/*.spec.*".to_string()],
            unit_marker: "Binder".to_string(),
            output_dir: "ops/contracts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub required_success_rate: u32,
    pub required_mapping_score: u32,
    pub required_artifacts: Vec<String>,
    /// External code generator invoked once per missing entry
    pub generator: Option<GeneratorCommand>,
    pub checks: Vec<ExternalCheck>,
    pub timeout_secs: u64,
    pub min_api_files: usize,
    pub min_ui_files: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            required_success_rate: 95,
            required_mapping_score: 100,
            required_artifacts: vec![
                "src/config/system-registry.ts".to_string(),
                "src/config/binder-map.json".to_string(),
                "src/app/admin/orchestrator-panel.tsx".to_string(),
            ],
            generator: None,
            checks: Vec::new(),
            timeout_secs: 300,
            min_api_files: 1,
            min_ui_files: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A sub-process whose exit status is reported but never gates the release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalCheck {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub on_failure: FailureMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Known pre-existing issues; a non-zero exit reads as ADVISORY
    Advisory,
    #[default]
    Fail,
}

impl SpecguardConfig {
    /// Load `explicit` or `<root>/specguard.toml`. A missing default file
    /// yields defaults; a missing explicit file is an error.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) if path.is_absolute() => (path.to_path_buf(), true),
            Some(path) => (root.join(path), true),
            None => (root.join(CONFIG_FILE_NAME), false),
        };

        if !path.exists() {
            if required {
                return Err(ProtocolError::Other(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            log::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| ProtocolError::io(&path, e))?;
        Self::from_toml(&raw).map_err(|source| ProtocolError::Config { path, source })
    }

    pub fn from_toml(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn reports_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.workspace.reports_dir)
    }

    pub fn report_path(&self, root: &Path, name: &str) -> PathBuf {
        self.reports_dir(root).join(name)
    }

    pub fn contracts_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.contracts.output_dir)
    }
}
