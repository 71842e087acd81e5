use crate::snapshot::{ApiContract, ContractSnapshot};
use crate::{ContractError, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use regex::Regex;
use specguard_protocol::paths::{file_stem, has_dir_prefix, normalize_dir, relative_key, strip_extension};
use specguard_protocol::SpecguardConfig;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", ".next", "dist", "build", "coverage"];

struct ApiPatterns {
    switch_block: Regex,
    case_label: Regex,
    method_compare: Regex,
    export_default: Regex,
    wrapper: Regex,
    schema: Regex,
    bracket_param: Regex,
}

impl ApiPatterns {
    fn compile() -> Result<Self> {
        Ok(Self {
            switch_block: Regex::new(r"switch\s*\(\s*(?:req\.)?method\s*\)\s*\{([\s\S]+?)\n\s*\}")?,
            case_label: Regex::new(r#"case\s+['"](\w+)['"]"#)?,
            method_compare: Regex::new(r#"req\.method\s*(?:===|!==|==|!=)\s*['"](\w+)['"]"#)?,
            export_default: Regex::new(r"export\s+default\s+([\s\S]+?);")?,
            wrapper: Regex::new(r"\bwith[A-Z]\w*")?,
            schema: Regex::new(r"const\s+(\w+Schema)\s*=\s*z\.object\(")?,
            bracket_param: Regex::new(r"\[(\w+)\]")?,
        })
    }
}

/// Captures the contract surface of the current tree for one unit.
pub struct ContractExtractor {
    api_globs: GlobSet,
    type_globs: GlobSet,
    component_globs: GlobSet,
    ignore_globs: GlobSet,
    unit_marker: Regex,
    type_export: Regex,
    api: ApiPatterns,
    api_root: String,
    route_prefix: String,
}

impl ContractExtractor {
    pub fn new(config: &SpecguardConfig) -> Result<Self> {
        let contracts = &config.contracts;
        Ok(Self {
            api_globs: build_globset(&contracts.api_globs)?,
            type_globs: build_globset(&contracts.type_globs)?,
            component_globs: build_globset(&contracts.component_globs)?,
            ignore_globs: build_globset(&contracts.ignore_globs)?,
            unit_marker: Regex::new(&format!(r"(?i){}(\d+)", regex::escape(&contracts.unit_marker)))?,
            type_export: Regex::new(r"export\s+(?:interface|type)\s+(\w+)\s*[={<]")?,
            api: ApiPatterns::compile()?,
            api_root: normalize_dir(&config.workspace.api_root),
            route_prefix: config.workspace.api_route_prefix.trim_end_matches('/').to_string(),
        })
    }

    /// Pure function of the tree under `root`.
    pub fn capture(&self, root: &Path, unit_version: u32) -> Result<ContractSnapshot> {
        let mut apis = BTreeMap::new();
        let mut types = BTreeMap::new();
        let mut components = BTreeMap::new();

        for key in self.candidate_files(root) {
            let is_api = self.api_globs.is_match(&key);
            let is_type = self.type_globs.is_match(&key);
            let is_component = self.component_globs.is_match(&key);
            if !(is_api || is_type || is_component) {
                continue;
            }

            let path = root.join(&key);
            let text = std::fs::read_to_string(&path).map_err(|source| ContractError::Io {
                path: path.clone(),
                source,
            })?;
            if !self.belongs_to_unit(&text, unit_version) {
                log::debug!("Skipping {key}: tagged for another unit");
                continue;
            }

            if is_api {
                if let Some((endpoint, contract)) = self.extract_api(&key, &text) {
                    apis.insert(endpoint, contract);
                }
            }
            if is_type {
                for caps in self.type_export.captures_iter(&text) {
                    if let Some(name) = caps.get(1) {
                        types.insert(name.as_str().to_string(), key.clone());
                    }
                }
            }
            if is_component {
                components.insert(file_stem(&key).to_string(), key.clone());
            }
        }

        log::info!(
            "Captured unit {unit_version} contract: {} apis, {} types, {} components",
            apis.len(),
            types.len(),
            components.len()
        );
        ContractSnapshot::new(unit_version, apis, types, components)
    }

    /// Untagged files belong to every unit.
    pub fn belongs_to_unit(&self, text: &str, unit_version: u32) -> bool {
        match self
            .unit_marker
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
        {
            Some(tagged) => tagged == u64::from(unit_version),
            None => true,
        }
    }

    /// Endpoint contract of one handler; `None` when no method is recognised.
    pub fn extract_api(&self, key: &str, text: &str) -> Option<(String, ApiContract)> {
        let mut methods = BTreeSet::new();
        if let Some(block) = self.api.switch_block.captures(text).and_then(|c| c.get(1)) {
            for caps in self.api.case_label.captures_iter(block.as_str()) {
                if let Some(m) = caps.get(1) {
                    methods.insert(m.as_str().to_uppercase());
                }
            }
        }
        for caps in self.api.method_compare.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                methods.insert(m.as_str().to_uppercase());
            }
        }
        if methods.is_empty() {
            return None;
        }

        let middleware: BTreeSet<String> = self
            .api
            .export_default
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|stmt| {
                self.api
                    .wrapper
                    .find_iter(stmt.as_str())
                    .map(|m| m.as_str().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let mut request_schema_id = None;
        let mut response_schema_id = None;
        for caps in self.api.schema.captures_iter(text) {
            let Some(name) = caps.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if ["Create", "Update", "Request"].iter().any(|tag| name.contains(tag)) {
                request_schema_id = Some(name.to_string());
            } else if name.contains("Response") {
                response_schema_id = Some(name.to_string());
            }
        }

        Some((
            self.endpoint_path(key),
            ApiContract {
                methods,
                middleware,
                request_schema_id,
                response_schema_id,
                file: key.to_string(),
            },
        ))
    }

    /// `src/pages/api/users/[id]/index.ts` → `/api/users/:id`
    pub fn endpoint_path(&self, key: &str) -> String {
        let logical = if has_dir_prefix(key, &self.api_root) {
            format!(
                "{}{}",
                self.route_prefix,
                key.get(self.api_root.len()..).unwrap_or_default()
            )
        } else {
            key.to_string()
        };
        let logical = strip_extension(&logical);
        let logical = self.api.bracket_param.replace_all(logical, ":$1");
        logical
            .strip_suffix("/index")
            .unwrap_or(&logical)
            .to_string()
    }

    fn candidate_files(&self, root: &Path) -> Vec<String> {
        let mut builder = WalkBuilder::new(root);
        builder.hidden(true).git_ignore(true).git_global(false);
        builder.filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name))
        });

        let mut keys: Vec<String> = builder
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Failed to read entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(|entry| relative_key(root, entry.path()))
            .filter(|key| !self.ignore_globs.is_match(key))
            .collect();
        keys.sort();
        keys
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ContractError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ContractError::Glob {
        pattern: patterns.join(", "),
        source,
    })
}
