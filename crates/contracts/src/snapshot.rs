use crate::{ContractError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use specguard_protocol::{read_json_optional, write_json_atomic};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Observable surface of one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContract {
    pub methods: BTreeSet<String>,
    pub middleware: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_schema_id: Option<String>,
    pub file: String,
}

/// Contract of one unit revision. Carries no timestamp, so capturing the
/// same tree twice yields identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSnapshot {
    pub unit_version: u32,
    pub schema_version: u32,
    pub fingerprint: String,
    pub apis: BTreeMap<String, ApiContract>,
    pub types: BTreeMap<String, String>,
    pub components: BTreeMap<String, String>,
}

impl ContractSnapshot {
    pub fn new(
        unit_version: u32,
        apis: BTreeMap<String, ApiContract>,
        types: BTreeMap<String, String>,
        components: BTreeMap<String, String>,
    ) -> Result<Self> {
        let fingerprint = fingerprint(&apis, &types, &components)?;
        Ok(Self {
            unit_version,
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            fingerprint,
            apis,
            types,
            components,
        })
    }

    /// Recompute the fingerprint and compare with the stored one.
    pub fn verify_fingerprint(&self) -> Result<bool> {
        Ok(fingerprint(&self.apis, &self.types, &self.components)? == self.fingerprint)
    }

    pub fn save(&self, contracts_dir: &Path) -> Result<PathBuf> {
        let path = snapshot_path(contracts_dir, self.unit_version);
        write_json_atomic(&path, self)?;
        Ok(path)
    }

    pub fn load(contracts_dir: &Path, unit_version: u32) -> Result<Self> {
        let path = snapshot_path(contracts_dir, unit_version);
        let snapshot: Self = read_json_optional(&path)?.ok_or_else(|| ContractError::MissingSnapshot {
            version: unit_version,
            path: path.clone(),
        })?;
        if !snapshot.verify_fingerprint()? {
            log::warn!("Snapshot {} fingerprint does not match its content", path.display());
        }
        Ok(snapshot)
    }
}

pub fn snapshot_path(contracts_dir: &Path, unit_version: u32) -> PathBuf {
    contracts_dir.join(format!("unit{unit_version}-snapshot.json"))
}

/// SHA-256 over the canonical JSON of the three maps.
fn fingerprint(
    apis: &BTreeMap<String, ApiContract>,
    types: &BTreeMap<String, String>,
    components: &BTreeMap<String, String>,
) -> Result<String> {
    let canonical = serde_json::to_vec(&(apis, types, components))?;
    let digest = Sha256::digest(&canonical);
    Ok(format!("{digest:x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn api(methods: &[&str], middleware: &[&str]) -> ApiContract {
        ApiContract {
            methods: methods.iter().map(|m| m.to_string()).collect(),
            middleware: middleware.iter().map(|m| m.to_string()).collect(),
            request_schema_id: None,
            response_schema_id: None,
            file: "src/pages/api/x.ts".to_string(),
        }
    }

    #[test]
    fn fingerprint_depends_only_on_content() {
        let mut apis = BTreeMap::new();
        apis.insert("/api/x".to_string(), api(&["POST", "GET"], &["withAuth"]));
        let a = ContractSnapshot::new(3, apis.clone(), BTreeMap::new(), BTreeMap::new()).unwrap();
        let b = ContractSnapshot::new(4, apis, BTreeMap::new(), BTreeMap::new()).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.fingerprint.len(), 64);

        let mut other = BTreeMap::new();
        other.insert("/api/x".to_string(), api(&["GET"], &["withAuth"]));
        let c = ContractSnapshot::new(3, other, BTreeMap::new(), BTreeMap::new()).unwrap();
        assert_ne!(a.fingerprint, c.fingerprint);
    }

    #[test]
    fn save_and_load_by_unit_version() {
        let temp = tempdir().unwrap();
        let mut types = BTreeMap::new();
        types.insert("Invoice".to_string(), "src/server/services/billing.ts".to_string());
        let snapshot = ContractSnapshot::new(7, BTreeMap::new(), types, BTreeMap::new()).unwrap();

        let path = snapshot.save(temp.path()).unwrap();
        assert!(path.ends_with("unit7-snapshot.json"));
        let loaded = ContractSnapshot::load(temp.path(), 7).unwrap();
        assert_eq!(loaded, snapshot);
        assert!(loaded.verify_fingerprint().unwrap());
    }

    #[test]
    fn missing_snapshot_names_the_path() {
        let temp = tempdir().unwrap();
        let err = ContractSnapshot::load(temp.path(), 2).unwrap_err();
        assert!(err.to_string().contains("unit2-snapshot.json"));
    }
}
