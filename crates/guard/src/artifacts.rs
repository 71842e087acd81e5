use crate::Result;
use serde_json::json;
use specguard_protocol::{write_json_atomic, write_text_atomic};
use std::collections::BTreeMap;
use std::path::Path;

const REGISTRY_PLACEHOLDER: &str = "export const registry = { features: {}, toggles: {} };\n";
const PANEL_PLACEHOLDER: &str =
    "export default function Panel() {\n  return <div>Orchestrator Admin</div>;\n}\n";

/// Existence of each required artifact, keyed by its configured path.
pub fn artifact_presence(root: &Path, required: &[String]) -> BTreeMap<String, bool> {
    required
        .iter()
        .map(|rel| (rel.clone(), root.join(rel).is_file()))
        .collect()
}

/// Write placeholders for exactly the missing artifacts. Returns what was
/// written; existing files are never touched.
pub fn ensure_artifacts(root: &Path, required: &[String], unit_names: &[String]) -> Result<Vec<String>> {
    let mut written = Vec::new();
    for rel in required {
        let path = root.join(rel);
        if path.is_file() {
            continue;
        }
        if rel.ends_with(".json") {
            write_json_atomic(&path, &json!({ "units": unit_names }))?;
        } else if rel.ends_with(".tsx") {
            write_text_atomic(&path, PANEL_PLACEHOLDER)?;
        } else {
            write_text_atomic(&path, REGISTRY_PLACEHOLDER)?;
        }
        log::info!("Regenerated missing artifact {rel}");
        written.push(rel.clone());
    }
    Ok(written)
}
