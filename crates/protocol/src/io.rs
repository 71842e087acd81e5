use crate::{ProtocolError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Serialize `value` as pretty JSON and replace `path` atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| ProtocolError::json(path, e))?;
    write_bytes_atomic(path, &bytes)
}

pub fn write_text_atomic(path: &Path, text: &str) -> Result<()> {
    write_bytes_atomic(path, text.as_bytes())
}

fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ProtocolError::io(parent, e))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|e| ProtocolError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| ProtocolError::io(path, e))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| ProtocolError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ProtocolError::json(path, e))
}

/// `Ok(None)` when the file is absent; a present but corrupt file is an error.
pub fn read_json_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read_json(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_overwrites_and_leaves_no_tmp() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("reports").join("usage_graph.json");

        let mut first = BTreeMap::new();
        first.insert("a", 1);
        write_json_atomic(&path, &first).unwrap();

        let mut second = BTreeMap::new();
        second.insert("b", 2);
        write_json_atomic(&path, &second).unwrap();

        let loaded: BTreeMap<String, i32> = read_json(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["b"], 2);
        assert!(!temp.path().join("reports").join("usage_graph.json.tmp").exists());
    }

    #[test]
    fn optional_read_distinguishes_absent_from_corrupt() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing.json");
        let absent: Option<Vec<u32>> = read_json_optional(&path).unwrap();
        assert!(absent.is_none());

        fs::write(&path, b"{not json").unwrap();
        assert!(read_json_optional::<Vec<u32>>(&path).is_err());
    }
}
