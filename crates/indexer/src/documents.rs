use specguard_protocol::SourceFile;
use std::path::Path;

const MAX_FILE_SIZE_BYTES: u64 = 1_048_576; // 1 MB

/// A source file together with its text, as consumed by the usage graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub file: SourceFile,
    pub text: String,
}

impl SourceDocument {
    pub fn new(file: SourceFile, text: impl Into<String>) -> Self {
        Self {
            file,
            text: text.into(),
        }
    }
}

/// Read every file's text. Oversized or unreadable files keep their place
/// with empty text so they are still classified.
pub fn load_documents(root: &Path, files: &[SourceFile]) -> Vec<SourceDocument> {
    files
        .iter()
        .map(|file| {
            let path = root.join(&file.path);
            let text = match std::fs::metadata(&path) {
                Ok(meta) if meta.len() > MAX_FILE_SIZE_BYTES => {
                    log::debug!(
                        "Skipping large file {} ({} bytes > {})",
                        file.path,
                        meta.len(),
                        MAX_FILE_SIZE_BYTES
                    );
                    String::new()
                }
                _ => match std::fs::read(&path) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(e) => {
                        log::warn!("Failed to read {}: {e}", file.path);
                        String::new()
                    }
                },
            };
            SourceDocument::new(file.clone(), text)
        })
        .collect()
}
