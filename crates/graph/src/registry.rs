use specguard_protocol::paths::file_stem;
use std::path::Path;

#[derive(Debug, Clone)]
struct RegistryDocument {
    path: String,
    text: String,
}

/// Hand-maintained registry/config documents, read once per run. A file is
/// "in the registry" when one of them mentions its base name or full path.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    documents: Vec<RegistryDocument>,
}

impl StaticRegistry {
    /// Missing documents are skipped; they simply mention nothing.
    pub fn load(root: &Path, documents: &[String]) -> Self {
        let mut loaded = Vec::new();
        for rel in documents {
            match std::fs::read_to_string(root.join(rel)) {
                Ok(text) => loaded.push(RegistryDocument {
                    path: rel.clone(),
                    text,
                }),
                Err(e) => log::debug!("Registry document {rel} unavailable: {e}"),
            }
        }
        log::debug!("Loaded {} registry documents", loaded.len());
        Self { documents: loaded }
    }

    pub fn from_documents<I, P, T>(documents: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        Self {
            documents: documents
                .into_iter()
                .map(|(path, text)| RegistryDocument {
                    path: path.into(),
                    text: text.into(),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Path of the first document mentioning `file`.
    pub fn mention_of(&self, file: &str) -> Option<&str> {
        let stem = file_stem(file);
        self.documents
            .iter()
            .find(|doc| (!stem.is_empty() && doc.text.contains(stem)) || doc.text.contains(file))
            .map(|doc| doc.path.as_str())
    }
}
