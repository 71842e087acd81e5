use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the three document shapes a unit was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentPattern {
    /// `### API <METHOD> <path>` headings
    Direct,
    /// `### API <number>` sections carrying `Method` and `Path` fields
    Numbered,
    /// Prose only; nothing to generate
    Narrative,
}

impl DocumentPattern {
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentPattern::Direct => "direct",
            DocumentPattern::Numbered => "numbered",
            DocumentPattern::Narrative => "narrative",
        }
    }
}

impl fmt::Display for DocumentPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
    ];

    /// Case-insensitive lookup.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One endpoint a unit asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificationEntry {
    pub method: HttpMethod,
    /// Normalized on-disk handler path
    pub path: String,
    /// Route as written in the document
    pub route: String,
    pub body_text: String,
    pub pattern: DocumentPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionField {
    Method,
    Path,
}

impl fmt::Display for SectionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionField::Method => f.write_str("Method"),
            SectionField::Path => f.write_str("Path"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// A numbered section lacked a field and produced no entry.
    IncompleteSection {
        number: String,
        missing: Vec<SectionField>,
    },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::IncompleteSection { number, missing } => {
                let fields: Vec<String> = missing.iter().map(|m| m.to_string()).collect();
                write!(
                    f,
                    "section {number} dropped: missing {}",
                    fields.join(", ")
                )
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedUnit {
    pub pattern: DocumentPattern,
    pub entries: Vec<SpecificationEntry>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedUnit {
    pub fn narrative() -> Self {
        Self {
            pattern: DocumentPattern::Narrative,
            entries: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn is_narrative(&self) -> bool {
        self.pattern == DocumentPattern::Narrative
    }
}
