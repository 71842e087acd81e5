use crate::entry::{
    DocumentPattern, HttpMethod, ParseWarning, ParsedUnit, SectionField, SpecificationEntry,
};
use crate::normalize::PathNormalizer;
use crate::Result;
use regex::Regex;

const METHODS: &str = "GET|POST|PUT|PATCH|DELETE";

/// Extracts entries from a document already known to be of one pattern.
pub trait UnitParser: Send + Sync {
    fn pattern(&self) -> DocumentPattern;

    fn parse(&self, text: &str, normalizer: &PathNormalizer) -> ParsedUnit;
}

pub struct DirectParser {
    heading: Regex,
    family: Regex,
}

impl DirectParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading: Regex::new(&format!(r"(?mi)^###[ \t]+API[ \t]+({METHODS})[ \t]+(/\S*)"))?,
            family: Regex::new(r"(?mi)^###[ \t]+API\b")?,
        })
    }

    fn matches(&self, text: &str) -> bool {
        self.heading.is_match(text)
    }
}

impl UnitParser for DirectParser {
    fn pattern(&self) -> DocumentPattern {
        DocumentPattern::Direct
    }

    fn parse(&self, text: &str, normalizer: &PathNormalizer) -> ParsedUnit {
        let family_starts: Vec<usize> = self.family.find_iter(text).map(|m| m.start()).collect();
        let mut entries = Vec::new();

        for caps in self.heading.captures_iter(text) {
            let (Some(whole), Some(method), Some(route)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let Some(method) = HttpMethod::parse(method.as_str()) else {
                continue;
            };
            let body_start = line_end(text, whole.end());
            let body_end = family_starts
                .iter()
                .copied()
                .find(|start| *start > whole.start())
                .unwrap_or(text.len());
            let body = text.get(body_start..body_end).unwrap_or_default();

            entries.push(SpecificationEntry {
                method,
                path: normalizer.normalize(route.as_str()),
                route: normalizer.clean_route(route.as_str()),
                body_text: body.trim().to_string(),
                pattern: DocumentPattern::Direct,
                number: None,
            });
        }

        ParsedUnit {
            pattern: DocumentPattern::Direct,
            entries,
            warnings: Vec::new(),
        }
    }
}

pub struct NumberedParser {
    heading: Regex,
    method: Regex,
    path: Regex,
}

impl NumberedParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading: Regex::new(r"(?mi)^###[ \t]+API[ \t]+(\d{5,})\b")?,
            method: Regex::new(&format!(
                r"(?i)\*{{0,2}}Method\*{{0,2}}[ \t]*:[ \t]*\*{{0,2}}[ \t]*`?({METHODS})\b"
            ))?,
            path: Regex::new(r"(?i)\*{0,2}Path\*{0,2}[ \t]*:[ \t]*\*{0,2}[ \t]*`?(/[^\s`*]+)")?,
        })
    }

    fn matches(&self, text: &str) -> bool {
        self.heading.is_match(text)
    }
}

impl UnitParser for NumberedParser {
    fn pattern(&self) -> DocumentPattern {
        DocumentPattern::Numbered
    }

    fn parse(&self, text: &str, normalizer: &PathNormalizer) -> ParsedUnit {
        let headings: Vec<(usize, usize, String)> = self
            .heading
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let number = caps.get(1)?;
                Some((whole.start(), whole.end(), number.as_str().to_string()))
            })
            .collect();

        let mut entries = Vec::new();
        let mut warnings = Vec::new();

        for (idx, (start, heading_end, number)) in headings.iter().enumerate() {
            let section_end = headings
                .get(idx + 1)
                .map(|(next, _, _)| *next)
                .unwrap_or(text.len());
            let section = text.get(*start..section_end).unwrap_or_default();
            let body = text
                .get(line_end(text, *heading_end)..section_end)
                .unwrap_or_default();

            let method = self
                .method
                .captures(section)
                .and_then(|caps| caps.get(1))
                .and_then(|m| HttpMethod::parse(m.as_str()));
            let route = self
                .path
                .captures(section)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string());

            match (method, route) {
                (Some(method), Some(route)) => entries.push(SpecificationEntry {
                    method,
                    path: normalizer.normalize(&route),
                    route: normalizer.clean_route(&route),
                    body_text: body.trim().to_string(),
                    pattern: DocumentPattern::Numbered,
                    number: Some(number.clone()),
                }),
                (method, route) => {
                    let mut missing = Vec::new();
                    if method.is_none() {
                        missing.push(SectionField::Method);
                    }
                    if route.is_none() {
                        missing.push(SectionField::Path);
                    }
                    let warning = ParseWarning::IncompleteSection {
                        number: number.clone(),
                        missing,
                    };
                    log::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }

        ParsedUnit {
            pattern: DocumentPattern::Numbered,
            entries,
            warnings,
        }
    }
}

pub struct NarrativeParser;

impl UnitParser for NarrativeParser {
    fn pattern(&self) -> DocumentPattern {
        DocumentPattern::Narrative
    }

    fn parse(&self, _text: &str, _normalizer: &PathNormalizer) -> ParsedUnit {
        ParsedUnit::narrative()
    }
}

/// Sniffs the document pattern and dispatches to the matching parser.
pub struct SpecParser {
    normalizer: PathNormalizer,
    direct: DirectParser,
    numbered: NumberedParser,
    narrative: NarrativeParser,
}

impl SpecParser {
    pub fn new(normalizer: PathNormalizer) -> Result<Self> {
        Ok(Self {
            normalizer,
            direct: DirectParser::new()?,
            numbered: NumberedParser::new()?,
            narrative: NarrativeParser,
        })
    }

    pub fn normalizer(&self) -> &PathNormalizer {
        &self.normalizer
    }

    /// Direct headings win over numbered ones; anything else is narrative.
    pub fn detect(&self, text: &str) -> DocumentPattern {
        if self.direct.matches(text) {
            DocumentPattern::Direct
        } else if self.numbered.matches(text) {
            DocumentPattern::Numbered
        } else {
            DocumentPattern::Narrative
        }
    }

    pub fn parser_for(&self, pattern: DocumentPattern) -> &dyn UnitParser {
        match pattern {
            DocumentPattern::Direct => &self.direct,
            DocumentPattern::Numbered => &self.numbered,
            DocumentPattern::Narrative => &self.narrative,
        }
    }

    pub fn parse(&self, text: &str) -> ParsedUnit {
        let pattern = self.detect(text);
        self.parser_for(pattern).parse(text, &self.normalizer)
    }
}

fn line_end(text: &str, from: usize) -> usize {
    text.get(from..)
        .and_then(|rest| rest.find('\n'))
        .map(|idx| from + idx + 1)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use specguard_protocol::WorkspaceConfig;

    fn parser() -> SpecParser {
        let normalizer = PathNormalizer::from_workspace(&WorkspaceConfig::default()).unwrap();
        SpecParser::new(normalizer).unwrap()
    }

    const DIRECT: &str = "\
# Unit 4

### API GET /api/v1/users
List users.

### API post /api/users/{id}/roles
Assign a role.
Body: { role }

### API Notes
Shared notes, not an endpoint.

### API DELETE /api/users/{id}
";

    const NUMBERED: &str = "\
### API 10001
**Method**: POST
**Path**: /api/orders

### API 10002
Method: get
Path: `/api/orders/{orderId}`

### API 10003
**Method**: DELETE
No path given here.
";

    #[test]
    fn detects_patterns_in_precedence_order() {
        let p = parser();
        assert_eq!(p.detect(DIRECT), DocumentPattern::Direct);
        assert_eq!(p.detect(NUMBERED), DocumentPattern::Numbered);
        assert_eq!(
            p.detect(&format!("{NUMBERED}\n### API PUT /api/x\n")),
            DocumentPattern::Direct
        );
        assert_eq!(
            p.detect("# Overview\nThe billing domain.\n### API 123\n"),
            DocumentPattern::Narrative
        );
    }

    #[test]
    fn direct_bodies_stop_at_next_api_heading() {
        let unit = parser().parse(DIRECT);
        assert_eq!(unit.pattern, DocumentPattern::Direct);
        assert_eq!(unit.entries.len(), 3);

        let first = &unit.entries[0];
        assert_eq!(first.method, HttpMethod::Get);
        assert_eq!(first.path, "src/pages/api/users.ts");
        assert_eq!(first.route, "/api/v1/users");
        assert_eq!(first.body_text, "List users.");

        let second = &unit.entries[1];
        assert_eq!(second.method, HttpMethod::Post);
        assert_eq!(second.path, "src/pages/api/users/[id]/roles.ts");
        assert_eq!(second.body_text, "Assign a role.\nBody: { role }");

        assert_eq!(unit.entries[2].body_text, "");
    }

    #[test]
    fn numbered_sections_need_both_fields() {
        let unit = parser().parse(NUMBERED);
        assert_eq!(unit.pattern, DocumentPattern::Numbered);
        assert_eq!(unit.entries.len(), 2);
        assert_eq!(unit.entries[0].number.as_deref(), Some("10001"));
        assert_eq!(unit.entries[0].path, "src/pages/api/orders.ts");
        assert_eq!(unit.entries[1].method, HttpMethod::Get);
        assert_eq!(unit.entries[1].path, "src/pages/api/orders/[orderId].ts");
        assert_eq!(
            unit.warnings,
            vec![ParseWarning::IncompleteSection {
                number: "10003".to_string(),
                missing: vec![SectionField::Path],
            }]
        );
        assert_eq!(
            unit.warnings[0].to_string(),
            "section 10003 dropped: missing Path"
        );
    }

    #[test]
    fn narrative_documents_yield_nothing() {
        let unit = parser().parse("# Contract\nPlain prose about invoices.\n");
        assert!(unit.is_narrative());
        assert!(unit.entries.is_empty());
        assert!(unit.warnings.is_empty());
    }

    #[test]
    fn entries_serialize_with_camel_case_fields() {
        let unit = parser().parse(NUMBERED);
        let json = serde_json::to_value(&unit.entries[0]).unwrap();
        assert_eq!(json["method"], "POST");
        assert_eq!(json["bodyText"], "**Method**: POST\n**Path**: /api/orders");
        assert_eq!(json["pattern"], "numbered");
    }
}
