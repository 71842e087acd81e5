use crate::types::{NodeKind, Relationship, UsageGraph};
use crate::variants::PathRules;
use crate::Result;
use regex::Regex;
use specguard_indexer::SourceDocument;
use specguard_protocol::WorkspaceConfig;

/// Literal reference forms recognised in source text.
struct ReferencePatterns {
    imports: Vec<Regex>,
    fetches: Vec<Regex>,
}

impl ReferencePatterns {
    fn compile() -> Result<Self> {
        Ok(Self {
            imports: vec![
                // import x from '..' / import { a } from '..' / import '..'
                Regex::new(r#"\bimport\s+(?:[\w\s{},*$]+?\s+from\s+)?['"]([^'"\n]+)['"]"#)?,
                // export { a } from '..' / export * from '..'
                Regex::new(
                    r#"\bexport\s+(?:type\s+)?(?:\*(?:\s+as\s+\w+)?|\{[^}]*\})\s*from\s+['"]([^'"\n]+)['"]"#,
                )?,
                Regex::new(r#"\bimport\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#)?,
                Regex::new(r#"\brequire\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#)?,
            ],
            fetches: vec![
                Regex::new(r#"\bfetch\s*\(\s*['"`]([^'"`\n]+)['"`]"#)?,
                Regex::new(r#"\baxios\.\w+\s*\(\s*['"`]([^'"`\n]+)['"`]"#)?,
            ],
        })
    }

    /// Captures of every pattern, ordered by position in `text`.
    fn collect(patterns: &[Regex], text: &str) -> Vec<String> {
        let mut hits: Vec<(usize, String)> = patterns
            .iter()
            .flat_map(|re| re.captures_iter(text))
            .filter_map(|caps| caps.get(1).map(|m| (m.start(), m.as_str().to_string())))
            .collect();
        hits.sort_by_key(|(pos, _)| *pos);
        hits.into_iter().map(|(_, value)| value).collect()
    }
}

/// Builds the usage graph from file text. Only string literals count;
/// computed specifiers and templated URLs are invisible to it.
pub struct UsageGraphBuilder {
    rules: PathRules,
    patterns: ReferencePatterns,
}

impl UsageGraphBuilder {
    pub fn new(config: &WorkspaceConfig) -> Result<Self> {
        Ok(Self {
            rules: PathRules::from_workspace(config),
            patterns: ReferencePatterns::compile()?,
        })
    }

    pub fn rules(&self) -> &PathRules {
        &self.rules
    }

    pub fn build(&self, documents: &[SourceDocument]) -> UsageGraph {
        let mut graph = UsageGraph::new();

        for doc in documents {
            graph.ensure_node(&doc.file.path, NodeKind::Source(doc.file.category));
        }

        let mut import_count = 0usize;
        let mut fetch_count = 0usize;
        for doc in documents {
            let from = graph.ensure_node(&doc.file.path, NodeKind::Source(doc.file.category));

            for specifier in ReferencePatterns::collect(&self.patterns.imports, &doc.text) {
                let key = self.rules.resolve(&doc.file.path, &specifier);
                if key.is_empty() {
                    continue;
                }
                let to = graph.ensure_node(&key, NodeKind::Module);
                graph.add_edge(from, to, Relationship::Imports);
                import_count += 1;
            }

            if !doc.file.category.is_ui_facing() {
                continue;
            }
            for target in ReferencePatterns::collect(&self.patterns.fetches, &doc.text) {
                if !self.is_endpoint_literal(&target) {
                    continue;
                }
                let to = graph.ensure_node(&target, NodeKind::Endpoint);
                graph.add_edge(from, to, Relationship::Fetches);
                fetch_count += 1;
            }
        }

        log::info!(
            "Usage graph: {} nodes, {} imports, {} fetches",
            graph.node_count(),
            import_count,
            fetch_count
        );
        graph
    }

    fn is_endpoint_literal(&self, target: &str) -> bool {
        if target.contains("${") {
            return false;
        }
        let prefix = self.rules.route_prefix();
        target == prefix
            || target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use specguard_protocol::{FileCategory, SourceFile};

    fn doc(path: &str, category: FileCategory, text: &str) -> SourceDocument {
        SourceDocument::new(SourceFile::new(path, category), text)
    }

    fn builder() -> UsageGraphBuilder {
        UsageGraphBuilder::new(&WorkspaceConfig::default()).unwrap()
    }

    #[test]
    fn recognises_every_literal_import_form() {
        let text = r#"
import React from 'react';
import { db, type Tx } from "@/lib/db";
import {
  Card,
  CardBody,
} from '../components/Card';
import './styles.css';
export { helper } from './helper';
export * from "@/lib/format";
const Chart = dynamic(() => import('@/components/Chart'));
const legacy = require('../lib/legacy');
const computed = import(moduleName);
"#;
        let graph = builder().build(&[doc("src/app/page.tsx", FileCategory::Ui, text)]);
        assert_eq!(
            graph.imports()["src/app/page.tsx"],
            vec![
                "react",
                "src/lib/db",
                "src/components/Card",
                "src/app/styles.css",
                "src/app/helper",
                "src/lib/format",
                "src/components/Chart",
                "src/lib/legacy",
            ]
        );
    }

    #[test]
    fn fetches_only_from_ui_facing_files() {
        let ui = r#"
const a = await fetch('/api/users');
const b = await fetch(`/api/users/${id}`);
const c = await axios.post("/api/orders?draft=1", body);
const d = await fetch('https://example.com/api/x');
"#;
        let api = "await fetch('/api/internal');";
        let graph = builder().build(&[
            doc("src/app/users/page.tsx", FileCategory::Ui, ui),
            doc("src/pages/api/proxy.ts", FileCategory::Api, api),
        ]);
        let fetches = graph.ui_fetches();
        assert_eq!(
            fetches["src/app/users/page.tsx"],
            vec!["/api/users", "/api/orders?draft=1"]
        );
        assert!(!fetches.contains_key("src/pages/api/proxy.ts"));
    }

    #[test]
    fn scanned_files_keep_source_kind_when_imported_by_full_key() {
        let graph = builder().build(&[
            doc("src/app/page.tsx", FileCategory::Ui, "import x from './util.ts';"),
            doc("src/app/util.ts", FileCategory::Other, ""),
        ]);
        let idx = graph.find_node("src/app/util.ts").unwrap();
        assert_eq!(
            graph.get_node(idx).unwrap().kind,
            NodeKind::Source(FileCategory::Other)
        );
        assert_eq!(graph.importers_of("src/app/util.ts"), vec!["src/app/page.tsx"]);
    }
}
