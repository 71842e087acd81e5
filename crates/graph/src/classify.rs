use crate::registry::StaticRegistry;
use crate::test_index::TestIndex;
use crate::types::UsageGraph;
use crate::variants::PathRules;
use serde::{Deserialize, Serialize};
use specguard_protocol::{
    emit, unix_now_ms, FileCategory, ProgressEvent, ProgressSender, SourceFile,
};
use std::collections::{BTreeMap, BTreeSet};

const MAX_REPORTED_IMPORTERS: usize = 5;

/// Evidence behind a verdict. Serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reason {
    Imported { by: Vec<String> },
    Fetched { by: Vec<String> },
    InRegistry { file: String },
    Tested { test_file: String },
    NoReferences { detail: String },
}

impl Reason {
    pub fn is_signal(&self) -> bool {
        !matches!(self, Reason::NoReferences { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Reason::Imported { .. } => "imported",
            Reason::Fetched { .. } => "fetched",
            Reason::InRegistry { .. } => "in_registry",
            Reason::Tested { .. } => "tested",
            Reason::NoReferences { .. } => "no_references",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationVerdict {
    pub file: String,
    pub category: FileCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    pub required: bool,
    pub reasons: Vec<Reason>,
}

/// Combines the usage graph, registry and test index into verdicts.
pub struct Classifier<'a> {
    graph: &'a UsageGraph,
    registry: &'a StaticRegistry,
    tests: &'a TestIndex,
    rules: &'a PathRules,
    ui_fetches: BTreeMap<String, Vec<String>>,
}

impl<'a> Classifier<'a> {
    pub fn new(
        graph: &'a UsageGraph,
        registry: &'a StaticRegistry,
        tests: &'a TestIndex,
        rules: &'a PathRules,
    ) -> Self {
        Self {
            graph,
            registry,
            tests,
            rules,
            ui_fetches: graph.ui_fetches(),
        }
    }

    /// Reasons are appended in a fixed order: imported, fetched,
    /// in_registry, tested, then no_references when nothing fired.
    pub fn classify(&self, file: &SourceFile) -> ClassificationVerdict {
        let mut reasons = Vec::new();

        let importers = self.importers(&file.path);
        if !importers.is_empty() {
            reasons.push(Reason::Imported {
                by: importers.into_iter().take(MAX_REPORTED_IMPORTERS).collect(),
            });
        }

        let route = match file.category {
            FileCategory::Api => self.rules.handler_route(&file.path),
            _ => None,
        };
        if let Some(route) = route.as_deref() {
            let callers = self.callers_of(route);
            if !callers.is_empty() {
                reasons.push(Reason::Fetched { by: callers });
            }
        }

        if let Some(doc) = self.registry.mention_of(&file.path) {
            reasons.push(Reason::InRegistry {
                file: doc.to_string(),
            });
        }

        if let Some(test) = self.tests.test_for(&file.path) {
            reasons.push(Reason::Tested {
                test_file: test.to_string(),
            });
        }

        let required = !reasons.is_empty();
        if !required {
            reasons.push(Reason::NoReferences {
                detail: "no import, fetch, registry entry or test found".to_string(),
            });
        }

        ClassificationVerdict {
            file: file.path.clone(),
            category: file.category,
            route,
            required,
            reasons,
        }
    }

    /// Distinct importers across every path variant, sorted.
    fn importers(&self, key: &str) -> Vec<String> {
        let importers: BTreeSet<String> = self
            .rules
            .variants(key)
            .iter()
            .flat_map(|variant| self.graph.importers_of(variant))
            .filter(|importer| importer != key)
            .collect();
        importers.into_iter().collect()
    }

    /// UI files calling `route` exactly or with a query string.
    fn callers_of(&self, route: &str) -> Vec<String> {
        let query_prefix = format!("{route}?");
        self.ui_fetches
            .iter()
            .filter(|(_, targets)| {
                targets
                    .iter()
                    .any(|t| t == route || t.starts_with(&query_prefix))
            })
            .map(|(ui, _)| ui.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationStats {
    pub total_apis: usize,
    pub total_ui: usize,
    pub required_apis: usize,
    pub required_ui: usize,
    pub candidate_apis: usize,
    pub candidate_ui: usize,
}

/// `classification.json`. UI buckets hold both pages and components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationReport {
    #[serde(rename = "generatedAtUnixMs")]
    pub generated_at_unix_ms: u64,
    pub required_apis: Vec<ClassificationVerdict>,
    pub required_ui: Vec<ClassificationVerdict>,
    pub candidate_apis: Vec<ClassificationVerdict>,
    pub candidate_ui: Vec<ClassificationVerdict>,
    pub stats: ClassificationStats,
}

impl ClassificationReport {
    fn push(&mut self, verdict: ClassificationVerdict) {
        match (verdict.category, verdict.required) {
            (FileCategory::Api, true) => self.required_apis.push(verdict),
            (FileCategory::Api, false) => self.candidate_apis.push(verdict),
            (_, true) => self.required_ui.push(verdict),
            (_, false) => self.candidate_ui.push(verdict),
        }
    }

    fn finish(mut self) -> Self {
        self.stats = ClassificationStats {
            total_apis: self.required_apis.len() + self.candidate_apis.len(),
            total_ui: self.required_ui.len() + self.candidate_ui.len(),
            required_apis: self.required_apis.len(),
            required_ui: self.required_ui.len(),
            candidate_apis: self.candidate_apis.len(),
            candidate_ui: self.candidate_ui.len(),
        };
        self
    }
}

/// Whole-number percentage; an empty denominator scores 0.
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part * 100) as f64 / total as f64).round() as u32
}

/// Classify every api, ui and component file. The graph must already be
/// complete.
pub fn classify_all(
    classifier: &Classifier<'_>,
    files: &[SourceFile],
    progress: Option<&ProgressSender>,
) -> ClassificationReport {
    let targets: Vec<&SourceFile> = files
        .iter()
        .filter(|f| f.category != FileCategory::Other)
        .collect();
    let total = targets.len();

    let mut report = ClassificationReport {
        generated_at_unix_ms: unix_now_ms(),
        ..ClassificationReport::default()
    };
    for (index, file) in targets.into_iter().enumerate() {
        let verdict = classifier.classify(file);
        emit(
            progress,
            ProgressEvent::FileClassified {
                index: index + 1,
                total,
                path: verdict.file.clone(),
                required: verdict.required,
            },
        );
        report.push(verdict);
    }

    let report = report.finish();
    log::info!(
        "Classified {} files: {} required, {} candidates",
        total,
        report.stats.required_apis + report.stats.required_ui,
        report.stats.candidate_apis + report.stats.candidate_ui
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::UsageGraphBuilder;
    use pretty_assertions::assert_eq;
    use specguard_indexer::SourceDocument;
    use specguard_protocol::{progress_channel, WorkspaceConfig};

    struct Fixture {
        graph: UsageGraph,
        registry: StaticRegistry,
        tests: TestIndex,
        rules: PathRules,
        files: Vec<SourceFile>,
    }

    impl Fixture {
        fn new(docs: &[(&str, FileCategory, &str)], registry: &[(&str, &str)], tests: &[&str]) -> Self {
            let config = WorkspaceConfig::default();
            let documents: Vec<SourceDocument> = docs
                .iter()
                .map(|(path, cat, text)| SourceDocument::new(SourceFile::new(*path, *cat), *text))
                .collect();
            let builder = UsageGraphBuilder::new(&config).unwrap();
            let tests: Vec<String> = tests.iter().map(|t| t.to_string()).collect();
            Self {
                graph: builder.build(&documents),
                registry: StaticRegistry::from_documents(registry.iter().copied()),
                tests: TestIndex::new(&tests, &config),
                rules: builder.rules().clone(),
                files: documents.into_iter().map(|d| d.file).collect(),
            }
        }

        fn classifier(&self) -> Classifier<'_> {
            Classifier::new(&self.graph, &self.registry, &self.tests, &self.rules)
        }

        fn verdict(&self, path: &str) -> ClassificationVerdict {
            let file = self.files.iter().find(|f| f.path == path).unwrap();
            self.classifier().classify(file)
        }
    }

    #[test]
    fn importer_reached_through_two_variants_is_listed_once() {
        let fx = Fixture::new(
            &[
                (
                    "src/app/page.tsx",
                    FileCategory::Ui,
                    "import db from '@/lib/db.ts';\nimport { query } from '@/lib/db';",
                ),
                ("src/components/Zeta.tsx", FileCategory::Component, "import db from '@/lib/db.ts';"),
                ("src/lib/db.ts", FileCategory::Other, ""),
            ],
            &[],
            &[],
        );
        let verdict = fx.verdict("src/lib/db.ts");
        assert_eq!(
            verdict.reasons,
            vec![Reason::Imported {
                by: vec![
                    "src/app/page.tsx".to_string(),
                    "src/components/Zeta.tsx".to_string(),
                ],
            }]
        );
    }

    #[test]
    fn alias_without_extension_counts_as_import() {
        let fx = Fixture::new(
            &[
                ("src/app/page.tsx", FileCategory::Ui, "import { db } from '@/lib/db';"),
                ("src/lib/db.ts", FileCategory::Other, ""),
                ("src/components/Card.tsx", FileCategory::Component, "import db from '@/lib/db';"),
            ],
            &[],
            &[],
        );
        let verdict = fx.verdict("src/lib/db.ts");
        assert!(verdict.required);
        assert_eq!(
            verdict.reasons,
            vec![Reason::Imported {
                by: vec![
                    "src/app/page.tsx".to_string(),
                    "src/components/Card.tsx".to_string()
                ]
            }]
        );
    }

    #[test]
    fn index_file_is_reached_through_its_directory() {
        let fx = Fixture::new(
            &[
                ("src/components/Nav/index.tsx", FileCategory::Component, ""),
                ("src/app/layout.tsx", FileCategory::Ui, "import Nav from '../components/Nav';"),
            ],
            &[],
            &[],
        );
        assert!(fx.verdict("src/components/Nav/index.tsx").required);
    }

    #[test]
    fn fetched_matches_exact_route_or_query() {
        let fx = Fixture::new(
            &[
                ("src/pages/api/users/index.ts", FileCategory::Api, ""),
                ("src/pages/api/orders.ts", FileCategory::Api, ""),
                ("src/pages/api/ordersummary.ts", FileCategory::Api, ""),
                (
                    "src/app/page.tsx",
                    FileCategory::Ui,
                    "fetch('/api/users'); fetch('/api/orders?status=open');",
                ),
            ],
            &[],
            &[],
        );
        let users = fx.verdict("src/pages/api/users/index.ts");
        assert_eq!(users.route.as_deref(), Some("/api/users"));
        assert_eq!(
            users.reasons,
            vec![Reason::Fetched {
                by: vec!["src/app/page.tsx".to_string()]
            }]
        );
        assert!(fx.verdict("src/pages/api/orders.ts").required);
        assert!(!fx.verdict("src/pages/api/ordersummary.ts").required);
    }

    #[test]
    fn reasons_follow_signal_order() {
        let fx = Fixture::new(
            &[
                ("src/pages/api/audit.ts", FileCategory::Api, ""),
                ("src/lib/jobs.ts", FileCategory::Other, "import a from '@/pages/api/audit';"),
                ("src/app/page.tsx", FileCategory::Ui, "fetch('/api/audit')"),
            ],
            &[("src/config/system-registry.ts", "audit: true")],
            &["tests/audit.spec.ts"],
        );
        let verdict = fx.verdict("src/pages/api/audit.ts");
        let kinds: Vec<&str> = verdict.reasons.iter().map(Reason::kind).collect();
        assert_eq!(kinds, vec!["imported", "fetched", "in_registry", "tested"]);
    }

    #[test]
    fn unreferenced_file_gets_single_no_references_reason() {
        let fx = Fixture::new(
            &[("src/pages/api/legacy.ts", FileCategory::Api, "import x from './other';")],
            &[],
            &[],
        );
        let verdict = fx.verdict("src/pages/api/legacy.ts");
        assert!(!verdict.required);
        assert_eq!(verdict.reasons.len(), 1);
        assert_eq!(verdict.reasons[0].kind(), "no_references");
    }

    #[test]
    fn classify_all_buckets_and_reports_progress() {
        let fx = Fixture::new(
            &[
                ("src/pages/api/a.ts", FileCategory::Api, ""),
                ("src/pages/api/b.ts", FileCategory::Api, ""),
                ("src/app/page.tsx", FileCategory::Ui, "fetch('/api/a')"),
                ("src/components/Orphan.tsx", FileCategory::Component, ""),
                ("src/lib/util.ts", FileCategory::Other, ""),
            ],
            &[],
            &[],
        );
        let (tx, mut rx) = progress_channel();
        let report = classify_all(&fx.classifier(), &fx.files, Some(&tx));

        assert_eq!(
            report.stats,
            ClassificationStats {
                total_apis: 2,
                total_ui: 2,
                required_apis: 1,
                required_ui: 0,
                candidate_apis: 1,
                candidate_ui: 2,
            }
        );
        let mut events = 0;
        while rx.try_recv().is_ok() {
            events += 1;
        }
        assert_eq!(events, 4);

        for verdict in report.required_apis.iter().chain(&report.required_ui) {
            assert!(verdict.reasons.iter().any(Reason::is_signal));
        }
        for verdict in report.candidate_apis.iter().chain(&report.candidate_ui) {
            assert_eq!(verdict.reasons.len(), 1);
            assert!(!verdict.reasons[0].is_signal());
        }
    }

    #[test]
    fn percent_rounds_and_guards_zero() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn reasons_serialize_with_type_tag() {
        let json = serde_json::to_value(Reason::Tested {
            test_file: "tests/a.test.ts".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "tested");
        assert_eq!(json["test_file"], "tests/a.test.ts");
    }
}
