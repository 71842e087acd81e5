use crate::builder::UsageGraphBuilder;
use crate::classify::{classify_all, ClassificationReport, Classifier};
use crate::registry::StaticRegistry;
use crate::test_index::TestIndex;
use crate::types::UsageGraph;
use crate::Result;
use serde::{Deserialize, Serialize};
use specguard_indexer::load_documents;
use specguard_protocol::{
    emit, write_json_atomic, FileCategory, InventoryReport, ProgressEvent, ProgressSender,
    SpecguardConfig, CLASSIFICATION_JSON, USAGE_GRAPH_JSON,
};
use std::collections::BTreeMap;
use std::path::Path;

/// `usage_graph.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageGraphReport {
    pub references: BTreeMap<String, Vec<String>>,
    pub ui_fetches: BTreeMap<String, Vec<String>>,
    pub imports: BTreeMap<String, Vec<String>>,
    /// Handler file -> route it serves
    pub api_routes: BTreeMap<String, String>,
}

impl UsageGraphReport {
    pub fn from_graph(graph: &UsageGraph, builder: &UsageGraphBuilder, inventory: &InventoryReport) -> Self {
        let api_routes = inventory
            .files
            .iter()
            .filter(|f| f.category == FileCategory::Api)
            .filter_map(|f| {
                builder
                    .rules()
                    .handler_route(&f.path)
                    .map(|route| (f.path.clone(), route))
            })
            .collect();
        Self {
            references: graph.references(),
            ui_fetches: graph.ui_fetches(),
            imports: graph.imports(),
            api_routes,
        }
    }
}

pub struct ClassificationOutcome {
    pub usage: UsageGraphReport,
    pub classification: ClassificationReport,
}

/// Build the global graph, then classify. Writes `usage_graph.json` and
/// `classification.json`; markdown rendering is left to the caller.
pub fn run_classification(
    root: &Path,
    config: &SpecguardConfig,
    inventory: &InventoryReport,
    progress: Option<&ProgressSender>,
) -> Result<ClassificationOutcome> {
    emit(
        progress,
        ProgressEvent::StageStarted {
            stage: "usage-graph".to_string(),
        },
    );
    let builder = UsageGraphBuilder::new(&config.workspace)?;
    let documents = load_documents(root, &inventory.files);
    let graph = builder.build(&documents);
    let usage = UsageGraphReport::from_graph(&graph, &builder, inventory);
    write_json_atomic(&config.report_path(root, USAGE_GRAPH_JSON), &usage)?;
    emit(
        progress,
        ProgressEvent::StageFinished {
            stage: "usage-graph".to_string(),
            detail: format!("{} nodes, {} edges", graph.node_count(), graph.edge_count()),
        },
    );

    emit(
        progress,
        ProgressEvent::StageStarted {
            stage: "classify".to_string(),
        },
    );
    let registry = StaticRegistry::load(root, &config.workspace.registry_documents);
    let tests = TestIndex::new(&inventory.tests, &config.workspace);
    let classifier = Classifier::new(&graph, &registry, &tests, builder.rules());
    let classification = classify_all(&classifier, &inventory.files, progress);
    write_json_atomic(&config.report_path(root, CLASSIFICATION_JSON), &classification)?;
    emit(
        progress,
        ProgressEvent::StageFinished {
            stage: "classify".to_string(),
            detail: format!(
                "{} required, {} candidates",
                classification.stats.required_apis + classification.stats.required_ui,
                classification.stats.candidate_apis + classification.stats.candidate_ui
            ),
        },
    );

    Ok(ClassificationOutcome {
        usage,
        classification,
    })
}
