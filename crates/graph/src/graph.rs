use crate::types::{NodeKind, Relationship, UsageGraph};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::BTreeMap;

impl UsageGraph {
    /// Files that import `key` (incoming Imports edges), sorted, duplicates kept.
    pub fn importers_of(&self, key: &str) -> Vec<String> {
        let Some(node) = self.find_node(key) else {
            return Vec::new();
        };
        let mut importers = self.neighbours(node, Direction::Incoming, Relationship::Imports);
        importers.sort();
        importers
    }

    /// Literal targets `file` fetches, in source order.
    pub fn fetches_of(&self, file: &str) -> Vec<String> {
        let Some(node) = self.find_node(file) else {
            return Vec::new();
        };
        let mut targets = self.neighbours(node, Direction::Outgoing, Relationship::Fetches);
        // petgraph walks adjacency lists newest-first
        targets.reverse();
        targets
    }

    /// Inverse index: referenced key -> referencing files.
    pub fn references(&self) -> BTreeMap<String, Vec<String>> {
        self.index_by(Relationship::Imports, |from, to| (to, from))
    }

    /// Forward index: file -> keys it imports.
    pub fn imports(&self) -> BTreeMap<String, Vec<String>> {
        self.index_by(Relationship::Imports, |from, to| (from, to))
    }

    /// UI file -> literal endpoint targets it calls.
    pub fn ui_fetches(&self) -> BTreeMap<String, Vec<String>> {
        self.index_by(Relationship::Fetches, |from, to| (from, to))
    }

    /// Every distinct fetch target across all UI files.
    pub fn fetch_targets(&self) -> Vec<&str> {
        self.graph
            .node_weights()
            .filter(|node| node.kind == NodeKind::Endpoint)
            .map(|node| node.key.as_str())
            .collect()
    }

    fn neighbours(
        &self,
        node: NodeIndex,
        direction: Direction,
        relationship: Relationship,
    ) -> Vec<String> {
        self.graph
            .edges_directed(node, direction)
            .filter(|e| e.weight().relationship == relationship)
            .filter_map(|e| {
                let other = match direction {
                    Direction::Incoming => e.source(),
                    Direction::Outgoing => e.target(),
                };
                self.get_node(other).map(|n| n.key.clone())
            })
            .collect()
    }

    fn index_by<F>(&self, relationship: Relationship, orient: F) -> BTreeMap<String, Vec<String>>
    where
        F: Fn(String, String) -> (String, String),
    {
        let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        // edge_references follows insertion order
        for edge in self.graph.edge_references() {
            if edge.weight().relationship != relationship {
                continue;
            }
            let (Some(from), Some(to)) = (self.get_node(edge.source()), self.get_node(edge.target()))
            else {
                continue;
            };
            let (key, value) = orient(from.key.clone(), to.key.clone());
            index.entry(key).or_default().push(value);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{NodeKind, Relationship, UsageGraph};
    use pretty_assertions::assert_eq;
    use specguard_protocol::FileCategory;

    fn sample() -> UsageGraph {
        let mut graph = UsageGraph::new();
        let page = graph.ensure_node("src/app/page.tsx", NodeKind::Source(FileCategory::Ui));
        let card = graph.ensure_node("src/components/Card.tsx", NodeKind::Source(FileCategory::Component));
        let db = graph.ensure_node("src/lib/db", NodeKind::Module);
        let users = graph.ensure_node("/api/users", NodeKind::Endpoint);
        let orders = graph.ensure_node("/api/orders?page=1", NodeKind::Endpoint);
        graph.add_edge(page, db, Relationship::Imports);
        graph.add_edge(card, db, Relationship::Imports);
        graph.add_edge(page, db, Relationship::Imports);
        graph.add_edge(page, users, Relationship::Fetches);
        graph.add_edge(page, orders, Relationship::Fetches);
        graph
    }

    #[test]
    fn importers_keep_duplicates() {
        let graph = sample();
        assert_eq!(
            graph.importers_of("src/lib/db"),
            vec![
                "src/app/page.tsx".to_string(),
                "src/app/page.tsx".to_string(),
                "src/components/Card.tsx".to_string(),
            ]
        );
        assert!(graph.importers_of("src/lib/none").is_empty());
    }

    #[test]
    fn fetch_indexes_follow_source_order() {
        let graph = sample();
        assert_eq!(
            graph.fetches_of("src/app/page.tsx"),
            vec!["/api/users".to_string(), "/api/orders?page=1".to_string()]
        );
        let fetches = graph.ui_fetches();
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches["src/app/page.tsx"].len(), 2);
        assert_eq!(graph.fetch_targets().len(), 2);
    }

    #[test]
    fn source_kind_upgrades_module_node() {
        let mut graph = sample();
        let idx = graph.ensure_node("src/lib/db", NodeKind::Source(FileCategory::Other));
        assert_eq!(
            graph.get_node(idx).unwrap().kind,
            NodeKind::Source(FileCategory::Other)
        );
        let again = graph.ensure_node("src/lib/db", NodeKind::Module);
        assert_eq!(idx, again);
        assert_eq!(
            graph.get_node(idx).unwrap().kind,
            NodeKind::Source(FileCategory::Other)
        );
        assert_eq!(graph.references()["src/lib/db"].len(), 3);
        assert_eq!(graph.imports()["src/app/page.tsx"].len(), 2);
    }
}
