use depmap_analyzer::ImportKind;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity of a class node: `<file path>::<class name>`
pub fn class_id(file: &str, name: &str) -> String {
    format!("{file}::{name}")
}

/// File component of a class id
pub fn class_id_file(id: &str) -> &str {
    id.split_once("::").map(|(file, _)| file).unwrap_or(id)
}

/// Resolved (or external) import dependency of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    /// Importing file path
    pub source: String,

    /// Target specification after relative resolution (dotted module path)
    pub spec: String,

    /// Resolved target file path; None marks an external/unresolvable
    /// library. Never more than one target.
    pub target: Option<String>,

    pub kind: ImportKind,

    /// Chosen among several equally valid candidates via the documented
    /// tie-break
    pub low_confidence: bool,
}

/// Relationship carried by a class-level edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UsageKind {
    /// Source class lists the target in its base-class list
    Inherits,

    /// Source class references the target by name in a method body or
    /// annotation
    Uses,
}

/// Class-level dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEdge {
    /// Source class id
    pub source: String,

    /// Raw target name as written
    pub target_name: String,

    /// Resolved target class id; None marks an external/unknown class
    pub resolved: Option<String>,

    pub kind: UsageKind,

    pub low_confidence: bool,
}

/// Relationship carried by a graph edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    /// File-level: source imports target
    Imports,

    /// Class-level inheritance
    Inherits,

    /// Name usage, at either granularity
    Uses,
}

/// Edge payload: duplicate (source, target, kind) triples merge into the
/// weight instead of being stored twice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepEdge {
    pub kind: RelationKind,
    pub weight: u32,
    pub low_confidence: bool,
}

/// File node payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub path: String,
    pub module: String,
}

/// Class node payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    pub id: String,
    pub name: String,
    pub file: String,
    pub line: usize,
}

/// Directed dependency graph over string-keyed nodes.
///
/// Nodes are inserted in file-discovery order and iterated in insertion
/// order, so unchanged input produces identical output.
pub struct DependencyGraph<N> {
    pub graph: DiGraph<N, DepEdge>,
    node_index: HashMap<String, NodeIndex>,
    edge_index: HashMap<(NodeIndex, NodeIndex, RelationKind), EdgeIndex>,
}

pub type FileGraph = DependencyGraph<FileNode>;
pub type ClassGraph = DependencyGraph<ClassNode>;

impl<N> DependencyGraph<N> {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
        }
    }

    /// Add a node under a unique key. A repeated key keeps the first node.
    pub fn add_node(&mut self, key: &str, node: N) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(key) {
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.node_index.insert(key.to_string(), idx);
        idx
    }

    /// Find node by key
    pub fn find_node(&self, key: &str) -> Option<NodeIndex> {
        self.node_index.get(key).copied()
    }

    /// Deduplicating edge insert. Self-loops are dropped; a repeated
    /// (source, target, kind) bumps the weight and keeps any
    /// low-confidence marking. Returns false when nothing was added or
    /// merged.
    pub fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        kind: RelationKind,
        low_confidence: bool,
    ) -> bool {
        if from == to {
            return false;
        }

        if let Some(&edge) = self.edge_index.get(&(from, to, kind)) {
            if let Some(payload) = self.graph.edge_weight_mut(edge) {
                payload.weight += 1;
                payload.low_confidence |= low_confidence;
            }
            return true;
        }

        let edge = self.graph.add_edge(
            from,
            to,
            DepEdge {
                kind,
                weight: 1,
                low_confidence,
            },
        );
        self.edge_index.insert((from, to, kind), edge);
        true
    }

    /// Get node payload
    pub fn node(&self, idx: NodeIndex) -> Option<&N> {
        self.graph.node_weight(idx)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &N)> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx).map(|node| (idx, node)))
    }

    /// All edges as (source, target, payload)
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &DepEdge)> {
        self.graph.edge_indices().filter_map(move |edge| {
            let (from, to) = self.graph.edge_endpoints(edge)?;
            Some((from, to, self.graph.edge_weight(edge)?))
        })
    }

    /// Distinct successor nodes, ordered by node insertion order
    pub fn out_neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut targets: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Distinct predecessor nodes, ordered by node insertion order
    pub fn in_neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut sources: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .collect();
        sources.sort();
        sources.dedup();
        sources
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl<N> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file_node(path: &str) -> FileNode {
        FileNode {
            path: path.to_string(),
            module: path.trim_end_matches(".py").to_string(),
        }
    }

    #[test]
    fn merges_duplicate_edges_into_weight() {
        let mut graph = FileGraph::new();
        let a = graph.add_node("a.py", file_node("a.py"));
        let b = graph.add_node("b.py", file_node("b.py"));

        assert!(graph.add_edge(a, b, RelationKind::Imports, false));
        assert!(graph.add_edge(a, b, RelationKind::Imports, true));
        assert!(graph.add_edge(a, b, RelationKind::Uses, false));

        assert_eq!(graph.edge_count(), 2);
        let import_edge = graph
            .edges()
            .find(|(_, _, e)| e.kind == RelationKind::Imports)
            .unwrap();
        assert_eq!(import_edge.2.weight, 2);
        assert!(import_edge.2.low_confidence);
    }

    #[test]
    fn drops_self_loops() {
        let mut graph = FileGraph::new();
        let a = graph.add_node("a.py", file_node("a.py"));

        assert!(!graph.add_edge(a, a, RelationKind::Imports, false));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn repeated_key_keeps_first_node() {
        let mut graph = FileGraph::new();
        let first = graph.add_node("a.py", file_node("a.py"));
        let second = graph.add_node("a.py", file_node("other.py"));

        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node(first).unwrap().path, "a.py");
    }
}
