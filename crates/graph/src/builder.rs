use crate::resolver::Resolution;
use crate::types::{
    class_id, class_id_file, ClassGraph, ClassNode, FileGraph, FileNode, RelationKind,
};
use depmap_analyzer::SourceFile;

/// Builds the two dependency graphs from resolved files and edges
pub struct GraphBuilder;

impl GraphBuilder {
    /// Nodes are inserted in file-discovery order; edges are deduplicated
    /// and self-loops dropped by the graph itself.
    pub fn build(files: &[SourceFile], resolution: &Resolution) -> (FileGraph, ClassGraph) {
        let mut file_graph = FileGraph::new();
        let mut class_graph = ClassGraph::new();

        for file in files {
            file_graph.add_node(
                &file.path,
                FileNode {
                    path: file.path.clone(),
                    module: file.module.clone(),
                },
            );

            for class in &file.classes {
                let id = class_id(&file.path, &class.name);
                class_graph.add_node(
                    &id,
                    ClassNode {
                        id: id.clone(),
                        name: class.name.clone(),
                        file: file.path.clone(),
                        line: class.line,
                    },
                );
            }
        }

        // File-level edges from resolved imports
        for edges in &resolution.imports {
            for edge in edges {
                let Some(target) = &edge.target else {
                    continue;
                };
                let from = file_graph.find_node(&edge.source);
                let to = file_graph.find_node(target);
                if let (Some(from), Some(to)) = (from, to) {
                    file_graph.add_edge(from, to, RelationKind::Imports, edge.low_confidence);
                }
            }
        }

        // Class-level edges; cross-file usage also counts as a file-level
        // dependency even without a direct import
        for edge in resolution.inherits.iter().chain(&resolution.uses) {
            let Some(resolved) = &edge.resolved else {
                continue;
            };
            let from = class_graph.find_node(&edge.source);
            let to = class_graph.find_node(resolved);
            let kind = match edge.kind {
                crate::types::UsageKind::Inherits => RelationKind::Inherits,
                crate::types::UsageKind::Uses => RelationKind::Uses,
            };
            if let (Some(from), Some(to)) = (from, to) {
                class_graph.add_edge(from, to, kind, edge.low_confidence);
            }

            if kind == RelationKind::Uses {
                let source_file = class_id_file(&edge.source);
                let target_file = class_id_file(resolved);
                if source_file != target_file {
                    let from = file_graph.find_node(source_file);
                    let to = file_graph.find_node(target_file);
                    if let (Some(from), Some(to)) = (from, to) {
                        file_graph.add_edge(from, to, RelationKind::Uses, edge.low_confidence);
                    }
                }
            }
        }

        log::info!(
            "Built dependency graphs: {} files / {} edges, {} classes / {} edges",
            file_graph.node_count(),
            file_graph.edge_count(),
            class_graph.node_count(),
            class_graph.edge_count()
        );

        (file_graph, class_graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use depmap_analyzer::{ModuleParser, SourceInput};
    use pretty_assertions::assert_eq;

    fn build(sources: &[(&str, &str, &str)]) -> (FileGraph, ClassGraph) {
        let mut parser = ModuleParser::new().unwrap();
        let files: Vec<SourceFile> = sources
            .iter()
            .map(|(path, module, text)| {
                parser
                    .parse(&SourceInput::new(*path, *module, *text))
                    .unwrap()
            })
            .collect();
        let resolution = Resolver::resolve(&files);
        GraphBuilder::build(&files, &resolution)
    }

    #[test]
    fn import_creates_file_edge() {
        let (file_graph, class_graph) = build(&[
            (
                "app/main.py",
                "app.main",
                "from utils.parser import Parser\n\nclass App:\n    pass\n",
            ),
            (
                "utils/parser.py",
                "utils.parser",
                "class Parser:\n    pass\n",
            ),
        ]);

        assert_eq!(file_graph.node_count(), 2);
        assert_eq!(file_graph.edge_count(), 1);
        // No inheritance or usage between App and Parser bodies
        assert_eq!(class_graph.node_count(), 2);
        assert_eq!(class_graph.edge_count(), 0);
    }

    #[test]
    fn class_usage_adds_class_and_file_edges() {
        let (file_graph, class_graph) = build(&[
            (
                "app/main.py",
                "app.main",
                "from utils.parser import Parser\n\nclass App:\n    def run(self):\n        return Parser()\n",
            ),
            (
                "utils/parser.py",
                "utils.parser",
                "class Parser:\n    pass\n",
            ),
        ]);

        assert_eq!(class_graph.edge_count(), 1);
        let (_, _, edge) = class_graph.edges().next().unwrap();
        assert_eq!(edge.kind, RelationKind::Uses);

        // Import edge plus derived usage edge
        assert_eq!(file_graph.edge_count(), 2);
    }

    #[test]
    fn self_import_does_not_create_loop() {
        let (file_graph, _) = build(&[("a.py", "a", "import a\n")]);
        assert_eq!(file_graph.edge_count(), 0);
    }

    #[test]
    fn repeated_usage_merges_weight() {
        let (_, class_graph) = build(&[
            (
                "app.py",
                "app",
                "from core import Widget\n\nclass App:\n    def run(self):\n        a = Widget()\n        b = Widget()\n",
            ),
            ("core.py", "core", "class Widget:\n    pass\n"),
        ]);

        assert_eq!(class_graph.edge_count(), 1);
        let (_, _, edge) = class_graph.edges().next().unwrap();
        assert_eq!(edge.weight, 2);
    }
}
