use crate::error::Result;
use depmap_graph::{ProjectModel, RelationKind};
use serde::Serialize;

/// One vis-network node
#[derive(Debug, Clone, Serialize)]
pub struct VisNode {
    pub id: String,
    pub label: String,
    pub title: String,
    pub color: String,
    pub size: u32,
}

/// One vis-network edge
#[derive(Debug, Clone, Serialize)]
pub struct VisEdge {
    pub from: String,
    pub to: String,
    pub title: String,
    pub color: String,
    pub width: u32,
    pub arrows: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dashes: bool,
}

/// Node/edge lists in the shape vis-network consumes
#[derive(Debug, Clone, Serialize, Default)]
pub struct VisData {
    pub nodes: Vec<VisNode>,
    pub edges: Vec<VisEdge>,
}

/// Both graphs exported for the interactive widget
#[derive(Debug, Clone, Serialize)]
pub struct GraphExport {
    pub files: VisData,
    pub classes: VisData,
}

impl GraphExport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build the exportable graph data from the model. Node order follows the
/// model's discovery order.
pub fn export(model: &ProjectModel) -> GraphExport {
    GraphExport {
        files: file_graph_data(model),
        classes: class_graph_data(model),
    }
}

fn file_graph_data(model: &ProjectModel) -> VisData {
    let mut data = VisData::default();

    for entry in model.files() {
        let source = &entry.source;
        let classes = source.classes.len();
        let functions = source.functions.len();

        let color = if source.is_package {
            "#f59e0b"
        } else if classes > 0 {
            "#2563eb"
        } else if functions > 0 {
            "#10b981"
        } else {
            "#9ca3af"
        };

        // Node size scales with declared complexity
        let size = ((classes + functions) * 5).clamp(20, 50) as u32;

        data.nodes.push(VisNode {
            id: source.path.clone(),
            label: file_label(&source.path),
            title: format!(
                "{}\n{} classes, {} functions, {} imports",
                source.path,
                classes,
                functions,
                source.imports.len()
            ),
            color: color.to_string(),
            size,
        });
    }

    let graph = model.file_graph();
    for (from, to, edge) in graph.edges() {
        let (Some(from), Some(to)) = (graph.node(from), graph.node(to)) else {
            continue;
        };
        data.edges.push(vis_edge(&from.path, &to.path, edge.kind, edge.weight, edge.low_confidence));
    }

    data
}

fn class_graph_data(model: &ProjectModel) -> VisData {
    let mut data = VisData::default();

    for entry in model.classes() {
        let size = (entry.decl.methods.len() * 3).clamp(25, 60) as u32;

        data.nodes.push(VisNode {
            id: entry.id.clone(),
            label: entry.decl.name.clone(),
            title: format!(
                "{} ({}:{})\n{} methods, {} attributes",
                entry.decl.name,
                entry.decl.file,
                entry.decl.line,
                entry.decl.methods.len(),
                entry.decl.attributes.len()
            ),
            color: "#2563eb".to_string(),
            size,
        });
    }

    let graph = model.class_graph();
    for (from, to, edge) in graph.edges() {
        let (Some(from), Some(to)) = (graph.node(from), graph.node(to)) else {
            continue;
        };
        data.edges.push(vis_edge(&from.id, &to.id, edge.kind, edge.weight, edge.low_confidence));
    }

    data
}

fn vis_edge(from: &str, to: &str, kind: RelationKind, weight: u32, low_confidence: bool) -> VisEdge {
    let (title, color) = match kind {
        RelationKind::Imports => ("imports", "#666666"),
        RelationKind::Inherits => ("inherits", "#8b5cf6"),
        RelationKind::Uses => ("uses", "#0ea5e9"),
    };

    VisEdge {
        from: from.to_string(),
        to: to.to_string(),
        title: if weight > 1 {
            format!("{title} (x{weight})")
        } else {
            title.to_string()
        },
        color: color.to_string(),
        width: weight.clamp(2, 6),
        arrows: "to",
        dashes: low_confidence,
    }
}

fn file_label(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}
