use depmap_analyzer::SourceInput;
use depmap_graph::{analyze, DiagnosticKind, GraphError, ProjectModel, RelationKind};
use pretty_assertions::assert_eq;

fn inputs(sources: &[(&str, &str, &str)]) -> Vec<SourceInput> {
    sources
        .iter()
        .map(|(path, module, text)| SourceInput::new(*path, *module, *text))
        .collect()
}

/// Flatten a model into a comparable snapshot: node order, edge triples
/// with weights, diagnostics
fn snapshot(model: &ProjectModel) -> (Vec<String>, Vec<(String, String, String, u32)>, Vec<String>) {
    let nodes = model
        .files()
        .iter()
        .map(|f| f.source.path.clone())
        .collect();

    let graph = model.file_graph();
    let edges = graph
        .edges()
        .map(|(from, to, edge)| {
            (
                graph.node(from).unwrap().path.clone(),
                graph.node(to).unwrap().path.clone(),
                format!("{:?}", edge.kind),
                edge.weight,
            )
        })
        .collect();

    let diagnostics = model
        .diagnostics()
        .iter()
        .map(|d| format!("{d}"))
        .collect();

    (nodes, edges, diagnostics)
}

#[test]
fn empty_project_is_fatal() {
    let result = analyze(&[]);
    assert!(matches!(result, Err(GraphError::EmptyProject)));
}

#[test]
fn end_to_end_import_scenario() {
    let model = analyze(&inputs(&[
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
    ]))
    .unwrap();

    let graph = model.file_graph();
    assert_eq!(graph.edge_count(), 1);
    let (from, to, edge) = graph.edges().next().unwrap();
    assert_eq!(graph.node(from).unwrap().path, "app/main.py");
    assert_eq!(graph.node(to).unwrap().path, "utils/parser.py");
    assert_eq!(edge.kind, RelationKind::Imports);

    // App never references Parser by name, so the class graph stays empty
    assert_eq!(model.class_graph().edge_count(), 0);
}

#[test]
fn usage_by_name_adds_class_edge() {
    let model = analyze(&inputs(&[
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
    ]))
    .unwrap();

    let graph = model.class_graph();
    assert_eq!(graph.edge_count(), 1);
    let (from, to, edge) = graph.edges().next().unwrap();
    assert_eq!(graph.node(from).unwrap().id, "app/main.py::App");
    assert_eq!(graph.node(to).unwrap().id, "utils/parser.py::Parser");
    assert_eq!(edge.kind, RelationKind::Uses);
}

#[test]
fn one_broken_file_does_not_abort_the_run() {
    let mut sources = vec![(
        "broken.py".to_string(),
        "broken".to_string(),
        "def broken(:\n".to_string(),
    )];
    for i in 0..9 {
        sources.push((
            format!("mod{i}.py"),
            format!("mod{i}"),
            format!("class C{i}:\n    pass\n"),
        ));
    }
    sources.sort();

    let inputs: Vec<SourceInput> = sources
        .iter()
        .map(|(path, module, text)| SourceInput::new(path.clone(), module.clone(), text.clone()))
        .collect();
    let model = analyze(&inputs).unwrap();

    assert_eq!(model.files().len(), 10);
    assert_eq!(model.stats().classes, 9);

    let parse_errors: Vec<_> = model
        .diagnostics()
        .iter()
        .filter(|d| d.kind == DiagnosticKind::ParseError)
        .collect();
    assert_eq!(parse_errors.len(), 1);
    assert_eq!(parse_errors[0].file, "broken.py");

    // The broken file still appears as a node with empty declarations
    let broken = model.file("broken.py").unwrap();
    assert!(broken.source.classes.is_empty());
}

#[test]
fn repeated_runs_are_identical() {
    let sources = [
        (
            "app/__init__.py",
            "app",
            "from . import main\n",
        ),
        (
            "app/main.py",
            "app.main",
            "from ..shared import util\nimport requests\n\nclass App:\n    def run(self):\n        return util.Helper()\n",
        ),
        (
            "shared/util.py",
            "shared.util",
            "class Helper:\n    pass\n",
        ),
    ];

    let first = analyze(&inputs(&sources)).unwrap();
    let second = analyze(&inputs(&sources)).unwrap();

    assert_eq!(snapshot(&first), snapshot(&second));
}

#[test]
fn wildcard_import_creates_file_edge_only() {
    let model = analyze(&inputs(&[
        ("a.py", "a", "from helpers import *\n\nclass A:\n    pass\n"),
        ("helpers.py", "helpers", "class Helper:\n    pass\n"),
    ]))
    .unwrap();

    assert_eq!(model.file_graph().edge_count(), 1);
    // Wildcards never attribute class-level usage
    assert_eq!(model.class_graph().edge_count(), 0);
}

#[test]
fn resolution_is_total() {
    let model = analyze(&inputs(&[
        (
            "a.py",
            "a",
            "import os\nimport local\nfrom missing import thing\n\nclass C(Unknown):\n    pass\n",
        ),
        ("local.py", "local", ""),
    ]))
    .unwrap();

    // Every import edge either resolves to a known file or is external
    for file in model.files() {
        for edge in &file.imports {
            if let Some(target) = &edge.target {
                assert!(model.file(target).is_some());
            }
        }
    }

    // Unresolved base stays as an explicit external reference
    let class = model.class("a.py::C").unwrap();
    assert_eq!(class.bases[0].target_name, "Unknown");
    assert_eq!(class.bases[0].resolved, None);
}
