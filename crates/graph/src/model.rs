use crate::diagnostics::Diagnostic;
use crate::resolver::Resolution;
use crate::types::{class_id, ClassGraph, FileGraph, ImportEdge, UsageEdge, UsageKind};
use depmap_analyzer::{ClassDecl, ImportKind, SourceFile};
use serde::Serialize;
use std::collections::HashMap;

/// Python standard-library root modules, excluded from external-library
/// attribution
const STANDARD_LIBRARY: &[&str] = &[
    "__future__",
    "abc",
    "argparse",
    "ast",
    "asyncio",
    "base64",
    "collections",
    "contextlib",
    "copy",
    "dataclasses",
    "datetime",
    "decimal",
    "enum",
    "fnmatch",
    "functools",
    "hashlib",
    "importlib",
    "inspect",
    "io",
    "itertools",
    "json",
    "logging",
    "math",
    "os",
    "pathlib",
    "pickle",
    "random",
    "re",
    "shutil",
    "subprocess",
    "sys",
    "tempfile",
    "threading",
    "time",
    "typing",
    "unittest",
    "urllib",
    "uuid",
    "warnings",
    "weakref",
    "xml",
];

/// Aggregate project counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub files: usize,
    pub classes: usize,
    pub functions: usize,
    pub imports: usize,
    pub external_libraries: usize,
}

/// One file joined with its resolved edges and back-references
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub source: SourceFile,

    /// Deduplicated import edges in declared order
    pub imports: Vec<ImportEdge>,

    /// Files this file depends on, discovery order
    pub depends_on: Vec<String>,

    /// Files that depend on this file, discovery order
    pub used_by: Vec<String>,
}

/// One class joined with its resolved edges and back-references
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub id: String,
    pub decl: ClassDecl,

    /// Inheritance edges, resolved or external
    pub bases: Vec<UsageEdge>,

    /// Resolved usage edges originating here
    pub uses: Vec<UsageEdge>,

    /// Class ids that inherit from or use this class, discovery order
    pub used_by: Vec<String>,
}

/// Immutable project model handed to rendering. Accessors only; the graphs
/// and entries cannot be mutated through it.
pub struct ProjectModel {
    files: Vec<FileEntry>,
    classes: Vec<ClassEntry>,
    file_graph: FileGraph,
    class_graph: ClassGraph,
    external_libraries: Vec<(String, usize)>,
    stats: ProjectStats,
    diagnostics: Vec<Diagnostic>,
}

impl ProjectModel {
    /// Files in discovery order
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Lookup by path
    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.source.path == path)
    }

    /// Classes in discovery order
    pub fn classes(&self) -> &[ClassEntry] {
        &self.classes
    }

    /// Lookup by class id
    pub fn class(&self, id: &str) -> Option<&ClassEntry> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn file_graph(&self) -> &FileGraph {
        &self.file_graph
    }

    pub fn class_graph(&self) -> &ClassGraph {
        &self.class_graph
    }

    /// External libraries with use counts, most used first
    pub fn external_libraries(&self) -> &[(String, usize)] {
        &self.external_libraries
    }

    pub fn stats(&self) -> ProjectStats {
        self.stats
    }

    /// Non-fatal issues accumulated during the run
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Joins graphs and declaration metadata into the final model
pub struct ModelAssembler;

impl ModelAssembler {
    pub fn assemble(
        files: Vec<SourceFile>,
        resolution: Resolution,
        file_graph: FileGraph,
        class_graph: ClassGraph,
        mut diagnostics: Vec<Diagnostic>,
    ) -> ProjectModel {
        let external_libraries = collect_external_libraries(&resolution);

        let stats = ProjectStats {
            files: files.len(),
            classes: files.iter().map(|f| f.classes.len()).sum(),
            functions: files.iter().map(|f| f.functions.len()).sum(),
            imports: files.iter().map(|f| f.imports.len()).sum(),
            external_libraries: external_libraries.len(),
        };

        let mut file_entries = Vec::with_capacity(files.len());
        for (position, file) in files.iter().enumerate() {
            let (depends_on, used_by) = match file_graph.find_node(&file.path) {
                Some(idx) => {
                    let resolve_paths = |indices: Vec<petgraph::graph::NodeIndex>| {
                        indices
                            .into_iter()
                            .filter_map(|i| file_graph.node(i))
                            .map(|n| n.path.clone())
                            .collect::<Vec<_>>()
                    };
                    (
                        resolve_paths(file_graph.out_neighbors(idx)),
                        resolve_paths(file_graph.in_neighbors(idx)),
                    )
                }
                None => (Vec::new(), Vec::new()),
            };

            file_entries.push(FileEntry {
                source: file.clone(),
                imports: resolution.imports.get(position).cloned().unwrap_or_default(),
                depends_on,
                used_by,
            });
        }

        let mut bases_by_class: HashMap<&str, Vec<&UsageEdge>> = HashMap::new();
        for edge in &resolution.inherits {
            bases_by_class.entry(&edge.source).or_default().push(edge);
        }
        let mut uses_by_class: HashMap<&str, Vec<&UsageEdge>> = HashMap::new();
        for edge in &resolution.uses {
            uses_by_class.entry(&edge.source).or_default().push(edge);
        }

        let mut class_entries = Vec::new();
        for file in &files {
            for class in &file.classes {
                let id = class_id(&file.path, &class.name);

                let used_by = match class_graph.find_node(&id) {
                    Some(idx) => class_graph
                        .in_neighbors(idx)
                        .into_iter()
                        .filter_map(|i| class_graph.node(i))
                        .map(|n| n.id.clone())
                        .collect(),
                    None => Vec::new(),
                };

                class_entries.push(ClassEntry {
                    bases: bases_by_class
                        .get(id.as_str())
                        .map(|edges| edges.iter().map(|e| (*e).clone()).collect())
                        .unwrap_or_default(),
                    uses: dedup_uses(uses_by_class.get(id.as_str()).map(Vec::as_slice)),
                    used_by,
                    id,
                    decl: class.clone(),
                });
            }
        }

        diagnostics.extend(resolution.diagnostics);

        log::info!(
            "Assembled model: {} files, {} classes, {} functions, {} external libraries, {} diagnostics",
            stats.files,
            stats.classes,
            stats.functions,
            stats.external_libraries,
            diagnostics.len()
        );

        ProjectModel {
            files: file_entries,
            classes: class_entries,
            file_graph,
            class_graph,
            external_libraries,
            stats,
            diagnostics,
        }
    }
}

/// Distinct usage targets per class, first occurrence order
fn dedup_uses(edges: Option<&[&UsageEdge]>) -> Vec<UsageEdge> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for edge in edges.unwrap_or_default() {
        if edge.kind == UsageKind::Uses {
            if let Some(target) = &edge.resolved {
                if seen.insert(target.clone()) {
                    result.push((*edge).clone());
                }
            }
        }
    }
    result
}

/// A library is external when no analyzed file matches its root module
/// name; standard-library roots are not reported
fn collect_external_libraries(resolution: &Resolution) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for edges in &resolution.imports {
        for edge in edges {
            if edge.target.is_some() || edge.kind != ImportKind::Absolute {
                continue;
            }
            let root = edge.spec.split('.').next().unwrap_or(&edge.spec);
            if root.is_empty() || STANDARD_LIBRARY.contains(&root) {
                continue;
            }
            *counts.entry(root).or_insert(0) += 1;
        }
    }

    let mut libraries: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    // Most used first; name breaks count ties for stable output
    libraries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    libraries
}
