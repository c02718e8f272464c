use crate::diagnostics::Diagnostic;
use crate::types::{class_id, ImportEdge, UsageEdge, UsageKind};
use depmap_analyzer::{ImportKind, ImportStmt, SourceFile};
use std::collections::{HashMap, HashSet};

/// Outcome of resolving every reference in the project. Unresolved is a
/// valid, representable state here, never a failure.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Per file (parallel to the input order): deduplicated import edges
    pub imports: Vec<Vec<ImportEdge>>,

    /// Inheritance edges, resolved or external
    pub inherits: Vec<UsageEdge>,

    /// Usage edges; only references that resolved to a known class are kept
    pub uses: Vec<UsageEdge>,

    pub diagnostics: Vec<Diagnostic>,
}

/// Per-file view of what an import statement binds locally
struct Bindings {
    /// Local dotted prefix -> file index of the module it denotes
    modules: HashMap<String, usize>,

    /// Local name -> (file index, original symbol name) for from-imports
    symbols: HashMap<String, (usize, String)>,

    /// File indices reachable through resolved import edges, import order
    reachable: Vec<usize>,
}

/// Resolves raw references against the complete set of parsed files.
///
/// The module index is built once from the input and threaded through each
/// stage explicitly; the resolver holds no global state.
pub struct Resolver<'a> {
    files: &'a [SourceFile],
    index: HashMap<&'a str, usize>,
    path_index: HashMap<&'a str, usize>,
}

impl<'a> Resolver<'a> {
    /// Resolve all imports, base classes and usage references. Files must
    /// be in discovery order; tie-breaks depend on it.
    pub fn resolve(files: &'a [SourceFile]) -> Resolution {
        let resolver = Self::new(files);
        let mut resolution = Resolution::default();

        for file in files {
            let edges = resolver.resolve_imports(file, &mut resolution.diagnostics);
            resolution.imports.push(edges);
        }

        for (position, file) in files.iter().enumerate() {
            let bindings = resolver.bindings(file, &resolution.imports[position]);
            resolver.resolve_classes(file, &bindings, &mut resolution);
        }

        log::debug!(
            "Resolved {} files: {} inheritance edges, {} usage edges, {} diagnostics",
            files.len(),
            resolution.inherits.len(),
            resolution.uses.len(),
            resolution.diagnostics.len()
        );

        resolution
    }

    fn new(files: &'a [SourceFile]) -> Self {
        let mut index = HashMap::new();
        let mut path_index = HashMap::new();
        for (position, file) in files.iter().enumerate() {
            // Discovery order wins on duplicates
            index.entry(file.module.as_str()).or_insert(position);
            path_index.entry(file.path.as_str()).or_insert(position);
        }
        Self {
            files,
            index,
            path_index,
        }
    }

    /// Resolve one file's import statements into deduplicated edges
    fn resolve_imports(&self, file: &SourceFile, diagnostics: &mut Vec<Diagnostic>) -> Vec<ImportEdge> {
        let mut edges = Vec::new();
        let mut seen: HashSet<(String, Option<String>)> = HashSet::new();

        for stmt in &file.imports {
            self.resolve_import(file, stmt, &mut edges, &mut seen, diagnostics);
        }

        edges
    }

    fn resolve_import(
        &self,
        file: &SourceFile,
        stmt: &ImportStmt,
        edges: &mut Vec<ImportEdge>,
        seen: &mut HashSet<(String, Option<String>)>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let mut push = |spec: String, target: Option<usize>, low_confidence: bool| {
            let target = target.map(|i| self.files[i].path.clone());
            if seen.insert((spec.clone(), target.clone())) {
                edges.push(ImportEdge {
                    source: file.path.clone(),
                    spec,
                    target,
                    kind: stmt.kind,
                    low_confidence,
                });
            }
        };

        // Relative imports anchor at the importing file's package
        let Some(spec) = self.absolute_spec(file, stmt) else {
            diagnostics.push(Diagnostic::unresolved_import(
                &file.path,
                format!(
                    "relative import `{}{}` ascends past the project root",
                    ".".repeat(stmt.level),
                    stmt.module
                ),
            ));
            push(format!("{}{}", ".".repeat(stmt.level), stmt.module), None, false);
            return;
        };

        let mut found = false;

        // Exact module match
        if !spec.is_empty() {
            if let Some(&position) = self.index.get(spec.as_str()) {
                push(spec.clone(), Some(position), false);
                found = true;
            }
        }

        // `from X import name` where name is itself a submodule
        if !stmt.wildcard {
            for name in &stmt.names {
                let submodule = if spec.is_empty() {
                    name.name.clone()
                } else {
                    format!("{spec}.{}", name.name)
                };
                if let Some(&position) = self.index.get(submodule.as_str()) {
                    push(submodule, Some(position), false);
                    found = true;
                }
            }
        }

        if found {
            return;
        }

        // Progressively shorter prefixes (package __init__ resolution)
        let mut parts: Vec<&str> = spec.split('.').filter(|p| !p.is_empty()).collect();
        while parts.len() > 1 {
            parts.pop();
            let prefix = parts.join(".");
            if let Some(&position) = self.index.get(prefix.as_str()) {
                push(spec.clone(), Some(position), false);
                return;
            }
        }

        // Suffix candidates: duplicate module names in different packages
        if !spec.is_empty() {
            let dotted = format!(".{spec}");
            let candidates: Vec<usize> = self
                .files
                .iter()
                .enumerate()
                .filter(|(_, f)| f.module == spec || f.module.ends_with(&dotted))
                .map(|(position, _)| position)
                .collect();

            if !candidates.is_empty() {
                let (position, ambiguous) = self.closest_candidate(file, &candidates);
                if ambiguous {
                    diagnostics.push(Diagnostic::ambiguous(
                        &file.path,
                        format!(
                            "import `{spec}` matched several modules; chose `{}`",
                            self.files[position].path
                        ),
                    ));
                }
                push(spec.clone(), Some(position), ambiguous);
                return;
            }
        }

        // External or unresolvable
        if stmt.kind == ImportKind::Relative {
            diagnostics.push(Diagnostic::unresolved_import(
                &file.path,
                format!("relative import `{spec}` does not match any analyzed file"),
            ));
        }
        push(spec, None, false);
    }

    /// Absolute dotted module path for an import statement, or None when a
    /// relative import ascends past the project root
    fn absolute_spec(&self, file: &SourceFile, stmt: &ImportStmt) -> Option<String> {
        if stmt.kind == ImportKind::Absolute {
            return Some(stmt.module.clone());
        }

        let mut parts: Vec<&str> = file.module.split('.').collect();
        // The anchor package of a regular module is its parent; a package
        // __init__ is its own anchor
        if !file.is_package {
            parts.pop();
        }
        for _ in 1..stmt.level {
            if parts.pop().is_none() {
                return None;
            }
        }

        if !stmt.module.is_empty() {
            parts.extend(stmt.module.split('.'));
        }
        Some(parts.join("."))
    }

    /// Prefer the candidate sharing the longest module-path prefix with the
    /// importing file; returns (winner, was_ambiguous)
    fn closest_candidate(&self, file: &SourceFile, candidates: &[usize]) -> (usize, bool) {
        let importer: Vec<&str> = file.module.split('.').collect();
        let closeness = |position: usize| {
            self.files[position]
                .module
                .split('.')
                .zip(&importer)
                .take_while(|(a, b)| a == *b)
                .count()
        };

        let best = candidates.iter().map(|&c| closeness(c)).max().unwrap_or(0);
        let mut tied = candidates.iter().copied().filter(|&c| closeness(c) == best);
        let winner = tied.next().expect("candidates are non-empty");
        (winner, tied.next().is_some())
    }

    /// What one file's imports bind locally, for base/usage lookup
    fn bindings(&self, file: &SourceFile, edges: &[ImportEdge]) -> Bindings {
        let mut bindings = Bindings {
            modules: HashMap::new(),
            symbols: HashMap::new(),
            reachable: Vec::new(),
        };

        for edge in edges {
            if let Some(target) = &edge.target {
                if let Some(&position) = self.path_index.get(target.as_str()) {
                    if !bindings.reachable.contains(&position) {
                        bindings.reachable.push(position);
                    }
                    // The resolved spec is addressable as written
                    bindings.modules.insert(edge.spec.clone(), position);
                }
            }
        }

        for stmt in &file.imports {
            let resolved = self
                .absolute_spec(file, stmt)
                .and_then(|spec| self.index.get(spec.as_str()).copied());

            if stmt.names.is_empty() {
                // `import a.b [as c]`
                if let Some(position) = resolved {
                    let local = stmt.alias.clone().unwrap_or_else(|| stmt.module.clone());
                    if !local.is_empty() {
                        bindings.modules.insert(local, position);
                    }
                }
                continue;
            }

            for name in &stmt.names {
                let local = name.local_name().to_string();
                // `from pkg import mod` may bind a submodule...
                let submodule = self.absolute_spec(file, stmt).and_then(|spec| {
                    let qualified = if spec.is_empty() {
                        name.name.clone()
                    } else {
                        format!("{spec}.{}", name.name)
                    };
                    self.index.get(qualified.as_str()).copied()
                });
                if let Some(position) = submodule {
                    bindings.modules.insert(local.clone(), position);
                }
                // ...or a symbol inside the target module
                if let Some(position) = resolved {
                    bindings.symbols.insert(local, (position, name.name.clone()));
                }
            }
        }

        bindings
    }

    /// Resolve base classes and usage references for every class in a file
    fn resolve_classes(&self, file: &SourceFile, bindings: &Bindings, resolution: &mut Resolution) {
        let mut ambiguity_reported: HashSet<String> = HashSet::new();

        for class in &file.classes {
            let source = class_id(&file.path, &class.name);

            for base in &class.bases {
                let (resolved, low_confidence) = self.resolve_name(
                    file,
                    bindings,
                    base,
                    &mut ambiguity_reported,
                    &mut resolution.diagnostics,
                );
                resolution.inherits.push(UsageEdge {
                    source: source.clone(),
                    target_name: base.clone(),
                    resolved,
                    kind: UsageKind::Inherits,
                    low_confidence,
                });
            }
        }

        for reference in &file.references {
            let source = class_id(&file.path, &reference.class_name);
            let (resolved, low_confidence) = self.resolve_name(
                file,
                bindings,
                &reference.name,
                &mut ambiguity_reported,
                &mut resolution.diagnostics,
            );
            // Unresolved references are not class dependencies; only keep
            // edges to known classes, and never to the class itself
            if let Some(target) = resolved {
                if target != source {
                    resolution.uses.push(UsageEdge {
                        source,
                        target_name: reference.name.clone(),
                        resolved: Some(target),
                        kind: UsageKind::Uses,
                        low_confidence,
                    });
                }
            }
        }
    }

    /// Resolve a raw (possibly dotted) class name to a class id
    fn resolve_name(
        &self,
        file: &SourceFile,
        bindings: &Bindings,
        raw: &str,
        ambiguity_reported: &mut HashSet<String>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Option<String>, bool) {
        if let Some((prefix, name)) = raw.rsplit_once('.') {
            // `module.ClassName`: the prefix must be an imported module
            if let Some(&position) = bindings.modules.get(prefix) {
                if let Some(class) = self.files[position].class(name) {
                    return (Some(class_id(&class.file, &class.name)), false);
                }
            }
            return (None, false);
        }

        // Same file first
        if let Some(class) = file.class(raw) {
            return (Some(class_id(&class.file, &class.name)), false);
        }

        // A from-import binding of that name
        if let Some((position, original)) = bindings.symbols.get(raw) {
            if let Some(class) = self.files[*position].class(original) {
                return (Some(class_id(&class.file, &class.name)), false);
            }
        }

        // Exact-name match across files reachable through resolved imports
        let mut candidates: Vec<usize> = bindings
            .reachable
            .iter()
            .copied()
            .filter(|&position| self.files[position].class(raw).is_some())
            .collect();
        // Tie-break needs discovery order, not import order
        candidates.sort_unstable();

        match candidates.as_slice() {
            [] => (None, false),
            [position] => {
                let class = self.files[*position].class(raw).expect("candidate has class");
                (Some(class_id(&class.file, &class.name)), false)
            }
            [position, ..] => {
                let class = self.files[*position].class(raw).expect("candidate has class");
                if ambiguity_reported.insert(raw.to_string()) {
                    diagnostics.push(Diagnostic::ambiguous(
                        &file.path,
                        format!(
                            "`{raw}` is declared in {} imported modules; chose `{}`",
                            candidates.len(),
                            class.file
                        ),
                    ));
                }
                (Some(class_id(&class.file, &class.name)), true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depmap_analyzer::{ModuleParser, SourceInput};
    use pretty_assertions::assert_eq;

    fn parse_all(sources: &[(&str, &str, &str)]) -> Vec<SourceFile> {
        let mut parser = ModuleParser::new().unwrap();
        sources
            .iter()
            .map(|(path, module, text)| {
                parser
                    .parse(&SourceInput::new(*path, *module, *text))
                    .unwrap()
            })
            .collect()
    }

    fn edge_target<'a>(edges: &'a [ImportEdge], spec: &str) -> Option<&'a str> {
        edges
            .iter()
            .find(|e| e.spec == spec)
            .and_then(|e| e.target.as_deref())
    }

    #[test]
    fn resolves_absolute_import_exactly() {
        let files = parse_all(&[
            ("app/main.py", "app.main", "from utils.parser import Parser\n"),
            ("utils/parser.py", "utils.parser", "class Parser:\n    pass\n"),
        ]);
        let resolution = Resolver::resolve(&files);

        assert_eq!(
            edge_target(&resolution.imports[0], "utils.parser"),
            Some("utils/parser.py")
        );
    }

    #[test]
    fn relative_import_anchors_at_parent_package() {
        let files = parse_all(&[
            ("pkg/__init__.py", "pkg", ""),
            ("pkg/sibling.py", "pkg.sibling", ""),
            ("pkg/sub/mod.py", "pkg.sub.mod", "from .. import sibling\n"),
        ]);
        let resolution = Resolver::resolve(&files);

        // Level 2 from pkg/sub/mod.py anchors at pkg
        assert_eq!(
            edge_target(&resolution.imports[2], "pkg.sibling"),
            Some("pkg/sibling.py")
        );
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn package_init_is_its_own_anchor() {
        let files = parse_all(&[
            ("pkg/__init__.py", "pkg", "from . import helpers\n"),
            ("pkg/helpers.py", "pkg.helpers", ""),
        ]);
        let resolution = Resolver::resolve(&files);

        assert_eq!(
            edge_target(&resolution.imports[0], "pkg.helpers"),
            Some("pkg/helpers.py")
        );
    }

    #[test]
    fn shorter_prefix_resolves_to_package_init() {
        let files = parse_all(&[
            ("app.py", "app", "import pkg.missing.thing\n"),
            ("pkg/__init__.py", "pkg", ""),
        ]);
        let resolution = Resolver::resolve(&files);

        assert_eq!(
            edge_target(&resolution.imports[0], "pkg.missing.thing"),
            Some("pkg/__init__.py")
        );
    }

    #[test]
    fn duplicate_imports_collapse_to_one_edge() {
        let files = parse_all(&[("app.py", "app", "import os\nimport os as o\n")]);
        let resolution = Resolver::resolve(&files);

        assert_eq!(resolution.imports[0].len(), 1);
        let edge = &resolution.imports[0][0];
        assert_eq!(edge.spec, "os");
        assert_eq!(edge.target, None);
    }

    #[test]
    fn ascending_past_root_is_diagnosed_not_fatal() {
        let files = parse_all(&[("top.py", "top", "from ... import nothing\n")]);
        let resolution = Resolver::resolve(&files);

        assert_eq!(resolution.imports[0][0].target, None);
        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(
            resolution.diagnostics[0].kind,
            crate::diagnostics::DiagnosticKind::UnresolvedImport
        );
    }

    #[test]
    fn suffix_tie_prefers_closest_package() {
        let files = parse_all(&[
            ("pkg1/main.py", "pkg1.main", "import utils\n"),
            ("pkg1/utils.py", "pkg1.utils", ""),
            ("pkg2/utils.py", "pkg2.utils", ""),
        ]);
        let resolution = Resolver::resolve(&files);

        // pkg1.utils shares the pkg1 prefix with the importer; not ambiguous
        assert_eq!(edge_target(&resolution.imports[0], "utils"), Some("pkg1/utils.py"));
        assert!(resolution.imports[0].iter().all(|e| !e.low_confidence));
    }

    #[test]
    fn unrelated_suffix_tie_takes_discovery_order_and_flags() {
        let files = parse_all(&[
            ("main.py", "main", "import utils\n"),
            ("pkg1/utils.py", "pkg1.utils", ""),
            ("pkg2/utils.py", "pkg2.utils", ""),
        ]);
        let resolution = Resolver::resolve(&files);

        let edge = &resolution.imports[0][0];
        assert_eq!(edge.target.as_deref(), Some("pkg1/utils.py"));
        assert!(edge.low_confidence);
        assert!(resolution
            .diagnostics
            .iter()
            .any(|d| d.kind == crate::diagnostics::DiagnosticKind::AmbiguousResolution));
    }

    #[test]
    fn base_class_resolves_same_file_first() {
        let files = parse_all(&[(
            "a.py",
            "a",
            "class Base:\n    pass\n\nclass Child(Base):\n    pass\n",
        )]);
        let resolution = Resolver::resolve(&files);

        assert_eq!(resolution.inherits.len(), 1);
        assert_eq!(
            resolution.inherits[0].resolved.as_deref(),
            Some("a.py::Base")
        );
    }

    #[test]
    fn base_class_resolves_through_from_import_alias() {
        let files = parse_all(&[
            (
                "app.py",
                "app",
                "from core import Base as B\n\nclass Child(B):\n    pass\n",
            ),
            ("core.py", "core", "class Base:\n    pass\n"),
        ]);
        let resolution = Resolver::resolve(&files);

        assert_eq!(
            resolution.inherits[0].resolved.as_deref(),
            Some("core.py::Base")
        );
    }

    #[test]
    fn dotted_base_resolves_through_module_alias() {
        let files = parse_all(&[
            (
                "app.py",
                "app",
                "import core.models as models\n\nclass Child(models.Base):\n    pass\n",
            ),
            ("core/models.py", "core.models", "class Base:\n    pass\n"),
        ]);
        let resolution = Resolver::resolve(&files);

        assert_eq!(
            resolution.inherits[0].resolved.as_deref(),
            Some("core/models.py::Base")
        );
    }

    #[test]
    fn unknown_base_is_external_not_an_error() {
        let files = parse_all(&[(
            "app.py",
            "app",
            "class Child(django.Model):\n    pass\n",
        )]);
        let resolution = Resolver::resolve(&files);

        assert_eq!(resolution.inherits[0].resolved, None);
        assert!(!resolution.inherits[0].low_confidence);
    }

    #[test]
    fn ambiguous_class_name_takes_discovery_order_and_flags() {
        let files = parse_all(&[
            ("a.py", "a", "class Foo:\n    pass\n"),
            ("b.py", "b", "class Foo:\n    pass\n"),
            (
                "c.py",
                "c",
                "import a\nimport b\n\nclass User(Foo):\n    pass\n",
            ),
        ]);
        let resolution = Resolver::resolve(&files);

        let edge = &resolution.inherits[0];
        assert_eq!(edge.resolved.as_deref(), Some("a.py::Foo"));
        assert!(edge.low_confidence);
        assert!(resolution
            .diagnostics
            .iter()
            .any(|d| d.kind == crate::diagnostics::DiagnosticKind::AmbiguousResolution));
    }

    #[test]
    fn usage_reference_becomes_uses_edge() {
        let files = parse_all(&[
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
        let resolution = Resolver::resolve(&files);

        assert_eq!(resolution.uses.len(), 1);
        let edge = &resolution.uses[0];
        assert_eq!(edge.source, "app/main.py::App");
        assert_eq!(edge.resolved.as_deref(), Some("utils/parser.py::Parser"));
        assert_eq!(edge.kind, UsageKind::Uses);
    }

    #[test]
    fn unresolved_usage_references_are_dropped() {
        let files = parse_all(&[(
            "app.py",
            "app",
            "class App:\n    def run(self):\n        print(len([1]))\n",
        )]);
        let resolution = Resolver::resolve(&files);

        assert!(resolution.uses.is_empty());
    }
}
