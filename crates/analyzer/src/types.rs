use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One file handed to the parser by the source-tree loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    /// Path relative to the project root (unique key)
    pub path: String,

    /// Module-qualified name derived from the path (e.g., "pkg.sub.mod")
    pub module: String,

    /// Raw file contents
    pub text: String,
}

impl SourceInput {
    pub fn new(
        path: impl Into<String>,
        module: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            module: module.into(),
            text: text.into(),
        }
    }
}

/// Whether an import is written in absolute or relative form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportKind {
    Absolute,
    Relative,
}

/// A single imported name with its optional alias (`from x import Name as Alias`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    /// Name the symbol is bound to in the importing module
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Raw import statement as written in the source, unresolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStmt {
    /// Dotted target module; empty for `from . import x`
    pub module: String,

    /// Names pulled in by a from-import; empty for `import a.b`
    pub names: Vec<ImportedName>,

    /// Alias for the module itself (`import a.b as c`)
    pub alias: Option<String>,

    pub kind: ImportKind,

    /// Leading ascension dots of a relative import
    pub level: usize,

    /// `from m import *`
    pub wildcard: bool,

    pub line: usize,
}

impl ImportStmt {
    /// Plain absolute `import module` record; also used for dynamic imports
    /// spotted as `__import__("module")` calls
    pub fn absolute(module: impl Into<String>, line: usize) -> Self {
        Self {
            module: module.into(),
            names: Vec::new(),
            alias: None,
            kind: ImportKind::Absolute,
            level: 0,
            wildcard: false,
            line,
        }
    }

    /// Root module component, used for external-library attribution
    pub fn root(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

/// Class declaration extracted from one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    /// Class name, unique within its file but not globally
    pub name: String,

    /// Owning file path
    pub file: String,

    pub line: usize,

    /// Base-class expressions as raw dotted strings, unresolved
    pub bases: Vec<String>,

    /// Method names in declaration order, dunder and mangled forms included
    pub methods: Vec<String>,

    /// Attribute names assigned in the class body or in `__init__`
    pub attributes: BTreeSet<String>,

    pub docstring: Option<String>,
}

/// Module-level function declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,

    /// Owning file path
    pub file: String,

    pub line: usize,

    pub parameters: Vec<String>,

    pub docstring: Option<String>,
}

/// A dotted name referenced inside a class body (call target, annotation
/// or attribute base), attributed to the enclosing class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRef {
    /// Name of the class whose body contains the reference
    pub class_name: String,

    /// Raw dotted name as written
    pub name: String,

    pub line: usize,
}

/// Everything extracted from one parsed file; immutable after parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the project root (unique key)
    pub path: String,

    /// Module-qualified name
    pub module: String,

    /// True for `__init__.py` package initializers
    pub is_package: bool,

    /// Raw import statements in declared order
    pub imports: Vec<ImportStmt>,

    pub classes: Vec<ClassDecl>,

    /// Module-scope functions
    pub functions: Vec<FunctionDecl>,

    /// Name references collected inside class bodies
    pub references: Vec<NameRef>,

    pub docstring: Option<String>,

    /// Raw source, kept for rendering and summaries
    #[serde(skip)]
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, module: impl Into<String>, text: impl Into<String>) -> Self {
        let path = path.into();
        let is_package = path.ends_with("__init__.py");
        Self {
            path,
            module: module.into(),
            is_package,
            imports: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            references: Vec::new(),
            docstring: None,
            text: text.into(),
        }
    }

    /// Placeholder for a file that failed to parse: declarations stay empty
    /// so the rest of the run can proceed
    pub fn empty(path: impl Into<String>, module: impl Into<String>) -> Self {
        Self::new(path, module, String::new())
    }

    /// Class lookup by exact name
    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.iter().find(|c| c.name == name)
    }
}
