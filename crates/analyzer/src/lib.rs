//! # Depmap Analyzer
//!
//! Per-file static analysis of Python sources.
//!
//! Each file is parsed with tree-sitter into a [`SourceFile`] record:
//! imports in declared order (absolute and relative forms preserved),
//! classes with bases/methods/attributes, module-scope functions,
//! docstrings, and the name references found inside class bodies. Nothing
//! here is resolved — cross-file resolution needs the complete file set and
//! lives downstream in `depmap-graph`.

mod error;
mod parser;
mod types;

pub use error::{AnalyzerError, Result};
pub use parser::ModuleParser;
pub use types::{
    ClassDecl, FunctionDecl, ImportKind, ImportStmt, ImportedName, NameRef, SourceFile,
    SourceInput,
};
