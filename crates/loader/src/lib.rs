//! # Depmap Loader
//!
//! Source-tree enumeration. Walks a project root (.gitignore aware),
//! applies ignore patterns, derives module-qualified names and reads file
//! contents, yielding [`depmap_analyzer::SourceInput`]s in lexical
//! discovery order. All file IO happens here; the analysis stages are pure.

mod error;
mod scanner;

pub use error::{LoaderError, Result};
pub use scanner::SourceScanner;
