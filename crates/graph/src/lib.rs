//! # Depmap Graph
//!
//! Dependency-graph construction over parsed Python sources.
//!
//! ## Architecture
//!
//! ```text
//! SourceInput[]
//!     │
//!     ├──> Module Parser (depmap-analyzer, per file)
//!     │
//!     ├──> Symbol Resolver
//!     │      ├─ Module index (qualified name -> file)
//!     │      ├─ Import resolution (relative anchors, prefix/suffix search)
//!     │      └─ Base/usage resolution (aliases, deterministic tie-breaks)
//!     │
//!     ├──> Graph Builder (petgraph)
//!     │      ├─ File graph: imports + derived usage
//!     │      └─ Class graph: inheritance + usage
//!     │
//!     └──> Model Assembler
//!            ├─ Per-node depends-on / used-by lists
//!            ├─ External library attribution
//!            └─ Aggregate stats + diagnostics
//! ```
//!
//! Everything is rebuilt from scratch on every run; node order follows
//! file-discovery order so unchanged input produces identical output.

mod builder;
mod diagnostics;
mod error;
mod model;
mod pipeline;
mod resolver;
mod types;

pub use builder::GraphBuilder;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{GraphError, Result};
pub use model::{ClassEntry, FileEntry, ModelAssembler, ProjectModel, ProjectStats};
pub use pipeline::analyze;
pub use resolver::{Resolution, Resolver};
pub use types::{
    class_id, class_id_file, ClassGraph, ClassNode, DepEdge, DependencyGraph, FileGraph, FileNode,
    ImportEdge, RelationKind, UsageEdge, UsageKind,
};
