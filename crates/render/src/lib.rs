//! # Depmap Render
//!
//! Static documentation site and graph export over a built
//! [`depmap_graph::ProjectModel`]. Produces vis-network node/edge JSON for
//! the interactive widget and a cross-linked set of HTML pages (index,
//! per-file, per-class) with regex-highlighted Python source. Consumes the
//! model read-only; all IO is confined to `HtmlGenerator::generate`.

mod error;
mod export;
mod highlight;
mod html;

pub use error::{RenderError, Result};
pub use export::{export, GraphExport, VisData, VisEdge, VisNode};
pub use highlight::{escape, Highlighter};
pub use html::{class_page_name, module_page_name, FileSummaryDoc, HtmlGenerator};
