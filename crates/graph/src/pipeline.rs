use crate::builder::GraphBuilder;
use crate::diagnostics::Diagnostic;
use crate::error::{GraphError, Result};
use crate::model::{ModelAssembler, ProjectModel};
use crate::resolver::Resolver;
use depmap_analyzer::{ModuleParser, SourceFile, SourceInput};

/// Run the whole analysis over loaded sources: parse every file, resolve
/// references, build both graphs and assemble the model.
///
/// Inputs must be in discovery (lexical) order with no duplicate paths.
/// A file that fails to parse is recorded with empty declarations and a
/// diagnostic; only an empty input set is fatal.
pub fn analyze(inputs: &[SourceInput]) -> Result<ProjectModel> {
    if inputs.is_empty() {
        return Err(GraphError::EmptyProject);
    }

    let mut parser = ModuleParser::new().map_err(|e| GraphError::build(e.to_string()))?;

    let mut files = Vec::with_capacity(inputs.len());
    let mut diagnostics = Vec::new();

    for input in inputs {
        match parser.parse(input) {
            Ok(file) => files.push(file),
            Err(e) => {
                log::warn!("Skipping declarations for {}: {e}", input.path);
                diagnostics.push(Diagnostic::parse_error(&input.path, e.to_string()));
                files.push(SourceFile::empty(&input.path, &input.module));
            }
        }
    }

    // Resolution needs the complete file index; it never starts before
    // every parse has finished
    let resolution = Resolver::resolve(&files);
    let (file_graph, class_graph) = GraphBuilder::build(&files, &resolution);

    Ok(ModelAssembler::assemble(
        files,
        resolution,
        file_graph,
        class_graph,
        diagnostics,
    ))
}
