use thiserror::Error;

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// No source files were discovered; nothing to analyze
    #[error("Project contains no source files")]
    EmptyProject,

    #[error("Graph build error: {0}")]
    BuildError(String),

    #[error("{0}")]
    Other(String),
}

impl GraphError {
    /// Create a build error
    pub fn build(msg: impl Into<String>) -> Self {
        Self::BuildError(msg.into())
    }
}
