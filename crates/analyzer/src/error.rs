use thiserror::Error;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// Errors that can occur while parsing a source file
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// The file is not syntactically valid Python
    #[error("Parse error in {file}: {message}")]
    ParseError { file: String, message: String },

    /// Tree-sitter failed to load or run the grammar
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),

    #[error("{0}")]
    Other(String),
}

impl AnalyzerError {
    /// Create a parse error for a file
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(message: impl Into<String>) -> Self {
        Self::TreeSitterError(message.into())
    }
}
