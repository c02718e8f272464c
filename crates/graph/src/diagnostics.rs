use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a non-fatal issue found during analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A file could not be parsed; its declarations were skipped
    ParseError,

    /// A project-relative import did not resolve to any analyzed file
    UnresolvedImport,

    /// Several equally valid targets matched; the first in discovery order
    /// was chosen
    AmbiguousResolution,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ParseError => "parse-error",
            Self::UnresolvedImport => "unresolved-import",
            Self::AmbiguousResolution => "ambiguous-resolution",
        };
        f.write_str(label)
    }
}

/// One structured, non-fatal issue. Diagnostics are data attached to the
/// model, never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: String,
    pub message: String,
}

impl Diagnostic {
    pub fn parse_error(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::ParseError,
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn unresolved_import(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::UnresolvedImport,
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn ambiguous(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::AmbiguousResolution,
            file: file.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.file, self.message)
    }
}
