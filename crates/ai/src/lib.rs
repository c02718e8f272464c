//! # Depmap AI
//!
//! Optional natural-language file documentation over an OpenAI-compatible
//! chat completions API. Configured entirely from the environment; a
//! missing key disables the feature rather than failing the run, and
//! per-file request failures are captured as error records so the batch
//! always completes.

mod config;
mod error;
mod summarizer;

pub use config::AiConfig;
pub use error::{AiError, Result};
pub use summarizer::{FileSummary, FileToSummarize, SummaryClient};
