use crate::config::AiConfig;
use crate::error::{AiError, Result};
use serde::{Deserialize, Serialize};

/// Source handed over for summarization
#[derive(Debug, Clone)]
pub struct FileToSummarize {
    pub path: String,
    pub source: String,
}

/// Documentation generated for one file. A per-file failure is captured in
/// `error` instead of aborting the batch.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub path: String,
    pub markdown: String,
    pub summary: String,
    pub purpose: String,
    pub error: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

const SYSTEM_PROMPT: &str = "You are an expert in Python code analysis and technical writing. \
Analyze the provided file and produce concise Markdown documentation with: a title and general \
description, the file's purpose within the project, its main classes and functions, and its \
dependencies. Use appropriate Markdown structure and focus on what matters for understanding \
the code.";

/// Source longer than this is truncated before prompting
const MAX_SOURCE_CHARS: usize = 3000;

/// Files smaller than this carry too little signal to document
const MIN_SOURCE_CHARS: usize = 20;

/// Generates natural-language file documentation over an OpenAI-compatible
/// chat completions API
pub struct SummaryClient {
    config: AiConfig,
    http: reqwest::Client,
}

impl SummaryClient {
    pub fn new(config: AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { config, http })
    }

    /// Summarize eligible files, up to `max_files`. Failures degrade to
    /// per-file error records; the batch always completes.
    pub async fn summarize_all(
        &self,
        files: &[FileToSummarize],
        max_files: Option<usize>,
    ) -> Vec<FileSummary> {
        let eligible: Vec<&FileToSummarize> = files
            .iter()
            .filter(|f| is_eligible(&f.path, &f.source))
            .collect();
        let capped = match max_files {
            Some(max) => &eligible[..eligible.len().min(max)],
            None => &eligible[..],
        };

        if capped.is_empty() {
            log::warn!("No files eligible for AI documentation");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(capped.len());
        for (position, file) in capped.iter().enumerate() {
            log::info!(
                "Summarizing {} ({}/{})",
                file.path,
                position + 1,
                capped.len()
            );
            match self.summarize_file(&file.path, &file.source).await {
                Ok(summary) => results.push(summary),
                Err(e) => {
                    log::warn!("Failed to summarize {}: {e}", file.path);
                    results.push(FileSummary {
                        path: file.path.clone(),
                        markdown: String::new(),
                        summary: "Documentation generation failed".to_string(),
                        purpose: String::new(),
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        results
    }

    /// Generate documentation for one file
    pub async fn summarize_file(&self, path: &str, source: &str) -> Result<FileSummary> {
        let mut code = source.to_string();
        if code.len() > MAX_SOURCE_CHARS {
            let mut cut = MAX_SOURCE_CHARS;
            while !code.is_char_boundary(cut) {
                cut -= 1;
            }
            code.truncate(cut);
            code.push_str("\n\n[... code truncated ...]");
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "File: {path}\n\nCode to document:\n```python\n{code}\n```\n\nGenerate Markdown documentation for this Python file."
                    ),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AiError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: ChatResponse = response.json().await?;
        let markdown = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(AiError::EmptyResponse)?;

        Ok(FileSummary {
            path: path.to_string(),
            summary: extract_summary(&markdown),
            purpose: extract_purpose(&markdown),
            markdown,
            error: None,
        })
    }
}

/// Empty files and near-empty `__init__.py` are not worth documenting
fn is_eligible(path: &str, source: &str) -> bool {
    let trimmed = source.trim();
    if trimmed.len() < MIN_SOURCE_CHARS {
        return false;
    }
    !(path.ends_with("__init__.py") && trimmed.len() < 100)
}

/// First prose line after the title, for table display
fn extract_summary(markdown: &str) -> String {
    for line in markdown.lines().skip(1).take(9) {
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') && !line.starts_with("```") {
            return if line.len() > 200 {
                let mut cut = 200;
                while !line.is_char_boundary(cut) {
                    cut -= 1;
                }
                format!("{}...", &line[..cut])
            } else {
                line.to_string()
            };
        }
    }
    "AI-generated documentation".to_string()
}

/// First line of a purpose/goal section, when the model produced one
fn extract_purpose(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    for (position, line) in lines.iter().enumerate() {
        let lowered = line.to_lowercase();
        if lowered.contains("purpose") || lowered.contains("goal") || lowered.contains("objective")
        {
            for following in lines.iter().skip(position + 1).take(4) {
                let following = following.trim();
                if !following.is_empty() && !following.starts_with('#') {
                    return following.chars().take(300).collect();
                }
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn eligibility_skips_trivial_files() {
        assert!(!is_eligible("a.py", ""));
        assert!(!is_eligible("a.py", "x = 1"));
        assert!(!is_eligible("pkg/__init__.py", "from . import mod  # re-export"));
        assert!(is_eligible(
            "a.py",
            "def main():\n    print('hello world')\n"
        ));
    }

    #[test]
    fn summary_is_first_prose_line() {
        let markdown = "# parser.py\n\nParses configuration files into dataclasses.\n\n## Purpose\nCentral config entry point.\n";
        assert_eq!(
            extract_summary(markdown),
            "Parses configuration files into dataclasses."
        );
        assert_eq!(extract_purpose(markdown), "Central config entry point.");
    }

    #[test]
    fn purpose_defaults_to_empty() {
        assert_eq!(extract_purpose("# title\n\njust text\n"), "");
    }

    #[test]
    fn response_shape_parses() {
        let body: ChatResponse = serde_json::from_str(
            r##"{"choices":[{"message":{"role":"assistant","content":"# doc"}}]}"##,
        )
        .unwrap();
        assert_eq!(body.choices[0].message.content, "# doc");
    }
}
