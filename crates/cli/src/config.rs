use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// `depmap.toml` contents. Every field has a default so the tool runs
/// without a config file at all.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DepmapConfig {
    pub project: ProjectSection,
    pub ai: AiSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    /// Display name; the root directory name when empty
    pub name: String,

    /// Directory to analyze
    pub root: PathBuf,

    /// Directory the HTML site is written to
    pub output: PathBuf,

    /// Ignore patterns matched against relative paths, file names and path
    /// components
    pub ignore: Vec<String>,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: String::new(),
            root: PathBuf::from("."),
            output: PathBuf::from("docs"),
            ignore: vec![
                "__pycache__".to_string(),
                "*.pyc".to_string(),
                ".git".to_string(),
                "venv".to_string(),
                "env".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AiSection {
    /// Generate AI documentation when the environment provides a key
    pub enabled: bool,

    /// Cap on the number of files documented with AI
    pub max_files: Option<usize>,
}

impl DepmapConfig {
    /// Load configuration. A missing file yields the defaults; a present
    /// but invalid file is a fatal configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;

        Ok(config)
    }

    /// Project display name, falling back to the root directory name
    pub fn project_name(&self, root: &Path) -> String {
        if !self.project.name.is_empty() {
            return self.project.name.clone();
        }
        root.canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "Python project".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_file() {
        let config = DepmapConfig::load(Path::new("/nonexistent/depmap.toml")).unwrap();
        assert_eq!(config.project.root, PathBuf::from("."));
        assert_eq!(config.project.output, PathBuf::from("docs"));
        assert!(!config.ai.enabled);
        assert!(config.project.ignore.contains(&"__pycache__".to_string()));
    }

    #[test]
    fn parses_partial_config() {
        let config: DepmapConfig = toml::from_str(
            "[project]\nname = \"demo\"\nroot = \"src\"\n\n[ai]\nenabled = true\nmax_files = 5\n",
        )
        .unwrap();

        assert_eq!(config.project.name, "demo");
        assert_eq!(config.project.root, PathBuf::from("src"));
        // Unset fields keep their defaults
        assert_eq!(config.project.output, PathBuf::from("docs"));
        assert!(config.ai.enabled);
        assert_eq!(config.ai.max_files, Some(5));
    }

    #[test]
    fn invalid_config_is_fatal() {
        let dir = std::env::temp_dir().join("depmap-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("depmap.toml");
        std::fs::write(&path, "project = \"not a table\"").unwrap();

        assert!(DepmapConfig::load(&path).is_err());
    }
}
