use crate::error::{LoaderError, Result};
use depmap_analyzer::SourceInput;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Directories never worth analyzing, applied before user patterns
const IGNORED_SCOPES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".eggs",
    "__pycache__",
    "venv",
    ".venv",
    "env",
    "node_modules",
    "build",
    "dist",
    "site-packages",
];

/// Scanner for Python source files under a project root.
///
/// Yields files in lexical path order so every downstream stage sees a
/// deterministic discovery order.
pub struct SourceScanner {
    root: PathBuf,
    patterns: GlobSet,
}

impl SourceScanner {
    /// Create a scanner with user ignore patterns. Patterns are matched
    /// against the relative path, the file name and every path component.
    pub fn new(root: impl AsRef<Path>, ignore_patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in ignore_patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| LoaderError::invalid_pattern(pattern, e.to_string()))?;
            builder.add(glob);
        }
        let patterns = builder
            .build()
            .map_err(|e| LoaderError::invalid_pattern("<set>", e.to_string()))?;

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            patterns,
        })
    }

    /// Scan the root for `.py` files (.gitignore aware) and load their
    /// contents. Non-UTF-8 files are read lossily rather than skipped.
    pub fn scan(&self) -> Result<Vec<SourceInput>> {
        if !self.root.is_dir() {
            return Err(LoaderError::MissingRoot(
                self.root.to_string_lossy().into_owned(),
            ));
        }

        let mut paths = Vec::new();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true);
        let scope_root = self.root.clone();
        builder.filter_entry(move |entry| !is_ignored_scope(entry.path(), &scope_root));

        for result in builder.build() {
            match result {
                Ok(entry) => {
                    let Some(file_type) = entry.file_type() else {
                        continue;
                    };
                    if !file_type.is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("py") {
                        continue;
                    }

                    let Ok(relative) = path.strip_prefix(&self.root) else {
                        continue;
                    };
                    if self.is_ignored(relative) {
                        log::debug!("Ignoring {} (matched pattern)", relative.display());
                        continue;
                    }

                    paths.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        // Lexical discovery order, the contract with resolution
        paths.sort();

        let mut inputs = Vec::with_capacity(paths.len());
        for path in paths {
            let relative = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_path_buf();
            let key = normalized(&relative);
            let module = module_name(&relative);

            let text = match fs::read(&path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        log::debug!("{} is not valid UTF-8, reading lossily", key);
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {e}", key);
                    continue;
                }
            };

            inputs.push(SourceInput::new(key, module, text));
        }

        log::info!("Found {} Python source files", inputs.len());
        Ok(inputs)
    }

    /// User pattern match against relative path, file name or any component
    fn is_ignored(&self, relative: &Path) -> bool {
        if self.patterns.is_match(relative) {
            return true;
        }
        if let Some(name) = relative.file_name() {
            if self.patterns.is_match(Path::new(name)) {
                return true;
            }
        }
        relative.components().any(|component| {
            matches!(component, Component::Normal(part) if self.patterns.is_match(Path::new(part)))
        })
    }
}

fn is_ignored_scope(path: &Path, root: &Path) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative.components().any(|component| {
        matches!(
            component,
            Component::Normal(name) if IGNORED_SCOPES
                .iter()
                .any(|scope| name.to_string_lossy().eq_ignore_ascii_case(scope))
        )
    })
}

/// Forward-slash relative path, the unique file key
fn normalized(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Module-qualified name: strip `.py`, join with dots, collapse
/// `pkg/__init__.py` to `pkg`
fn module_name(relative: &Path) -> String {
    let mut parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = parts.last_mut() {
        if let Some(stem) = last.strip_suffix(".py") {
            *last = stem.to_string();
        }
    }
    if parts.last().map(String::as_str) == Some("__init__") {
        parts.pop();
    }

    parts.join(".")
}
