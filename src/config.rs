//! Configuration loading from flowscan.toml and pyproject.toml.
//!
//! Follows conventions from ruff, black, mypy for familiarity:
//! - `[tool.flowscan]` section in pyproject.toml
//! - Standalone flowscan.toml as an override
//!
//! ## Example
//!
//! ```toml
//! [tool.flowscan]
//! marker = "flow"
//! extensions = ["py"]
//! include = ["flows/**"]
//! extend-exclude = ["**/tests/**"]
//! respect-gitignore = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::extraction::DEFAULT_MARKER;

/// Flowscan configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Source file for this config (for display).
    pub source: Option<PathBuf>,

    /// Decorator name that marks a flow.
    pub marker: String,

    /// File extensions (without dot) treated as Python source.
    pub extensions: Vec<String>,

    /// Glob patterns for files to include. If empty, include all source files.
    pub include: Vec<String>,

    /// Glob patterns for files to exclude. Nothing is excluded by default.
    pub exclude: Vec<String>,

    /// More exclude patterns, applied together with `exclude`.
    pub extend_exclude: Vec<String>,

    /// Honor .gitignore / .ignore files while walking.
    pub respect_gitignore: bool,

    /// Parse files on the rayon pool.
    pub parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            marker: DEFAULT_MARKER.to_string(),
            extensions: vec!["py".to_string()],
            include: Vec::new(),
            exclude: Vec::new(),
            extend_exclude: Vec::new(),
            respect_gitignore: false,
            parallel: true,
        }
    }
}

/// Raw config as deserialized from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    marker: Option<String>,
    extensions: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    extend_exclude: Option<Vec<String>>,
    respect_gitignore: Option<bool>,
    parallel: Option<bool>,
}

/// Wrapper for pyproject.toml structure.
#[derive(Debug, Deserialize)]
struct PyProject {
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Deserialize)]
struct PyProjectTool {
    flowscan: Option<RawConfig>,
}

impl Config {
    /// Load configuration for a scan root.
    ///
    /// Search order:
    /// 1. flowscan.toml in directory
    /// 2. pyproject.toml [tool.flowscan] in directory
    /// 3. Walk up to find pyproject.toml (like ruff)
    /// 4. Default config if nothing found
    pub fn load(directory: &Path) -> Self {
        let flowscan_toml = directory.join("flowscan.toml");
        if flowscan_toml.exists() {
            if let Some(config) = Self::load_flowscan_toml(&flowscan_toml) {
                return config;
            }
        }

        let mut current = Some(directory);
        while let Some(dir) = current {
            let pyproject = dir.join("pyproject.toml");
            if pyproject.exists() {
                if let Some(config) = Self::load_pyproject(&pyproject) {
                    return config;
                }
            }
            current = dir.parent();
        }

        Self::default()
    }

    fn load_flowscan_toml(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<RawConfig>(&content) {
            Ok(raw) => Some(Self::from_raw(raw, path.to_path_buf())),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                None
            }
        }
    }

    fn load_pyproject(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let pyproject: PyProject = toml::from_str(&content).ok()?;
        let raw = pyproject.tool?.flowscan?;
        Some(Self::from_raw(raw, path.to_path_buf()))
    }

    fn from_raw(raw: RawConfig, source: PathBuf) -> Self {
        let defaults = Self::default();
        Self {
            source: Some(source),
            marker: raw.marker.unwrap_or(defaults.marker),
            extensions: raw
                .extensions
                .map(|exts| {
                    exts.into_iter()
                        .map(|e| e.trim_start_matches('.').to_string())
                        .collect()
                })
                .unwrap_or(defaults.extensions),
            include: raw.include.unwrap_or_default(),
            exclude: raw.exclude.unwrap_or_default(),
            extend_exclude: raw.extend_exclude.unwrap_or_default(),
            respect_gitignore: raw.respect_gitignore.unwrap_or(defaults.respect_gitignore),
            parallel: raw.parallel.unwrap_or(defaults.parallel),
        }
    }

    /// All exclude patterns: `exclude` followed by `extend-exclude`.
    pub fn effective_excludes(&self) -> Vec<String> {
        self.exclude
            .iter()
            .chain(&self.extend_exclude)
            .cloned()
            .collect()
    }

    /// True if the path carries one of the configured source extensions.
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|want| want == ext))
    }

    /// Check if a path matches any include pattern.
    /// Returns true if no include patterns (include all), or if path matches any pattern.
    pub fn matches_include(&self, path: &Path) -> bool {
        if self.include.is_empty() {
            return true;
        }
        let path_str = path.to_string_lossy();
        self.include
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &path_str))
    }

    /// Check if a path matches any exclude pattern.
    pub fn matches_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.effective_excludes()
            .iter()
            .any(|pattern| glob_match::glob_match(pattern, &path_str))
    }

    /// Check if a path should be included (matches include AND not exclude).
    pub fn should_include(&self, path: &Path) -> bool {
        self.matches_include(path) && !self.matches_exclude(path)
    }

    /// Format config for verbose display.
    pub fn display_summary(&self) -> String {
        let mut lines = Vec::new();

        match self.source {
            Some(ref source) => lines.push(format!("config: {}", source.display())),
            None => lines.push("config: (defaults)".to_string()),
        }
        lines.push(format!("marker: @{}(...)", self.marker));
        lines.push(format!("extensions: {}", self.extensions.join(", ")));

        if !self.include.is_empty() {
            lines.push(format!("include: {}", self.include.join(", ")));
        }
        let excludes = self.effective_excludes();
        if !excludes.is_empty() {
            lines.push(format!("exclude: {}", excludes.join(", ")));
        }

        lines.join("; ")
    }
}
