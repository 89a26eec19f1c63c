use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TidemarkError;

/// Optional repository configuration loaded from `.tidemark.toml`.
///
/// Only supplies defaults: CLI flags and action inputs take precedence.
/// The access token is deliberately absent and never read from files.
///
/// # Examples
///
/// ```
/// use tidemark_core::TidemarkConfig;
///
/// let config = TidemarkConfig::default();
/// assert!(config.workflow.is_none());
/// assert!(config.filter.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TidemarkConfig {
    /// Workflow file name or numeric id used to look up the last green run.
    pub workflow: Option<String>,
    /// Glob patterns applied to the changed paths.
    #[serde(default)]
    pub filter: Vec<String>,
    /// Default branch to use when the event payload does not name one.
    pub default_branch: Option<String>,
    /// Base URL of the run-metadata API.
    pub api_url: Option<String>,
}

impl TidemarkConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Io`] if the file cannot be read, or
    /// [`TidemarkError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidemark_core::TidemarkConfig;
    /// use std::path::Path;
    ///
    /// let config = TidemarkConfig::from_file(Path::new(".tidemark.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, TidemarkError> {
        if !path.exists() {
            return Err(TidemarkError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidemark_core::TidemarkConfig;
    ///
    /// let toml = r#"
    /// workflow = "ci.yml"
    /// filter = ["src/**", "*.md"]
    /// "#;
    /// let config = TidemarkConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.workflow.as_deref(), Some("ci.yml"));
    /// assert_eq!(config.filter.len(), 2);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, TidemarkError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Split a newline-delimited input into its non-blank, trimmed lines.
///
/// # Examples
///
/// ```
/// use tidemark_core::split_lines;
///
/// assert_eq!(split_lines("src/*.js\n\n  docs/**  \n"), vec!["src/*.js", "docs/**"]);
/// assert!(split_lines("   ").is_empty());
/// ```
pub fn split_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = TidemarkConfig::from_toml("").unwrap();
        assert_eq!(config, TidemarkConfig::default());
    }

    #[test]
    fn full_toml_parses() {
        let config = TidemarkConfig::from_toml(
            r#"
workflow = "build.yml"
filter = ["crates/**/*.rs"]
default_branch = "trunk"
api_url = "https://ghe.example.com/api/v3"
"#,
        )
        .unwrap();
        assert_eq!(config.workflow.as_deref(), Some("build.yml"));
        assert_eq!(config.filter, vec!["crates/**/*.rs"]);
        assert_eq!(config.default_branch.as_deref(), Some("trunk"));
        assert_eq!(
            config.api_url.as_deref(),
            Some("https://ghe.example.com/api/v3")
        );
    }

    #[test]
    fn invalid_toml_is_rejected() {
        let err = TidemarkConfig::from_toml("filter = 3").unwrap_err();
        assert!(matches!(err, TidemarkError::Toml(_)));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".tidemark.toml");
        std::fs::write(&path, "workflow = \"ci.yml\"\n").unwrap();
        let config = TidemarkConfig::from_file(&path).unwrap();
        assert_eq!(config.workflow.as_deref(), Some("ci.yml"));
    }

    #[test]
    fn from_file_missing_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = TidemarkConfig::from_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, TidemarkError::FileNotFound(_)));
    }

    #[test]
    fn split_lines_handles_crlf() {
        assert_eq!(split_lines("a\r\nb\r\n"), vec!["a", "b"]);
    }
}
