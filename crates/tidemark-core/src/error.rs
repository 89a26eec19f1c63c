use std::path::PathBuf;

/// Errors that can occur while computing the changed files of a run.
///
/// Library crates return this type directly; the binary crate converts it
/// into a `miette` report at the boundary.
///
/// # Examples
///
/// ```
/// use tidemark_core::TidemarkError;
///
/// let err = TidemarkError::Config("access-token is required".into());
/// assert!(err.to_string().contains("access-token"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum TidemarkError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(tidemark::io))]
    Io(#[from] std::io::Error),

    /// Missing or invalid input.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(tidemark::config),
        help("inputs are read from flags, INPUT_<NAME> variables, or .tidemark.toml")
    )]
    Config(String),

    /// The CI event context could not be read.
    #[error("event context error: {0}")]
    #[diagnostic(code(tidemark::context))]
    Context(String),

    /// A git command ran but reported failure.
    #[error("git {command} failed: {stderr}")]
    #[diagnostic(code(tidemark::git))]
    Git {
        /// The git subcommand and arguments, space separated.
        command: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// An external command could not be started at all.
    #[error("failed to run {program}: {source}")]
    #[diagnostic(code(tidemark::spawn), help("is git installed and on PATH?"))]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The workflow run API failed or returned unusable data.
    #[error("run metadata error: {0}")]
    #[diagnostic(code(tidemark::api))]
    Api(String),

    /// No base revision could be determined for this trigger.
    #[error("failed to get start or endpoint for diff")]
    #[diagnostic(code(tidemark::unresolved))]
    Unresolved,

    /// A filter glob could not be compiled.
    #[error("invalid filter pattern '{pattern}': {reason}")]
    #[diagnostic(code(tidemark::pattern))]
    Pattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(tidemark::serialization))]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(tidemark::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(tidemark::file_not_found))]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TidemarkError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = TidemarkError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn unresolved_uses_fixed_message() {
        assert_eq!(
            TidemarkError::Unresolved.to_string(),
            "failed to get start or endpoint for diff"
        );
    }

    #[test]
    fn git_error_surfaces_stderr_verbatim() {
        let err = TidemarkError::Git {
            command: "diff --name-only a b".into(),
            stderr: "fatal: bad revision 'a'".into(),
        };
        assert_eq!(
            err.to_string(),
            "git diff --name-only a b failed: fatal: bad revision 'a'"
        );
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = TidemarkError::FileNotFound(PathBuf::from("/tmp/event.json"));
        assert!(err.to_string().contains("/tmp/event.json"));
    }
}
