//! GitHub Actions workflow commands: log groups, error annotations, outputs.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use tidemark_core::{Result, TidemarkError};

/// Writer for workflow commands.
///
/// Outputs go to the file named by `GITHUB_OUTPUT` when present, otherwise
/// the legacy `::set-output` command is printed.
///
/// # Examples
///
/// ```
/// use tidemark_action::Workflow;
///
/// let mut wf = Workflow::new(Vec::new(), None);
/// wf.group("Listing changed files").unwrap();
/// wf.end_group().unwrap();
/// wf.set_output("files", "a.txt\nb.txt").unwrap();
///
/// let log = String::from_utf8(wf.into_inner()).unwrap();
/// assert!(log.contains("::group::Listing changed files"));
/// assert!(log.contains("::set-output name=files::a.txt%0Ab.txt"));
/// ```
pub struct Workflow<W: Write> {
    out: W,
    output_file: Option<PathBuf>,
}

impl Workflow<io::Stdout> {
    /// Commands to stdout, outputs to `GITHUB_OUTPUT` if set.
    pub fn from_env() -> Self {
        let output_file = std::env::var_os("GITHUB_OUTPUT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(io::stdout(), output_file)
    }
}

impl<W: Write> Workflow<W> {
    /// Commands to `out`, outputs appended to `output_file` if given.
    pub fn new(out: W, output_file: Option<PathBuf>) -> Self {
        Self { out, output_file }
    }

    /// Recover the command writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Open a collapsible log group.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Io`] if the command cannot be written.
    pub fn group(&mut self, name: &str) -> Result<()> {
        writeln!(self.out, "::group::{}", escape_data(name))?;
        Ok(())
    }

    /// Close the current log group.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Io`] if the command cannot be written.
    pub fn end_group(&mut self) -> Result<()> {
        writeln!(self.out, "::endgroup::")?;
        Ok(())
    }

    /// Emit an error annotation, optionally titled.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Io`] if the command cannot be written.
    pub fn error(&mut self, title: Option<&str>, message: &str) -> Result<()> {
        match title {
            Some(title) => writeln!(
                self.out,
                "::error title={}::{}",
                escape_property(title),
                escape_data(message)
            )?,
            None => writeln!(self.out, "::error::{}", escape_data(message))?,
        }
        Ok(())
    }

    /// Set a step output.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Io`] if the output file or command cannot be
    /// written, or [`TidemarkError::Config`] if `name` is not a valid output
    /// name.
    pub fn set_output(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || name.contains(['\n', '\r', '<']) {
            return Err(TidemarkError::Config(format!(
                "invalid output name '{name}'"
            )));
        }

        match &self.output_file {
            Some(path) => {
                let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                write!(file, "{}", file_command(name, value, &delimiter))?;
            }
            None => writeln!(self.out, "::set-output name={name}::{}", escape_data(value))?,
        }
        Ok(())
    }

    /// Publish the changed files as the `files` and `count` outputs.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Io`] if the outputs cannot be written.
    pub fn set_files(&mut self, files: &[String]) -> Result<()> {
        self.set_output("files", &files.join("\n"))?;
        self.set_output("count", &files.len().to_string())
    }

    /// Report a fatal error and publish empty outputs.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Io`] if the commands cannot be written.
    pub fn fail(&mut self, title: Option<&str>, message: &str) -> Result<()> {
        self.error(title, message)?;
        self.set_files(&[])
    }
}

/// Multi-line `name<<delimiter` block for the `GITHUB_OUTPUT` file.
fn file_command(name: &str, value: &str, delimiter: &str) -> String {
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// Escape a command message.
///
/// # Examples
///
/// ```
/// use tidemark_action::commands::escape_data;
///
/// assert_eq!(escape_data("50%\nnext"), "50%25%0Anext");
/// ```
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a command property value.
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}
