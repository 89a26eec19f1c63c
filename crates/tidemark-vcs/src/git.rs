//! [`Vcs`] implementation that shells out to the `git` binary.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tidemark_core::{Result, TidemarkError};
use tracing::debug;

use crate::Vcs;

/// Runs git subcommands inside a working directory.
///
/// # Examples
///
/// ```no_run
/// use tidemark_vcs::{GitCli, Vcs};
///
/// let git = GitCli::new(".");
/// if git.is_shallow().unwrap() {
///     git.unshallow().unwrap();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Create a runner rooted at `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Run `git <args>` and return its stdout.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Spawn`] if git cannot be started, or
    /// [`TidemarkError::Git`] with the captured stderr if it exits non-zero.
    pub fn run(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        debug!(command = %command, "running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| TidemarkError::Spawn {
                program: "git".into(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(TidemarkError::Git { command, stderr });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Vcs for GitCli {
    fn is_shallow(&self) -> Result<bool> {
        let out = self.run(&["rev-parse", "--is-shallow-repository"])?;
        Ok(out.trim() == "true")
    }

    fn unshallow(&self) -> Result<()> {
        self.run(&["fetch", "--prune", "--unshallow"])?;
        Ok(())
    }

    fn create_local_branch(&self, branch: &str) -> Result<()> {
        let upstream = format!("origin/{branch}");
        self.run(&["branch", "--track", branch, &upstream])?;
        Ok(())
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        let out = self.run(&["merge-base", a, b])?;
        Ok(out.trim().to_string())
    }

    fn hash_empty_tree(&self) -> Result<String> {
        // stdin is null, so this hashes zero bytes as a tree object.
        let out = self.run(&["hash-object", "-t", "tree", "--stdin"])?;
        Ok(out.trim().to_string())
    }

    fn create_tag(&self, name: &str, target: &str) -> Result<()> {
        self.run(&["tag", "-f", name, target])?;
        Ok(())
    }

    fn diff_names(&self, base: &str, current: &str) -> Result<String> {
        // Unquoted, so non-ASCII paths come back verbatim.
        self.run(&[
            "-c",
            "core.quotePath=false",
            "diff",
            "--name-only",
            base,
            current,
        ])
    }
}
