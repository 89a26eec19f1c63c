//! Making sure enough history is present, then listing changed paths.

use tidemark_core::{Result, Revision};
use tracing::{debug, error, info};

use crate::Vcs;

/// Computes the raw changed-path list between two revisions.
///
/// Call [`ensure_full_history`](Self::ensure_full_history) before
/// [`diff_paths`](Self::diff_paths); both failures are fatal to the run.
///
/// # Examples
///
/// ```
/// use tidemark_core::Revision;
/// use tidemark_vcs::{fake::FakeVcs, DiffEngine};
///
/// let vcs = FakeVcs::new().with_diff_output("a.txt\n\nb/c.txt\n  \n");
/// let engine = DiffEngine::new(&vcs);
/// engine.ensure_full_history().unwrap();
/// let paths = engine.diff_paths(&Revision::new("abc123"), "def456").unwrap();
/// assert_eq!(paths, vec!["a.txt", "b/c.txt"]);
/// ```
pub struct DiffEngine<'a> {
    vcs: &'a dyn Vcs,
}

impl<'a> DiffEngine<'a> {
    /// Wrap a VCS capability.
    pub fn new(vcs: &'a dyn Vcs) -> Self {
        Self { vcs }
    }

    /// Unshallow the clone if its history is truncated.
    ///
    /// Returns `true` if a fetch was performed.
    ///
    /// # Errors
    ///
    /// Propagates any error from the shallowness check or the fetch.
    pub fn ensure_full_history(&self) -> Result<bool> {
        let shallow = self.vcs.is_shallow().inspect_err(|e| {
            error!(error = %e, "could not determine whether the clone is shallow");
        })?;

        if !shallow {
            debug!("history already complete");
            return Ok(false);
        }

        info!("shallow clone detected, fetching full history");
        self.vcs.unshallow().inspect_err(|e| {
            error!(error = %e, "unshallow fetch failed");
        })?;
        Ok(true)
    }

    /// Changed paths between `base` and `current`, in diff order.
    ///
    /// # Errors
    ///
    /// Propagates the diff command's error verbatim.
    pub fn diff_paths(&self, base: &Revision, current: &str) -> Result<Vec<String>> {
        let out = self
            .vcs
            .diff_names(base.as_str(), current)
            .inspect_err(|e| error!(error = %e, base = %base, current, "diff failed"))?;
        let paths = parse_name_only(&out);
        info!(base = %base, current, count = paths.len(), "diff computed");
        Ok(paths)
    }
}

/// Split `--name-only` output into trimmed, non-empty paths.
///
/// # Examples
///
/// ```
/// use tidemark_vcs::parse_name_only;
///
/// assert_eq!(parse_name_only("a.txt\r\n\n  b.txt \n"), vec!["a.txt", "b.txt"]);
/// ```
pub fn parse_name_only(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeVcs, VcsCall};

    #[test]
    fn shallow_clone_is_unshallowed_once() {
        let vcs = FakeVcs::new().shallow(true);
        let engine = DiffEngine::new(&vcs);

        assert!(engine.ensure_full_history().unwrap());
        assert_eq!(vcs.calls(), vec![VcsCall::IsShallow, VcsCall::Unshallow]);
    }

    #[test]
    fn full_clone_never_fetches() {
        let vcs = FakeVcs::new();
        let engine = DiffEngine::new(&vcs);

        assert!(!engine.ensure_full_history().unwrap());
        assert_eq!(vcs.calls(), vec![VcsCall::IsShallow]);
    }

    #[test]
    fn unshallow_failure_is_fatal() {
        let vcs = FakeVcs::new().shallow(true).failing(VcsCall::Unshallow);
        let engine = DiffEngine::new(&vcs);
        assert!(engine.ensure_full_history().is_err());
    }

    #[test]
    fn diff_strips_blank_entries() {
        let vcs = FakeVcs::new().with_diff_output("a.txt\n\nb/c.txt\n  \n");
        let engine = DiffEngine::new(&vcs);

        let paths = engine
            .diff_paths(&Revision::new("abc123"), "def456")
            .unwrap();
        assert_eq!(paths, vec!["a.txt", "b/c.txt"]);
        assert_eq!(
            vcs.calls(),
            vec![VcsCall::DiffNames("abc123".into(), "def456".into())]
        );
    }

    #[test]
    fn diff_failure_propagates() {
        let vcs = FakeVcs::new().failing(VcsCall::DiffNames(String::new(), String::new()));
        let engine = DiffEngine::new(&vcs);
        let err = engine
            .diff_paths(&Revision::new("abc123"), "def456")
            .unwrap_err();
        assert!(err.to_string().contains("diff"));
    }

    #[test]
    fn parse_name_only_preserves_order() {
        assert_eq!(
            parse_name_only("z.rs\na.rs\nm.rs\n"),
            vec!["z.rs", "a.rs", "m.rs"]
        );
    }
}
