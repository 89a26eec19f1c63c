//! Version-control plumbing: the narrow [`Vcs`] capability the resolver and
//! diff engine are written against, its `git` subprocess implementation, and
//! an in-memory fake for tests.

pub mod fake;
pub mod git;
pub mod history;

use tidemark_core::Result;

pub use git::GitCli;
pub use history::{parse_name_only, DiffEngine};

/// Tag name that points at the empty tree.
pub const EMPTY_TAG: &str = "empty";

/// The version-control operations tidemark needs, and nothing more.
///
/// Every call is a single synchronous external invocation returning its text
/// output or an error.
pub trait Vcs: Send + Sync {
    /// Whether the local clone has truncated history.
    fn is_shallow(&self) -> Result<bool>;

    /// Fetch the complete history of a shallow clone.
    fn unshallow(&self) -> Result<()>;

    /// Create a local branch tracking `origin/<branch>`.
    fn create_local_branch(&self, branch: &str) -> Result<()>;

    /// Nearest common ancestor of two revisions.
    fn merge_base(&self, a: &str, b: &str) -> Result<String>;

    /// Object id of the empty tree.
    fn hash_empty_tree(&self) -> Result<String>;

    /// Point tag `name` at `target`, replacing any existing tag.
    fn create_tag(&self, name: &str, target: &str) -> Result<()>;

    /// Raw `--name-only` diff output between two revisions.
    fn diff_names(&self, base: &str, current: &str) -> Result<String>;
}
