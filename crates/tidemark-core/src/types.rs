use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of event that triggered the CI run.
///
/// # Examples
///
/// ```
/// use tidemark_core::EventKind;
///
/// assert_eq!(EventKind::from_name("push"), EventKind::Push);
/// assert_eq!(EventKind::from_name("pull_request_target"), EventKind::PullRequest);
/// assert_eq!(EventKind::from_name("schedule"), EventKind::Other("schedule".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Commits pushed to a ref.
    Push,
    /// A pull request was opened or updated.
    PullRequest,
    /// Any other event (`schedule`, `workflow_dispatch`, ...).
    Other(String),
}

impl EventKind {
    /// Classify a CI event name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "push" => EventKind::Push,
            "pull_request" | "pull_request_target" => EventKind::PullRequest,
            other => EventKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Push => write!(f, "push"),
            EventKind::PullRequest => write!(f, "pull_request"),
            EventKind::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Immutable snapshot of the run that is being diffed.
///
/// Built once at startup, either from the CI environment (see
/// [`TriggerContext::from_env`](crate::TriggerContext::from_env)) or directly
/// for tests.
///
/// # Examples
///
/// ```
/// use tidemark_core::{EventKind, TriggerContext};
///
/// let ctx = TriggerContext::new(EventKind::Push)
///     .with_ref("refs/heads/feature/login")
///     .with_after("def456")
///     .with_default_branch("main");
/// assert_eq!(ctx.branch(), Some("feature/login"));
/// assert_eq!(ctx.master_branch.as_deref(), Some("main"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerContext {
    /// Triggering event.
    pub event: EventKind,
    /// Fully qualified ref the run is for (`refs/heads/main`, `refs/pull/7/merge`).
    pub git_ref: Option<String>,
    /// Commit the run is for; the "current" end of the diff.
    pub after: Option<String>,
    /// Default branch of the repository.
    pub master_branch: Option<String>,
    /// Pull request target branch.
    pub base_ref: Option<String>,
    /// Pull request source branch.
    pub head_ref: Option<String>,
    /// Repository owner login.
    pub owner: Option<String>,
    /// Repository name without the owner.
    pub repo: Option<String>,
}

impl TriggerContext {
    /// Create an otherwise empty context for `event`.
    pub fn new(event: EventKind) -> Self {
        Self {
            event,
            git_ref: None,
            after: None,
            master_branch: None,
            base_ref: None,
            head_ref: None,
            owner: None,
            repo: None,
        }
    }

    /// Set the triggering ref.
    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    /// Set the current commit.
    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    /// Set the repository default branch.
    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.master_branch = Some(branch.into());
        self
    }

    /// Set the pull request base and head refs.
    pub fn with_pull_request(
        mut self,
        base_ref: impl Into<String>,
        head_ref: impl Into<String>,
    ) -> Self {
        self.base_ref = Some(base_ref.into());
        self.head_ref = Some(head_ref.into());
        self
    }

    /// Set the repository coordinates.
    pub fn with_repository(
        mut self,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        self.owner = Some(owner.into());
        self.repo = Some(repo.into());
        self
    }

    /// Branch name when the ref is a branch, without the `refs/heads/` prefix.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidemark_core::{EventKind, TriggerContext};
    ///
    /// let tag = TriggerContext::new(EventKind::Push).with_ref("refs/tags/v1.0");
    /// assert_eq!(tag.branch(), None);
    /// ```
    pub fn branch(&self) -> Option<&str> {
        self.git_ref
            .as_deref()
            .and_then(|r| r.strip_prefix("refs/heads/"))
            .filter(|b| !b.is_empty())
    }

    /// Whether a base revision can be resolved at all for this trigger.
    ///
    /// True for branch pushes and pull requests.
    pub fn is_resolvable(&self) -> bool {
        self.branch().is_some() || self.event == EventKind::PullRequest
    }
}

/// A past pipeline execution as reported by the run-metadata provider.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tidemark_core::WorkflowRun;
///
/// let run = WorkflowRun {
///     id: 42,
///     status: "completed".into(),
///     conclusion: Some("success".into()),
///     head_sha: "abc123".into(),
///     head_commit_timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
/// };
/// assert_eq!(run.head_sha, "abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    /// Provider-assigned run id.
    pub id: u64,
    /// Run status (`completed`, `in_progress`, ...).
    pub status: String,
    /// Final conclusion once completed (`success`, `failure`, ...).
    pub conclusion: Option<String>,
    /// Commit the run built.
    pub head_sha: String,
    /// Timestamp of the head commit.
    pub head_commit_timestamp: DateTime<Utc>,
}

/// Two ref names whose common ancestor is sought.
///
/// # Examples
///
/// ```
/// use tidemark_core::RevisionPair;
///
/// let pair = RevisionPair::new("main", "feature");
/// assert_eq!(pair.to_string(), "main...feature");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionPair {
    /// Branch the split branched off from.
    pub base: String,
    /// Branch that diverged.
    pub split: String,
}

impl RevisionPair {
    /// Create a pair from two ref names.
    pub fn new(base: impl Into<String>, split: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            split: split.into(),
        }
    }
}

impl fmt::Display for RevisionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...{}", self.base, self.split)
    }
}

/// A concrete revision that git can resolve: a commit id, branch, or tag name.
///
/// # Examples
///
/// ```
/// use tidemark_core::Revision;
///
/// let rev = Revision::new("abc123");
/// assert_eq!(rev.as_str(), "abc123");
/// assert_eq!(format!("{rev}"), "abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Wrap a revision string.
    pub fn new(rev: impl Into<String>) -> Self {
        Self(rev.into())
    }

    /// The revision as git understands it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
