//! Loading the [`TriggerContext`] from a GitHub Actions style environment.

use std::path::Path;

use serde::Deserialize;

use crate::error::TidemarkError;
use crate::types::{EventKind, TriggerContext};

/// Commit id GitHub reports as `after` when a branch is deleted.
const NULL_SHA: &str = "0000000000000000000000000000000000000000";

/// Raw environment values a context is built from.
///
/// Separated from [`TriggerContext::from_env`] so fixtures can be built
/// without touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct EventEnv {
    /// `GITHUB_EVENT_NAME`.
    pub event_name: Option<String>,
    /// `GITHUB_REF`.
    pub git_ref: Option<String>,
    /// `GITHUB_SHA`.
    pub sha: Option<String>,
    /// `GITHUB_REPOSITORY` (`owner/repo`).
    pub repository: Option<String>,
    /// Contents of the file at `GITHUB_EVENT_PATH`.
    pub payload: Option<String>,
}

impl EventEnv {
    /// Capture the relevant variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Io`] if `GITHUB_EVENT_PATH` names a file that
    /// exists but cannot be read.
    pub fn capture() -> Result<Self, TidemarkError> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let payload = match var("GITHUB_EVENT_PATH") {
            Some(path) if Path::new(&path).exists() => Some(std::fs::read_to_string(path)?),
            _ => None,
        };

        Ok(Self {
            event_name: var("GITHUB_EVENT_NAME"),
            git_ref: var("GITHUB_REF"),
            sha: var("GITHUB_SHA"),
            repository: var("GITHUB_REPOSITORY"),
            payload,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    after: Option<String>,
    repository: Option<PayloadRepository>,
    pull_request: Option<PayloadPullRequest>,
}

#[derive(Debug, Deserialize)]
struct PayloadRepository {
    name: Option<String>,
    default_branch: Option<String>,
    owner: Option<PayloadOwner>,
}

#[derive(Debug, Deserialize)]
struct PayloadOwner {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PayloadPullRequest {
    base: PayloadBranch,
    head: PayloadBranch,
}

#[derive(Debug, Deserialize)]
struct PayloadBranch {
    #[serde(rename = "ref")]
    git_ref: String,
    sha: Option<String>,
}

impl TriggerContext {
    /// Build the context from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Context`] if the event payload is not valid
    /// JSON, or [`TidemarkError::Io`] if it cannot be read.
    pub fn from_env() -> Result<Self, TidemarkError> {
        Self::from_event_env(&EventEnv::capture()?)
    }

    /// Build the context from captured environment values.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Context`] if the payload is not valid JSON.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidemark_core::{EventEnv, EventKind, TriggerContext};
    ///
    /// let env = EventEnv {
    ///     event_name: Some("push".into()),
    ///     git_ref: Some("refs/heads/dev".into()),
    ///     sha: Some("def456".into()),
    ///     repository: Some("octocat/hello".into()),
    ///     payload: Some(r#"{"after":"def456","repository":{"default_branch":"main"}}"#.into()),
    /// };
    /// let ctx = TriggerContext::from_event_env(&env).unwrap();
    /// assert_eq!(ctx.event, EventKind::Push);
    /// assert_eq!(ctx.branch(), Some("dev"));
    /// assert_eq!(ctx.master_branch.as_deref(), Some("main"));
    /// assert_eq!(ctx.owner.as_deref(), Some("octocat"));
    /// ```
    pub fn from_event_env(env: &EventEnv) -> Result<Self, TidemarkError> {
        let payload: EventPayload = match env.payload.as_deref() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)
                .map_err(|e| TidemarkError::Context(format!("invalid event payload: {e}")))?,
            _ => EventPayload::default(),
        };

        let event = EventKind::from_name(env.event_name.as_deref().unwrap_or_default());

        let (base_ref, head_ref, head_sha) = match payload.pull_request {
            Some(pr) => (Some(pr.base.git_ref), Some(pr.head.git_ref), pr.head.sha),
            None => (None, None, None),
        };

        let pushed = payload.after.filter(|sha| sha != NULL_SHA);
        let after = match event {
            EventKind::Push => pushed.or_else(|| env.sha.clone()),
            EventKind::PullRequest => head_sha.or_else(|| env.sha.clone()),
            EventKind::Other(_) => env.sha.clone(),
        };

        let (mut owner, mut repo) = match env.repository.as_deref().and_then(|r| r.split_once('/'))
        {
            Some((o, r)) => (Some(o.to_string()), Some(r.to_string())),
            None => (None, None),
        };

        let mut master_branch = None;
        if let Some(repository) = payload.repository {
            master_branch = repository.default_branch;
            if repo.is_none() {
                repo = repository.name;
            }
            if owner.is_none() {
                owner = repository.owner.and_then(|o| o.login);
            }
        }

        Ok(Self {
            event,
            git_ref: env.git_ref.clone(),
            after,
            master_branch,
            base_ref,
            head_ref,
            owner,
            repo,
        })
    }
}
