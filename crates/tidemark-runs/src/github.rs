use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tidemark_core::{Result, TidemarkError, WorkflowRun};
use tracing::debug;

use crate::{RunProvider, RunQuery};

/// Default REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Largest page the workflow-runs endpoint serves.
const PER_PAGE: u8 = 100;

/// GitHub Actions client for listing workflow runs.
///
/// # Examples
///
/// ```no_run
/// use tidemark_runs::GitHubRuns;
///
/// let runs = GitHubRuns::new("ghp_xxxx", None).unwrap();
/// ```
pub struct GitHubRuns {
    octocrab: octocrab::Octocrab,
}

impl GitHubRuns {
    /// Create a client authenticated with `token`, optionally against a
    /// GitHub Enterprise `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Config`] if the token is blank or the URL is
    /// invalid, or [`TidemarkError::Api`] if the client cannot be built.
    pub fn new(token: &str, api_url: Option<&str>) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(TidemarkError::Config("access-token is empty".into()));
        }

        let mut builder = octocrab::Octocrab::builder().personal_token(token.to_string());
        if let Some(url) = api_url.filter(|u| *u != DEFAULT_API_URL) {
            builder = builder
                .base_uri(url)
                .map_err(|e| TidemarkError::Config(format!("invalid API url '{url}': {e}")))?;
        }

        let octocrab = builder
            .build()
            .map_err(|e| TidemarkError::Api(format!("failed to create GitHub client: {e}")))?;

        Ok(Self { octocrab })
    }
}

#[async_trait]
impl RunProvider for GitHubRuns {
    async fn list_runs(&self, query: &RunQuery) -> Result<Vec<WorkflowRun>> {
        let route = format!(
            "/repos/{}/{}/actions/workflows/{}/runs",
            query.owner, query.repo, query.workflow
        );
        let params = RunsParams {
            branch: &query.branch,
            status: &query.status,
            per_page: PER_PAGE,
        };
        debug!(
            route = %route,
            branch = %query.branch,
            status = %query.status,
            "listing workflow runs"
        );

        let body: serde_json::Value = self
            .octocrab
            .get(route, Some(&params))
            .await
            .map_err(|e| TidemarkError::Api(format!("failed to list workflow runs: {e}")))?;

        runs_from_body(body)
    }
}

#[derive(Serialize)]
struct RunsParams<'a> {
    branch: &'a str,
    status: &'a str,
    per_page: u8,
}

#[derive(Debug, Deserialize)]
struct RunsPage {
    workflow_runs: Vec<RawRun>,
}

#[derive(Debug, Deserialize)]
struct RawRun {
    id: u64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    conclusion: Option<String>,
    head_sha: String,
    #[serde(default)]
    head_commit: Option<RawHeadCommit>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RawHeadCommit {
    timestamp: DateTime<Utc>,
}

impl RunsPage {
    fn into_runs(self) -> Vec<WorkflowRun> {
        self.workflow_runs
            .into_iter()
            .map(|raw| WorkflowRun {
                id: raw.id,
                status: raw.status.unwrap_or_default(),
                conclusion: raw.conclusion,
                head_sha: raw.head_sha,
                head_commit_timestamp: raw
                    .head_commit
                    .map(|c| c.timestamp)
                    .unwrap_or(raw.created_at),
            })
            .collect()
    }
}

/// A body without a `workflow_runs` list (an error object, a bare array)
/// is a serialization error, not an empty page.
fn runs_from_body(body: serde_json::Value) -> Result<Vec<WorkflowRun>> {
    let page: RunsPage = serde_json::from_value(body)?;
    Ok(page.into_runs())
}
