//! Run-metadata provider: past executions of a workflow, used to find the
//! last commit that built green on a branch.

pub mod github;

use std::sync::Mutex;

use async_trait::async_trait;
use tidemark_core::{Result, TidemarkError, WorkflowRun};

pub use github::GitHubRuns;

/// Parameters of a run listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunQuery {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch the runs were for.
    pub branch: String,
    /// Workflow file name or numeric id.
    pub workflow: String,
    /// Status filter, e.g. `success`.
    pub status: String,
}

impl RunQuery {
    /// Query for successful runs of `workflow` on `branch`.
    pub fn successful(owner: &str, repo: &str, branch: &str, workflow: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: branch.to_string(),
            workflow: workflow.to_string(),
            status: "success".to_string(),
        }
    }
}

/// Source of past workflow runs.
#[async_trait]
pub trait RunProvider: Send + Sync {
    /// List runs matching `query`, in provider order.
    async fn list_runs(&self, query: &RunQuery) -> Result<Vec<WorkflowRun>>;
}

/// Provider answering every query with a fixed list, recording the queries.
///
/// # Examples
///
/// ```
/// use tidemark_runs::{RunProvider, RunQuery, StaticRuns};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = StaticRuns::new(Vec::new());
/// let query = RunQuery::successful("octocat", "hello", "main", "ci.yml");
/// assert!(provider.list_runs(&query).await.unwrap().is_empty());
/// assert_eq!(provider.queries(), vec![query]);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct StaticRuns {
    runs: Vec<WorkflowRun>,
    error: Option<String>,
    queries: Mutex<Vec<RunQuery>>,
}

impl StaticRuns {
    /// Answer with `runs`.
    pub fn new(runs: Vec<WorkflowRun>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Fail every query with an API error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<RunQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RunProvider for StaticRuns {
    async fn list_runs(&self, query: &RunQuery) -> Result<Vec<WorkflowRun>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }
        match &self.error {
            Some(message) => Err(TidemarkError::Api(message.clone())),
            None => Ok(self.runs.clone()),
        }
    }
}
