use tidemark_core::{Result, Revision, RevisionPair, TidemarkError, TriggerContext, WorkflowRun};
use tidemark_runs::{RunProvider, RunQuery};
use tidemark_vcs::{Vcs, EMPTY_TAG};
use tracing::{error, info, info_span, warn, Instrument};

use crate::stage::{plan, Stage};

/// Resolves the base revision a run is diffed against.
///
/// Stages from [`plan`] are attempted in order and the first one that yields
/// a revision wins. A failing stage is logged and skipped; it never aborts
/// the chain.
///
/// # Examples
///
/// ```
/// use tidemark_core::{EventKind, TriggerContext};
/// use tidemark_resolve::RevisionResolver;
/// use tidemark_vcs::fake::FakeVcs;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let vcs = FakeVcs::new().with_merge_base("main", "feature", "abc123");
/// let ctx = TriggerContext::new(EventKind::Push)
///     .with_ref("refs/heads/feature")
///     .with_default_branch("main");
///
/// let resolver = RevisionResolver::new(&vcs);
/// let base = resolver.resolve_base(&ctx).await.unwrap();
/// assert_eq!(base.as_str(), "abc123");
/// # }
/// ```
pub struct RevisionResolver<'a> {
    vcs: &'a dyn Vcs,
    runs: Option<&'a dyn RunProvider>,
    workflow: Option<String>,
}

impl<'a> RevisionResolver<'a> {
    /// Resolver without a run-metadata provider.
    pub fn new(vcs: &'a dyn Vcs) -> Self {
        Self {
            vcs,
            runs: None,
            workflow: None,
        }
    }

    /// Enable the last-successful-run stage for `workflow`.
    pub fn with_runs(mut self, runs: &'a dyn RunProvider, workflow: Option<&str>) -> Self {
        self.runs = Some(runs);
        self.workflow = workflow
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string);
        self
    }

    /// Resolve the base revision for `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`TidemarkError::Unresolved`] if the trigger is neither a
    /// branch push nor a pull request, or every stage yields nothing.
    pub async fn resolve_base(&self, ctx: &TriggerContext) -> Result<Revision> {
        let stages = plan(ctx, self.workflow.as_deref());
        if stages.is_empty() {
            warn!(
                event = %ctx.event,
                git_ref = ?ctx.git_ref,
                "trigger has no branch and is not a pull request"
            );
            return Err(TidemarkError::Unresolved);
        }

        for stage in &stages {
            let span = info_span!("stage", name = stage.name());
            if let Some(base) = self.attempt(stage).instrument(span).await {
                info!(stage = stage.name(), base = %base, "base revision resolved");
                return Ok(base);
            }
        }

        error!("every resolution stage came up empty");
        Err(TidemarkError::Unresolved)
    }

    /// Run a single stage. `None` means "try the next one".
    pub async fn attempt(&self, stage: &Stage) -> Option<Revision> {
        match stage {
            Stage::LastSuccessfulRun(query) => self.last_successful_run(query.as_ref()).await,
            Stage::BranchDeviation { pair, track_base } => {
                self.branch_deviation(pair.as_ref(), *track_base)
            }
            Stage::EmptyTree => self.empty_tree(),
        }
    }

    async fn last_successful_run(&self, query: Option<&RunQuery>) -> Option<Revision> {
        let (Some(runs), Some(query)) = (self.runs, query) else {
            info!("no workflow configured, skipping");
            return None;
        };

        let found = match runs.list_runs(query).await {
            Ok(found) => found,
            Err(e) => {
                error!(error = %e, workflow = %query.workflow, "listing workflow runs failed");
                return None;
            }
        };

        match latest_run(&found) {
            Some(run) => {
                info!(
                    run = run.id,
                    head = %run.head_sha,
                    at = %run.head_commit_timestamp,
                    "last successful run"
                );
                Some(Revision::new(run.head_sha.clone()))
            }
            None => {
                info!(
                    branch = %query.branch,
                    workflow = %query.workflow,
                    "no successful runs on branch"
                );
                None
            }
        }
    }

    fn branch_deviation(&self, pair: Option<&RevisionPair>, track_base: bool) -> Option<Revision> {
        let Some(pair) = pair else {
            info!("base or split ref unknown, skipping");
            return None;
        };

        info!("merge-base of '{}' and '{}'", pair.base, pair.split);

        if track_base {
            // The ref may already exist locally; merge-base decides.
            if let Err(e) = self.vcs.create_local_branch(&pair.base) {
                warn!(error = %e, branch = %pair.base, "could not create local branch");
            }
        }

        match self.vcs.merge_base(&pair.base, &pair.split) {
            Ok(base) if !base.is_empty() => Some(Revision::new(base)),
            Ok(_) => {
                warn!("merge-base printed nothing");
                None
            }
            Err(e) => {
                error!(error = %e, "merge-base failed");
                None
            }
        }
    }

    fn empty_tree(&self) -> Option<Revision> {
        let tree = match self.vcs.hash_empty_tree() {
            Ok(tree) => tree,
            Err(e) => {
                error!(error = %e, "could not hash the empty tree");
                return None;
            }
        };

        if let Err(e) = self.vcs.create_tag(EMPTY_TAG, &tree) {
            error!(error = %e, tree = %tree, "could not tag the empty tree");
            return None;
        }

        info!(tag = EMPTY_TAG, tree = %tree, "diffing against the empty tree");
        Some(Revision::new(EMPTY_TAG))
    }
}

/// The run with the latest head-commit timestamp; ties keep the first seen.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use tidemark_core::WorkflowRun;
/// use tidemark_resolve::latest_run;
///
/// let run = |id, hour| WorkflowRun {
///     id,
///     status: "completed".into(),
///     conclusion: Some("success".into()),
///     head_sha: format!("sha{id}"),
///     head_commit_timestamp: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
/// };
/// let runs = vec![run(1, 9), run(2, 17), run(3, 12)];
/// assert_eq!(latest_run(&runs).unwrap().id, 2);
/// assert!(latest_run(&[]).is_none());
/// ```
pub fn latest_run(runs: &[WorkflowRun]) -> Option<&WorkflowRun> {
    runs.iter().fold(None, |best: Option<&WorkflowRun>, run| match best {
        Some(b) if b.head_commit_timestamp >= run.head_commit_timestamp => Some(b),
        _ => Some(run),
    })
}
