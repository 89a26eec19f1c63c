//! The ordered list of stages a trigger is resolved with.

use std::fmt;

use tidemark_core::{EventKind, RevisionPair, TriggerContext};
use tidemark_runs::RunQuery;

/// One attempt in the fallback chain.
///
/// Stages carry everything they need, so planning is pure and every
/// stage can be attempted in isolation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Head commit of the newest successful run; `None` when the workflow,
    /// branch, or repository is unknown.
    LastSuccessfulRun(Option<RunQuery>),
    /// Merge-base of two refs; `None` when either ref is unknown.
    BranchDeviation {
        /// Refs to intersect.
        pair: Option<RevisionPair>,
        /// Create a local branch for `pair.base` from its remote first.
        track_base: bool,
    },
    /// Tag the empty tree and diff against it.
    EmptyTree,
}

impl Stage {
    /// Stable name used for log spans.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::LastSuccessfulRun(_) => "last-successful-run",
            Stage::BranchDeviation { .. } => "branch-deviation",
            Stage::EmptyTree => "empty-tree",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Plan the stages for `ctx`, in the order they must be tried.
///
/// `workflow` enables the last-successful-run stage for branch pushes.
/// An empty plan means the trigger cannot be resolved.
///
/// # Examples
///
/// ```
/// use tidemark_core::{EventKind, TriggerContext};
/// use tidemark_resolve::{plan, Stage};
///
/// let pr = TriggerContext::new(EventKind::PullRequest).with_pull_request("main", "feature");
/// let names: Vec<_> = plan(&pr, Some("ci.yml")).iter().map(Stage::name).collect();
/// assert_eq!(names, ["branch-deviation", "empty-tree"]);
///
/// let cron = TriggerContext::new(EventKind::Other("schedule".into()));
/// assert!(plan(&cron, None).is_empty());
/// ```
pub fn plan(ctx: &TriggerContext, workflow: Option<&str>) -> Vec<Stage> {
    if let Some(branch) = ctx.branch() {
        let query = match (workflow, ctx.owner.as_deref(), ctx.repo.as_deref()) {
            (Some(workflow), Some(owner), Some(repo)) => {
                Some(RunQuery::successful(owner, repo, branch, workflow))
            }
            _ => None,
        };
        let pair = ctx
            .master_branch
            .as_deref()
            .map(|master| RevisionPair::new(master, branch));

        return vec![
            Stage::LastSuccessfulRun(query),
            Stage::BranchDeviation {
                pair,
                track_base: true,
            },
            Stage::EmptyTree,
        ];
    }

    if ctx.event == EventKind::PullRequest {
        let pair = match (ctx.base_ref.as_deref(), ctx.head_ref.as_deref()) {
            (Some(base), Some(head)) => Some(RevisionPair::new(base, head)),
            _ => None,
        };
        return vec![
            Stage::BranchDeviation {
                pair,
                track_base: false,
            },
            Stage::EmptyTree,
        ];
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(branch_ref: &str) -> TriggerContext {
        TriggerContext::new(EventKind::Push)
            .with_ref(branch_ref)
            .with_after("def456")
            .with_default_branch("main")
            .with_repository("octocat", "hello")
    }

    #[test]
    fn branch_push_plans_all_three_stages() {
        let stages = plan(&push("refs/heads/feature"), Some("ci.yml"));
        assert_eq!(
            stages,
            vec![
                Stage::LastSuccessfulRun(Some(RunQuery::successful(
                    "octocat", "hello", "feature", "ci.yml"
                ))),
                Stage::BranchDeviation {
                    pair: Some(RevisionPair::new("main", "feature")),
                    track_base: true,
                },
                Stage::EmptyTree,
            ]
        );
    }

    #[test]
    fn no_workflow_means_no_run_query() {
        let stages = plan(&push("refs/heads/feature"), None);
        assert_eq!(stages[0], Stage::LastSuccessfulRun(None));
    }

    #[test]
    fn unknown_default_branch_means_no_pair() {
        let ctx = TriggerContext::new(EventKind::Push).with_ref("refs/heads/feature");
        let stages = plan(&ctx, None);
        assert_eq!(
            stages[1],
            Stage::BranchDeviation {
                pair: None,
                track_base: true
            }
        );
    }

    #[test]
    fn pull_request_uses_declared_refs_without_tracking() {
        let ctx = TriggerContext::new(EventKind::PullRequest)
            .with_ref("refs/pull/3/merge")
            .with_default_branch("main")
            .with_pull_request("release", "fix");
        let stages = plan(&ctx, Some("ci.yml"));
        assert_eq!(
            stages,
            vec![
                Stage::BranchDeviation {
                    pair: Some(RevisionPair::new("release", "fix")),
                    track_base: false,
                },
                Stage::EmptyTree,
            ]
        );
    }

    #[test]
    fn tag_push_is_unresolvable() {
        assert!(plan(&push("refs/tags/v1.0.0"), Some("ci.yml")).is_empty());
    }

    #[test]
    fn branch_wins_over_event_kind() {
        let ctx = TriggerContext::new(EventKind::Other("workflow_dispatch".into()))
            .with_ref("refs/heads/main");
        assert_eq!(plan(&ctx, None).len(), 3);
    }
}
