//! The end-to-end run: trigger context in, changed paths out.

use std::fmt;
use std::io::Write;

use tidemark_core::{Result, TidemarkError, TriggerContext};
use tidemark_filter::PathFilter;
use tidemark_resolve::RevisionResolver;
use tidemark_runs::RunProvider;
use tidemark_vcs::{DiffEngine, Vcs};
use tracing::info;

use crate::commands::Workflow;

/// Labeled step of a run, shown as a log group and as the title of the
/// error annotation when the step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reading flags, inputs, and the config file.
    Inputs,
    /// Reading the triggering event.
    Context,
    /// Making sure history is complete.
    History,
    /// Finding the base revision.
    Resolve,
    /// Listing changed paths.
    Diff,
    /// Applying glob patterns.
    Filter,
    /// Publishing outputs.
    Output,
}

impl Phase {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Inputs => "Reading inputs",
            Phase::Context => "Reading event context",
            Phase::History => "Fetching full history",
            Phase::Resolve => "Resolving base revision",
            Phase::Diff => "Listing changed files",
            Phase::Filter => "Filtering changed files",
            Phase::Output => "Writing outputs",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fatal error together with the phase it happened in.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{phase}: {source}")]
#[diagnostic(code(tidemark::run_failed))]
pub struct PhaseError {
    /// Phase that was executing.
    pub phase: Phase,
    /// Underlying failure.
    #[source]
    pub source: TidemarkError,
}

impl PhaseError {
    /// Attach `phase` to `source`.
    pub fn new(phase: Phase, source: impl Into<TidemarkError>) -> Self {
        Self {
            phase,
            source: source.into(),
        }
    }
}

/// Tag a result with the phase it belongs to.
pub trait AtPhase<T> {
    /// Wrap an error as a [`PhaseError`] for `phase`.
    fn at(self, phase: Phase) -> std::result::Result<T, PhaseError>;
}

impl<T, E: Into<TidemarkError>> AtPhase<T> for std::result::Result<T, E> {
    fn at(self, phase: Phase) -> std::result::Result<T, PhaseError> {
        self.map_err(|e| PhaseError::new(phase, e))
    }
}

/// Trigger context to filtered changed paths.
///
/// # Examples
///
/// ```
/// use tidemark_action::{Pipeline, Workflow};
/// use tidemark_core::{EventKind, TriggerContext};
/// use tidemark_vcs::fake::FakeVcs;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let vcs = FakeVcs::new()
///     .with_merge_base("main", "feature", "abc123")
///     .with_diff_output("src/lib.rs\nREADME.md\n");
/// let ctx = TriggerContext::new(EventKind::Push)
///     .with_ref("refs/heads/feature")
///     .with_after("def456")
///     .with_default_branch("main");
///
/// let mut wf = Workflow::new(Vec::new(), None);
/// let files = Pipeline::new(&vcs).run(&ctx, &mut wf).await.unwrap();
/// assert_eq!(files, vec!["src/lib.rs", "README.md"]);
/// # }
/// ```
pub struct Pipeline<'a> {
    vcs: &'a dyn Vcs,
    runs: Option<&'a dyn RunProvider>,
    workflow: Option<String>,
    filter: PathFilter,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with no run lookup and no filter.
    pub fn new(vcs: &'a dyn Vcs) -> Self {
        Self {
            vcs,
            runs: None,
            workflow: None,
            filter: PathFilter::default(),
        }
    }

    /// Enable the last-successful-run stage.
    pub fn with_runs(mut self, runs: &'a dyn RunProvider, workflow: Option<&str>) -> Self {
        self.runs = Some(runs);
        self.workflow = workflow.map(str::to_string);
        self
    }

    /// Narrow results with `filter`.
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Compute the changed paths for `ctx`, logging each phase as a group.
    ///
    /// # Errors
    ///
    /// Returns a [`PhaseError`] naming the phase that failed. Unresolvable
    /// triggers fail in [`Phase::Resolve`] before any VCS command runs.
    pub async fn run<W: Write>(
        &self,
        ctx: &TriggerContext,
        wf: &mut Workflow<W>,
    ) -> std::result::Result<Vec<String>, PhaseError> {
        if !ctx.is_resolvable() {
            return Err(PhaseError::new(Phase::Resolve, TidemarkError::Unresolved));
        }
        let current = ctx
            .after
            .as_deref()
            .ok_or(TidemarkError::Unresolved)
            .at(Phase::Resolve)?;

        let engine = DiffEngine::new(self.vcs);

        grouped(wf, Phase::History, || engine.ensure_full_history())?;

        wf.group(Phase::Resolve.label()).at(Phase::Resolve)?;
        let mut resolver = RevisionResolver::new(self.vcs);
        if let Some(runs) = self.runs {
            resolver = resolver.with_runs(runs, self.workflow.as_deref());
        }
        let base = resolver.resolve_base(ctx).await;
        wf.end_group().at(Phase::Resolve)?;
        let base = base.at(Phase::Resolve)?;

        let paths = grouped(wf, Phase::Diff, || engine.diff_paths(&base, current))?;

        if self.filter.is_disabled() {
            return Ok(paths);
        }

        grouped(wf, Phase::Filter, || {
            let total = paths.len();
            let kept = self.filter.apply(paths);
            info!(total, kept = kept.len(), "filter applied");
            Ok(kept)
        })
    }
}

fn grouped<W: Write, T>(
    wf: &mut Workflow<W>,
    phase: Phase,
    step: impl FnOnce() -> Result<T>,
) -> std::result::Result<T, PhaseError> {
    wf.group(phase.label()).at(phase)?;
    let result = step();
    wf.end_group().at(phase)?;
    result.at(phase)
}
