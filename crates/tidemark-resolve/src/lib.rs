//! Base-revision resolution: the fallback chain that decides which historical
//! commit the current run is diffed against.
//!
//! For a branch push the chain is: last successful run of the configured
//! workflow, then the branch's merge-base with the default branch, then the
//! empty tree. Pull requests skip the first stage and use the merge-base of
//! their base and head refs. Any other trigger is unresolvable.

pub mod resolver;
pub mod stage;

pub use resolver::{latest_run, RevisionResolver};
pub use stage::{plan, Stage};
