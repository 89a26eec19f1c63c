//! In-memory [`Vcs`] for tests: scripted answers, recorded calls, no processes.

use std::collections::HashMap;
use std::mem::{discriminant, Discriminant};
use std::sync::Mutex;

use tidemark_core::{Result, TidemarkError};

use crate::Vcs;

/// Object id git assigns to the empty tree.
pub const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// One recorded invocation of a [`Vcs`] method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    IsShallow,
    Unshallow,
    CreateLocalBranch(String),
    MergeBase(String, String),
    HashEmptyTree,
    CreateTag(String, String),
    DiffNames(String, String),
}

impl VcsCall {
    fn command(&self) -> String {
        match self {
            VcsCall::IsShallow => "rev-parse --is-shallow-repository".into(),
            VcsCall::Unshallow => "fetch --prune --unshallow".into(),
            VcsCall::CreateLocalBranch(b) => format!("branch --track {b} origin/{b}"),
            VcsCall::MergeBase(a, b) => format!("merge-base {a} {b}"),
            VcsCall::HashEmptyTree => "hash-object -t tree --stdin".into(),
            VcsCall::CreateTag(n, t) => format!("tag -f {n} {t}"),
            VcsCall::DiffNames(a, b) => format!("diff --name-only {a} {b}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Failure {
    Exit,
    Spawn,
}

/// Scripted [`Vcs`] double that records every call.
///
/// # Examples
///
/// ```
/// use tidemark_vcs::fake::{FakeVcs, VcsCall};
/// use tidemark_vcs::Vcs;
///
/// let vcs = FakeVcs::new().with_merge_base("main", "dev", "abc123");
/// assert_eq!(vcs.merge_base("main", "dev").unwrap(), "abc123");
/// assert!(vcs.merge_base("main", "other").is_err());
/// assert_eq!(vcs.calls().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct FakeVcs {
    shallow: bool,
    merge_bases: HashMap<(String, String), String>,
    diff_output: String,
    failures: Vec<(Discriminant<VcsCall>, Failure)>,
    calls: Mutex<Vec<VcsCall>>,
}

impl FakeVcs {
    /// A full, healthy clone with an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the clone as shallow.
    pub fn shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    /// Answer `merge_base(a, b)` with `base`; unscripted pairs fail.
    pub fn with_merge_base(mut self, a: &str, b: &str, base: &str) -> Self {
        self.merge_bases
            .insert((a.to_string(), b.to_string()), base.to_string());
        self
    }

    /// Raw output returned by `diff_names`.
    pub fn with_diff_output(mut self, output: &str) -> Self {
        self.diff_output = output.to_string();
        self
    }

    /// Make every call of the same kind as `call` exit non-zero.
    pub fn failing(mut self, call: VcsCall) -> Self {
        self.failures.push((discriminant(&call), Failure::Exit));
        self
    }

    /// Make every call of the same kind as `call` fail to start.
    pub fn unspawnable(mut self, call: VcsCall) -> Self {
        self.failures.push((discriminant(&call), Failure::Spawn));
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: VcsCall) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }
        let kind = discriminant(&call);
        match self.failures.iter().find(|(k, _)| *k == kind) {
            Some((_, Failure::Exit)) => Err(TidemarkError::Git {
                command: call.command(),
                stderr: "fatal: scripted failure".into(),
            }),
            Some((_, Failure::Spawn)) => Err(TidemarkError::Spawn {
                program: "git".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted"),
            }),
            None => Ok(()),
        }
    }
}

impl Vcs for FakeVcs {
    fn is_shallow(&self) -> Result<bool> {
        self.record(VcsCall::IsShallow)?;
        Ok(self.shallow)
    }

    fn unshallow(&self) -> Result<()> {
        self.record(VcsCall::Unshallow)
    }

    fn create_local_branch(&self, branch: &str) -> Result<()> {
        self.record(VcsCall::CreateLocalBranch(branch.to_string()))
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        let call = VcsCall::MergeBase(a.to_string(), b.to_string());
        self.record(call.clone())?;
        self.merge_bases
            .get(&(a.to_string(), b.to_string()))
            .cloned()
            .ok_or_else(|| TidemarkError::Git {
                command: call.command(),
                stderr: String::new(),
            })
    }

    fn hash_empty_tree(&self) -> Result<String> {
        self.record(VcsCall::HashEmptyTree)?;
        Ok(EMPTY_TREE.to_string())
    }

    fn create_tag(&self, name: &str, target: &str) -> Result<()> {
        self.record(VcsCall::CreateTag(name.to_string(), target.to_string()))
    }

    fn diff_names(&self, base: &str, current: &str) -> Result<String> {
        self.record(VcsCall::DiffNames(base.to_string(), current.to_string()))?;
        Ok(self.diff_output.clone())
    }
}
