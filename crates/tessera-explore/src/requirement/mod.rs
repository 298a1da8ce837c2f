//! Coverage requirements: progress toward a test goal, with speculative
//! save/restore for lookahead search.
//!
//! `push` hands out a [`Checkpoint`] that `pop` consumes. Checkpoints cannot
//! be cloned, so a checkpoint is restored at most once and nothing can be
//! popped that was never pushed. Restoring out of order is detected by depth.

pub mod action_coverage;
pub mod combined;
pub mod null;
pub mod sequence;

use tessera_ir::action::{Action, ActionCode};
use tessera_ir::pattern::{ActionPattern, PatternError};
use tessera_ir::sequence::SequenceError;
use tessera_model::Transition;

pub use action_coverage::ActionCoverageRequirement;
pub use combined::AllOf;
pub use null::NullRequirement;
pub use sequence::SequenceRequirement;

#[derive(Debug, thiserror::Error)]
pub enum RequirementError {
    #[error("checkpoint for depth {got} handed back at stack depth {expected}")]
    CheckpointMismatch { expected: usize, got: usize },

    #[error("pop on an empty snapshot stack")]
    EmptyStack,

    #[error("requirement '{0}' matches no actions")]
    NoTargets(String),

    #[error("combined requirement has no children")]
    NoChildren,

    #[error("Invalid sequence: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] PatternError),
}

/// Token returned by [`Requirement::push`].
#[must_use = "a checkpoint must be handed back to pop()"]
#[derive(Debug)]
pub struct Checkpoint {
    depth: usize,
}

impl Checkpoint {
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Saved snapshots behind [`Checkpoint`] tokens.
#[derive(Debug, Clone)]
pub struct SnapshotStack<T> {
    saved: Vec<T>,
}

impl<T> SnapshotStack<T> {
    pub fn new() -> Self {
        Self { saved: Vec::new() }
    }

    pub fn push(&mut self, snapshot: T) -> Checkpoint {
        self.saved.push(snapshot);
        Checkpoint {
            depth: self.saved.len(),
        }
    }

    /// Take back the snapshot saved for `checkpoint`, which must be the most
    /// recent one.
    pub fn pop(&mut self, checkpoint: Checkpoint) -> Result<T, RequirementError> {
        if checkpoint.depth != self.saved.len() {
            return Err(RequirementError::CheckpointMismatch {
                expected: self.saved.len(),
                got: checkpoint.depth,
            });
        }
        self.saved.pop().ok_or(RequirementError::EmptyStack)
    }

    /// The snapshot `pop` would return, without taking it.
    pub fn peek(&self, checkpoint: &Checkpoint) -> Result<&T, RequirementError> {
        if checkpoint.depth != self.saved.len() {
            return Err(RequirementError::CheckpointMismatch {
                expected: self.saved.len(),
                got: checkpoint.depth,
            });
        }
        self.saved.last().ok_or(RequirementError::EmptyStack)
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

impl<T> Default for SnapshotStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Which actions a requirement would like to see next.
#[derive(Debug, Clone)]
pub enum ActionMatcher {
    Code(ActionCode),
    Pattern(ActionPattern),
}

impl ActionMatcher {
    pub fn matches(&self, action: &Action) -> bool {
        match self {
            ActionMatcher::Code(code) => action.code() == *code,
            ActionMatcher::Pattern(pattern) => pattern.matches(action.name()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionHint {
    pub preferred: Vec<ActionMatcher>,
    /// How strongly to follow the hint, in `[0, 1]`.
    pub weight: f64,
}

impl ExecutionHint {
    pub fn prefers(&self, action: &Action) -> bool {
        self.preferred.iter().any(|m| m.matches(action))
    }
}

/// A trackable test goal.
///
/// `mark_executed` is called once per transition actually executed against
/// the system under test. Between a `push` and its `pop` it may also be
/// called for hypothetical transitions; `pop` undoes them.
pub trait Requirement<S> {
    fn name(&self) -> &str;

    fn mark_executed(&mut self, transition: &Transition<S>);

    /// Progress in `[0, 1]`. Never decreases along a forward run.
    fn percentage(&self) -> f64;

    fn execution_hint(&self) -> Option<ExecutionHint> {
        None
    }

    fn push(&mut self) -> Checkpoint;

    fn pop(&mut self, checkpoint: Checkpoint) -> Result<(), RequirementError>;

    /// Number of outstanding checkpoints.
    fn depth(&self) -> usize;

    fn is_complete(&self) -> bool {
        self.percentage() >= 1.0
    }
}
