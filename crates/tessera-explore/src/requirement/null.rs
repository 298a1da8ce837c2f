use tessera_model::Transition;
use tracing::warn;

use super::{Checkpoint, Requirement, RequirementError, SnapshotStack};

/// The requirement used when none is configured. Never makes progress.
///
/// Push and pop keep a consistent depth so speculative search still balances,
/// but a warning is logged the first time either is used since any search
/// against it is wasted work.
#[derive(Debug, Default)]
pub struct NullRequirement {
    stack: SnapshotStack<()>,
    warned: bool,
}

impl NullRequirement {
    pub fn new() -> Self {
        Self::default()
    }

    fn warn_once(&mut self) {
        if !self.warned {
            self.warned = true;
            warn!("speculative search against an empty requirement has no effect");
        }
    }

    pub fn has_warned(&self) -> bool {
        self.warned
    }
}

impl<S> Requirement<S> for NullRequirement {
    fn name(&self) -> &str {
        "null"
    }

    fn mark_executed(&mut self, _transition: &Transition<S>) {}

    fn percentage(&self) -> f64 {
        0.0
    }

    fn push(&mut self) -> Checkpoint {
        self.warn_once();
        self.stack.push(())
    }

    fn pop(&mut self, checkpoint: Checkpoint) -> Result<(), RequirementError> {
        self.warn_once();
        self.stack.pop(checkpoint)
    }

    fn depth(&self) -> usize {
        self.stack.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_ir::Action;

    #[test]
    fn test_never_progresses() {
        let mut req = NullRequirement::new();
        let t = Transition {
            source: 0u32,
            action: Action::new(0, "a"),
            dest: 1u32,
        };
        Requirement::<u32>::mark_executed(&mut req, &t);
        assert_eq!(Requirement::<u32>::percentage(&req), 0.0);
        assert!(!Requirement::<u32>::is_complete(&req));
    }

    #[test]
    fn test_push_pop_balanced_and_warns() {
        let mut req = NullRequirement::new();
        assert!(!req.has_warned());
        let cp = Requirement::<u32>::push(&mut req);
        assert!(req.has_warned());
        assert_eq!(Requirement::<u32>::depth(&req), 1);
        Requirement::<u32>::pop(&mut req, cp).unwrap();
        assert_eq!(Requirement::<u32>::depth(&req), 0);
    }
}
