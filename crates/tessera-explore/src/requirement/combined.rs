use tessera_model::Transition;

use super::{Checkpoint, ExecutionHint, Requirement, RequirementError, SnapshotStack};

/// All child requirements must be met. Progress is the mean of the children.
///
/// Each checkpoint holds one child checkpoint per child. `pop` checks every
/// child is still at the depth it was pushed at before restoring anything.
pub struct AllOf<S> {
    name: String,
    children: Vec<Box<dyn Requirement<S>>>,
    stack: SnapshotStack<Vec<Checkpoint>>,
}

impl<S> AllOf<S> {
    pub fn new(children: Vec<Box<dyn Requirement<S>>>) -> Result<Self, RequirementError> {
        if children.is_empty() {
            return Err(RequirementError::NoChildren);
        }
        let name = children
            .iter()
            .map(|c| c.name().to_string())
            .collect::<Vec<_>>()
            .join(" AND ");
        Ok(Self {
            name,
            children,
            stack: SnapshotStack::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<S> Requirement<S> for AllOf<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn mark_executed(&mut self, transition: &Transition<S>) {
        for child in &mut self.children {
            child.mark_executed(transition);
        }
    }

    fn percentage(&self) -> f64 {
        if self.children.is_empty() {
            return 0.0;
        }
        let total: f64 = self.children.iter().map(|c| c.percentage()).sum();
        total / self.children.len() as f64
    }

    fn execution_hint(&self) -> Option<ExecutionHint> {
        self.children
            .iter()
            .filter(|c| !c.is_complete())
            .find_map(|c| c.execution_hint())
    }

    fn push(&mut self) -> Checkpoint {
        let inner = self.children.iter_mut().map(|c| c.push()).collect();
        self.stack.push(inner)
    }

    fn pop(&mut self, checkpoint: Checkpoint) -> Result<(), RequirementError> {
        for (child, inner) in self.children.iter().zip(self.stack.peek(&checkpoint)?) {
            if child.depth() != inner.depth() {
                return Err(RequirementError::CheckpointMismatch {
                    expected: child.depth(),
                    got: inner.depth(),
                });
            }
        }
        let inner = self.stack.pop(checkpoint)?;
        for (child, cp) in self.children.iter_mut().zip(inner) {
            child.pop(cp)?;
        }
        Ok(())
    }

    fn depth(&self) -> usize {
        self.stack.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::SequenceRequirement;
    use tessera_ir::Action;

    fn step(code: u32, name: &str) -> Transition<u32> {
        Transition {
            source: 0,
            action: Action::new(code, name),
            dest: 0,
        }
    }

    fn both() -> AllOf<u32> {
        AllOf::new(vec![
            Box::new(SequenceRequirement::parse("a THEN b").unwrap()),
            Box::new(SequenceRequirement::parse("c").unwrap()),
        ])
        .unwrap()
    }

    #[test]
    fn test_mean_progress() {
        let mut req = both();
        assert_eq!(req.name(), "a THEN b AND c");
        req.mark_executed(&step(0, "a"));
        assert_eq!(req.percentage(), 0.25);
        req.mark_executed(&step(2, "c"));
        assert_eq!(req.percentage(), 0.75);
        req.mark_executed(&step(1, "b"));
        assert!(req.is_complete());
    }

    #[test]
    fn test_push_pop_restores_every_child() {
        let mut req = both();
        let cp = req.push();
        req.mark_executed(&step(0, "a"));
        req.mark_executed(&step(2, "c"));
        req.pop(cp).unwrap();
        assert_eq!(req.percentage(), 0.0);
        assert_eq!(req.depth(), 0);
    }

    #[test]
    fn test_hint_from_first_incomplete_child() {
        let mut req = both();
        req.mark_executed(&step(0, "a"));
        req.mark_executed(&step(1, "b"));
        let hint = req.execution_hint().unwrap();
        assert!(hint.prefers(&Action::new(2, "c")));
    }

    #[test]
    fn test_pop_with_child_out_of_step_changes_nothing() {
        let mut req = both();
        let cp = req.push();
        req.mark_executed(&step(0, "a"));
        let stray = req.children[0].push();

        let err = req.pop(cp).unwrap_err();
        assert!(matches!(
            err,
            RequirementError::CheckpointMismatch {
                expected: 2,
                got: 1
            }
        ));
        assert_eq!(req.depth(), 1);
        assert_eq!(req.children[0].depth(), 2);
        assert_eq!(req.children[1].depth(), 1);
        assert_eq!(req.percentage(), 0.25);

        req.children[0].pop(stray).unwrap();
        let cp = Checkpoint { depth: 1 };
        req.pop(cp).unwrap();
        assert_eq!(req.depth(), 0);
        assert_eq!(req.percentage(), 0.0);
    }

    #[test]
    fn test_no_children_rejected() {
        assert!(matches!(
            AllOf::<u32>::new(Vec::new()),
            Err(RequirementError::NoChildren)
        ));
    }
}
