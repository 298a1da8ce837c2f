use std::collections::HashSet;

use tessera_ir::action::{Action, ActionCode};
use tessera_ir::pattern::ActionPattern;
use tessera_model::Transition;

use super::{ActionMatcher, Checkpoint, ExecutionHint, Requirement, RequirementError, SnapshotStack};

/// Execute every action in the alphabet whose name matches a pattern.
#[derive(Debug, Clone)]
pub struct ActionCoverageRequirement {
    name: String,
    targets: Vec<Action>,
    covered: HashSet<ActionCode>,
    // Codes in the order they were first covered; pop truncates this.
    log: Vec<ActionCode>,
    stack: SnapshotStack<usize>,
}

impl ActionCoverageRequirement {
    pub fn new(alphabet: &[Action], pattern: &ActionPattern) -> Result<Self, RequirementError> {
        let targets: Vec<Action> = alphabet
            .iter()
            .filter(|a| pattern.matches(a.name()))
            .cloned()
            .collect();
        if targets.is_empty() {
            return Err(RequirementError::NoTargets(pattern.to_string()));
        }
        Ok(Self {
            name: format!("actions {pattern}"),
            targets,
            covered: HashSet::new(),
            log: Vec::new(),
            stack: SnapshotStack::new(),
        })
    }

    pub fn targets(&self) -> &[Action] {
        &self.targets
    }

    pub fn is_covered(&self, code: ActionCode) -> bool {
        self.covered.contains(&code)
    }

    fn is_target(&self, code: ActionCode) -> bool {
        self.targets.iter().any(|a| a.code() == code)
    }
}

impl<S> Requirement<S> for ActionCoverageRequirement {
    fn name(&self) -> &str {
        &self.name
    }

    fn mark_executed(&mut self, transition: &Transition<S>) {
        let code = transition.action.code();
        if self.is_target(code) && self.covered.insert(code) {
            self.log.push(code);
        }
    }

    fn percentage(&self) -> f64 {
        self.covered.len() as f64 / self.targets.len() as f64
    }

    fn execution_hint(&self) -> Option<ExecutionHint> {
        let preferred: Vec<ActionMatcher> = self
            .targets
            .iter()
            .filter(|a| !self.covered.contains(&a.code()))
            .map(|a| ActionMatcher::Code(a.code()))
            .collect();
        if preferred.is_empty() {
            None
        } else {
            Some(ExecutionHint {
                preferred,
                weight: 1.0,
            })
        }
    }

    fn push(&mut self) -> Checkpoint {
        self.stack.push(self.log.len())
    }

    fn pop(&mut self, checkpoint: Checkpoint) -> Result<(), RequirementError> {
        let keep = self.stack.pop(checkpoint)?;
        for code in self.log.drain(keep..) {
            self.covered.remove(&code);
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

    fn alphabet() -> Vec<Action> {
        vec![
            Action::new(0, "call"),
            Action::new(1, "end_call"),
            Action::new(2, "bill"),
        ]
    }

    fn step(action: &Action) -> Transition<u32> {
        Transition {
            source: 0,
            action: action.clone(),
            dest: 0,
        }
    }

    #[test]
    fn test_counts_distinct_targets() {
        let alphabet = alphabet();
        let mut req =
            ActionCoverageRequirement::new(&alphabet, &ActionPattern::new(".*call").unwrap())
                .unwrap();
        assert_eq!(req.targets().len(), 2);
        req.mark_executed(&step(&alphabet[0]));
        req.mark_executed(&step(&alphabet[0]));
        req.mark_executed(&step(&alphabet[2]));
        assert_eq!(Requirement::<u32>::percentage(&req), 0.5);
        req.mark_executed(&step(&alphabet[1]));
        assert!(Requirement::<u32>::is_complete(&req));
    }

    #[test]
    fn test_pop_uncovers_speculative_actions() {
        let alphabet = alphabet();
        let mut req =
            ActionCoverageRequirement::new(&alphabet, &ActionPattern::new(".*").unwrap()).unwrap();
        req.mark_executed(&step(&alphabet[0]));
        let cp = Requirement::<u32>::push(&mut req);
        req.mark_executed(&step(&alphabet[1]));
        req.mark_executed(&step(&alphabet[0]));
        assert!(req.is_covered(1));
        Requirement::<u32>::pop(&mut req, cp).unwrap();
        assert!(req.is_covered(0));
        assert!(!req.is_covered(1));
        let hint = Requirement::<u32>::execution_hint(&req).unwrap();
        assert_eq!(hint.preferred.len(), 2);
    }

    #[test]
    fn test_no_targets_is_an_error() {
        let err =
            ActionCoverageRequirement::new(&alphabet(), &ActionPattern::new("zzz").unwrap())
                .unwrap_err();
        assert!(matches!(err, RequirementError::NoTargets(_)));
    }
}
