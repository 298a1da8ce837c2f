use tessera_ir::pattern::ActionPattern;
use tessera_ir::sequence::{parse_sequence, SequenceError};
use tessera_model::Transition;

use super::{ActionMatcher, Checkpoint, ExecutionHint, Requirement, RequirementError, SnapshotStack};

/// Cover an ordered sequence of action patterns.
///
/// The cursor advances when the executed action matches the pattern at the
/// cursor; other actions are ignored. Progress is `cursor / len`.
#[derive(Debug, Clone)]
pub struct SequenceRequirement {
    name: String,
    patterns: Vec<ActionPattern>,
    cursor: usize,
    stack: SnapshotStack<usize>,
}

impl SequenceRequirement {
    pub fn new(patterns: Vec<ActionPattern>) -> Result<Self, RequirementError> {
        if patterns.is_empty() {
            return Err(SequenceError::Empty.into());
        }
        let name = patterns
            .iter()
            .map(ActionPattern::as_str)
            .collect::<Vec<_>>()
            .join(" THEN ");
        Ok(Self {
            name,
            patterns,
            cursor: 0,
            stack: SnapshotStack::new(),
        })
    }

    /// Parse `"p1 THEN p2 THEN ..."`.
    pub fn parse(text: &str) -> Result<Self, RequirementError> {
        Self::new(parse_sequence(text)?)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl<S> Requirement<S> for SequenceRequirement {
    fn name(&self) -> &str {
        &self.name
    }

    fn mark_executed(&mut self, transition: &Transition<S>) {
        if let Some(next) = self.patterns.get(self.cursor) {
            if next.matches(transition.action.name()) {
                self.cursor += 1;
            }
        }
    }

    fn percentage(&self) -> f64 {
        self.cursor as f64 / self.patterns.len() as f64
    }

    fn execution_hint(&self) -> Option<ExecutionHint> {
        self.patterns.get(self.cursor).map(|next| ExecutionHint {
            preferred: vec![ActionMatcher::Pattern(next.clone())],
            weight: 1.0,
        })
    }

    fn push(&mut self) -> Checkpoint {
        self.stack.push(self.cursor)
    }

    fn pop(&mut self, checkpoint: Checkpoint) -> Result<(), RequirementError> {
        self.cursor = self.stack.pop(checkpoint)?;
        Ok(())
    }

    fn depth(&self) -> usize {
        self.stack.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_ir::Action;

    fn step(code: u32, name: &str) -> Transition<u32> {
        Transition {
            source: 0,
            action: Action::new(code, name),
            dest: 0,
        }
    }

    fn pct(req: &SequenceRequirement) -> f64 {
        Requirement::<u32>::percentage(req)
    }

    #[test]
    fn test_progress_in_order() {
        let mut req = SequenceRequirement::parse("a THEN b THEN c").unwrap();
        assert_eq!(pct(&req), 0.0);
        req.mark_executed(&step(0, "a"));
        assert!((pct(&req) - 1.0 / 3.0).abs() < 1e-9);
        // Out of order does not advance.
        req.mark_executed(&step(2, "c"));
        assert!((pct(&req) - 1.0 / 3.0).abs() < 1e-9);
        req.mark_executed(&step(1, "b"));
        req.mark_executed(&step(2, "c"));
        assert_eq!(pct(&req), 1.0);
        assert!(Requirement::<u32>::is_complete(&req));
        assert!(Requirement::<u32>::execution_hint(&req).is_none());
    }

    #[test]
    fn test_push_pop_restores_cursor() {
        let mut req = SequenceRequirement::parse("a THEN b THEN c").unwrap();
        req.mark_executed(&step(0, "a"));
        let cp = Requirement::<u32>::push(&mut req);
        req.mark_executed(&step(1, "b"));
        req.mark_executed(&step(2, "c"));
        assert_eq!(pct(&req), 1.0);
        Requirement::<u32>::pop(&mut req, cp).unwrap();
        assert!((pct(&req) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(Requirement::<u32>::depth(&req), 0);
    }

    #[test]
    fn test_hint_names_next_pattern() {
        let mut req = SequenceRequirement::parse("dial THEN (hang.*)").unwrap();
        req.mark_executed(&step(0, "dial"));
        let hint = Requirement::<u32>::execution_hint(&req).unwrap();
        assert!(hint.prefers(&Action::new(7, "hangup")));
        assert!(!hint.prefers(&Action::new(0, "dial")));
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert!(SequenceRequirement::new(Vec::new()).is_err());
        assert!(SequenceRequirement::parse("   ").is_err());
    }
}
