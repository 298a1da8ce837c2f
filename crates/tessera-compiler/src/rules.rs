//! Synchronization rules and the subset-matching rule engine.

use std::collections::HashSet;

use tessera_ir::action::{Action, ActionCode, ComponentId};

/// A (component, local action) participant of a rule.
pub type SyncPair = (ComponentId, ActionCode);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleError {
    #[error("rule for '{result}' has an empty synchronization set")]
    EmptySync { result: String },

    #[error("rule for '{result}' names component {component} more than once")]
    DuplicateComponent {
        component: ComponentId,
        result: String,
    },
}

/// Local actions that fire together, producing one global action.
#[derive(Debug, Clone)]
pub struct Rule {
    sync: Vec<SyncPair>,
    result: Action,
}

impl Rule {
    pub fn new(sync: Vec<SyncPair>, result: Action) -> Result<Self, RuleError> {
        if sync.is_empty() {
            return Err(RuleError::EmptySync {
                result: result.name().to_string(),
            });
        }
        for (i, (component, _)) in sync.iter().enumerate() {
            if sync[..i].iter().any(|(c, _)| c == component) {
                return Err(RuleError::DuplicateComponent {
                    component: *component,
                    result: result.name().to_string(),
                });
            }
        }
        Ok(Self { sync, result })
    }

    pub fn sync(&self) -> &[SyncPair] {
        &self.sync
    }

    pub fn result(&self) -> &Action {
        &self.result
    }

    /// The local action `component` contributes, if it participates.
    pub fn local_action(&self, component: ComponentId) -> Option<ActionCode> {
        self.sync
            .iter()
            .find(|(c, _)| *c == component)
            .map(|(_, a)| *a)
    }

    pub fn is_enabled(&self, offered: &HashSet<SyncPair>) -> bool {
        self.sync.iter().all(|pair| offered.contains(pair))
    }
}

/// Rules in definition order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Every rule whose synchronization set is contained in `offered`, in
    /// definition order. No further selection is made.
    pub fn enabled<'a>(&'a self, offered: &'a HashSet<SyncPair>) -> impl Iterator<Item = &'a Rule> {
        self.rules.iter().filter(move |rule| rule.is_enabled(offered))
    }

    /// Distinct result actions, in order of first appearance.
    pub fn result_actions(&self) -> Vec<Action> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .filter(|rule| seen.insert(rule.result.code()))
            .map(|rule| rule.result.clone())
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ComponentId = ComponentId(0);
    const B: ComponentId = ComponentId(1);

    #[test]
    fn test_empty_sync_rejected() {
        assert_eq!(
            Rule::new(vec![], Action::new(0, "x")).unwrap_err(),
            RuleError::EmptySync { result: "x".into() }
        );
    }

    #[test]
    fn test_duplicate_component_rejected() {
        let err = Rule::new(vec![(A, 0), (A, 1)], Action::new(0, "x")).unwrap_err();
        assert!(matches!(err, RuleError::DuplicateComponent { .. }));
    }

    #[test]
    fn test_enabled_returns_all_matches_in_order() {
        let rules: RuleSet = [
            Rule::new(vec![(A, 0), (B, 5)], Action::new(0, "sync")).unwrap(),
            Rule::new(vec![(A, 0)], Action::new(1, "solo_a")).unwrap(),
            Rule::new(vec![(B, 6)], Action::new(2, "solo_b")).unwrap(),
            Rule::new(vec![(A, 0)], Action::new(1, "solo_a")).unwrap(),
        ]
        .into_iter()
        .collect();

        let offered: HashSet<SyncPair> = [(A, 0), (B, 5)].into_iter().collect();
        let names: Vec<&str> = rules.enabled(&offered).map(|r| r.result().name()).collect();
        assert_eq!(names, vec!["sync", "solo_a", "solo_a"]);
    }

    #[test]
    fn test_same_code_in_other_component_does_not_match() {
        let rule = Rule::new(vec![(A, 3)], Action::new(0, "x")).unwrap();
        let offered: HashSet<SyncPair> = [(B, 3)].into_iter().collect();
        assert!(!rule.is_enabled(&offered));
    }

    #[test]
    fn test_result_actions_deduplicated() {
        let rules: RuleSet = [
            Rule::new(vec![(A, 0)], Action::new(4, "go")).unwrap(),
            Rule::new(vec![(B, 1)], Action::new(4, "go")).unwrap(),
            Rule::new(vec![(B, 2)], Action::new(5, "stop")).unwrap(),
        ]
        .into_iter()
        .collect();
        let codes: Vec<u32> = rules.result_actions().iter().map(|a| a.code()).collect();
        assert_eq!(codes, vec![4, 5]);
    }
}
