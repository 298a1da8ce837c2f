//! Bidirectional mapping between qualified action names and dense codes.

use std::collections::HashMap;
use std::sync::Arc;

use tessera_ir::action::{Action, ActionCode};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndexError {
    #[error("unknown action name '{0}'")]
    UnknownName(String),

    #[error("unknown action code {0}")]
    UnknownCode(ActionCode),

    #[error("action index is frozen; cannot register '{0}'")]
    Frozen(String),
}

/// Qualified action name as stored in the index: `"<component>.<local>"`.
pub fn qualified_name(component: &str, local: &str) -> String {
    format!("{component}.{local}")
}

/// Codes are handed out in registration order starting at 0.
///
/// The index is built once per composition and then frozen: lookups keep
/// working, registering a new name fails.
#[derive(Debug, Clone, Default)]
pub struct ActionIndex {
    codes: HashMap<Arc<str>, ActionCode>,
    names: Vec<Arc<str>>,
    frozen: bool,
}

impl ActionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the code of `name`, assigning the next free code if it is new.
    pub fn register(&mut self, name: &str) -> Result<ActionCode, IndexError> {
        if let Some(&code) = self.codes.get(name) {
            return Ok(code);
        }
        if self.frozen {
            return Err(IndexError::Frozen(name.to_string()));
        }
        let code = self.names.len() as ActionCode;
        let name: Arc<str> = Arc::from(name);
        self.names.push(name.clone());
        self.codes.insert(name, code);
        Ok(code)
    }

    pub fn code(&self, name: &str) -> Result<ActionCode, IndexError> {
        self.codes
            .get(name)
            .copied()
            .ok_or_else(|| IndexError::UnknownName(name.to_string()))
    }

    pub fn name(&self, code: ActionCode) -> Result<&str, IndexError> {
        self.names
            .get(code as usize)
            .map(|n| n.as_ref())
            .ok_or(IndexError::UnknownCode(code))
    }

    /// Build the [`Action`] value for a registered code.
    pub fn action(&self, code: ActionCode) -> Result<Action, IndexError> {
        self.names
            .get(code as usize)
            .map(|n| Action::new(code, n.clone()))
            .ok_or(IndexError::UnknownCode(code))
    }

    pub fn action_by_name(&self, name: &str) -> Result<Action, IndexError> {
        self.action(self.code(name)?)
    }

    /// All actions in code order.
    pub fn actions(&self) -> Vec<Action> {
        self.names
            .iter()
            .enumerate()
            .map(|(code, name)| Action::new(code as ActionCode, name.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_dense_and_stable() {
        let mut index = ActionIndex::new();
        assert_eq!(index.register("A.x").unwrap(), 0);
        assert_eq!(index.register("A.y").unwrap(), 1);
        assert_eq!(index.register("A.x").unwrap(), 0);
        assert_eq!(index.register("B.x").unwrap(), 2);
        assert_eq!(index.len(), 3);
        assert_eq!(index.name(1).unwrap(), "A.y");
        assert_eq!(index.code("B.x").unwrap(), 2);
    }

    #[test]
    fn test_unknown_lookups_fail() {
        let index = ActionIndex::new();
        assert_eq!(
            index.code("nope"),
            Err(IndexError::UnknownName("nope".into()))
        );
        assert_eq!(index.name(7), Err(IndexError::UnknownCode(7)));
    }

    #[test]
    fn test_frozen_index_rejects_new_names_only() {
        let mut index = ActionIndex::new();
        index.register("A.x").unwrap();
        index.freeze();
        assert_eq!(index.register("A.x").unwrap(), 0);
        assert_eq!(
            index.register("A.z"),
            Err(IndexError::Frozen("A.z".into()))
        );
    }

    #[test]
    fn test_action_values_carry_names() {
        let mut index = ActionIndex::new();
        index.register("A.x").unwrap();
        let action = index.action_by_name("A.x").unwrap();
        assert_eq!(action.code(), 0);
        assert_eq!(action.name(), "A.x");
        assert_eq!(index.actions(), vec![action]);
    }
}
