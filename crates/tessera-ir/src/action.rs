use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Dense integer identity of an action within one composition.
pub type ActionCode = u32;

/// Identifier of a component model, assigned in declaration order when a
/// composition is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A labeled action.
///
/// Equality and hashing use the code only. The name is carried for display
/// and for pattern matching; two actions with the same code but different
/// names compare equal.
#[derive(Debug, Clone)]
pub struct Action {
    code: ActionCode,
    name: Arc<str>,
}

impl Action {
    pub fn new(code: ActionCode, name: impl Into<Arc<str>>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }

    pub fn code(&self) -> ActionCode {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Action {}

impl Hash for Action {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_display_name() {
        let a = Action::new(3, "Phone.dial");
        let b = Action::new(3, "renamed");
        let c = Action::new(4, "Phone.dial");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<Action> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
