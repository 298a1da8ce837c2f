//! The labeled transition system abstraction shared by every model variant.

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use tessera_compiler::index::IndexError;
use tessera_ir::action::{Action, ActionCode, ComponentId};
use tessera_ir::lsts::LstsError;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("state {state} is not part of this model")]
    UnknownState { state: String },

    #[error("rule '{rule}': component {component} does not offer action {action}")]
    RuleInvariant {
        rule: String,
        component: ComponentId,
        action: ActionCode,
    },

    #[error("rule '{rule}' references component {component}, which is not composed")]
    UnknownComponent { rule: String, component: ComponentId },

    #[error("component model is not indexed against a composition")]
    NotIndexed,

    #[error("Action index error: {0}")]
    Index(#[from] IndexError),

    #[error("Invalid component model: {0}")]
    Lsts(#[from] LstsError),
}

/// `(source, action, destination)`. Cheap to regenerate; carries no identity
/// beyond its fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transition<S> {
    pub source: S,
    pub action: Action,
    pub dest: S,
}

/// Shared, immutable list of outgoing transitions.
pub type Transitions<S> = Rc<[Transition<S>]>;

/// A labeled transition system explored on the fly.
///
/// Expansion takes `&mut self` so variants can memoize or grow internal
/// arenas; the engine is single-threaded and only the driving loop or a
/// guidance decision holds the model at any time.
pub trait Model {
    /// Opaque state handle. Equal handles denote the same point of the
    /// state space.
    type State: Clone + Eq + Hash + fmt::Debug;

    fn initial_state(&mut self) -> Self::State;

    /// The visible action alphabet.
    fn actions(&self) -> Vec<Action>;

    /// Transitions leaving `state`.
    fn outgoing(&mut self, state: &Self::State) -> Result<Transitions<Self::State>, ModelError>;

    /// Drop memoized expansions, if the variant keeps any.
    fn clear_cache(&mut self) {}
}
