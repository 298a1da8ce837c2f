//! On-the-fly caching filter over any [`Model`].
//!
//! Inner states are interned into an arena and exposed as [`CachedState`]
//! handles, so requesting the same inner state twice yields the same handle.
//! Each handle is expanded at most once per cache lifetime; later requests
//! return the stored `Rc` itself.

use std::collections::{HashMap, HashSet};

use tessera_ir::action::{Action, ActionCode};
use tracing::debug;

use crate::lts::{Model, ModelError, Transition, Transitions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CachedState(u32);

impl CachedState {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

struct Slot<S> {
    inner: S,
    expansion: Option<Transitions<CachedState>>,
}

pub struct CachingModel<M: Model> {
    inner: M,
    slots: Vec<Slot<M::State>>,
    lookup: HashMap<M::State, CachedState>,
    forbidden: Option<HashSet<ActionCode>>,
    expansions: u64,
}

impl<M: Model> CachingModel<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            slots: Vec::new(),
            lookup: HashMap::new(),
            forbidden: None,
            expansions: 0,
        }
    }

    /// Handle for an inner state, reusing the existing one if known.
    pub fn state(&mut self, inner: M::State) -> CachedState {
        if let Some(&handle) = self.lookup.get(&inner) {
            return handle;
        }
        let handle = CachedState(self.slots.len() as u32);
        self.slots.push(Slot {
            inner: inner.clone(),
            expansion: None,
        });
        self.lookup.insert(inner, handle);
        handle
    }

    pub fn inner_state(&self, handle: CachedState) -> Option<&M::State> {
        self.slots.get(handle.index()).map(|slot| &slot.inner)
    }

    /// Replace the forbidden-action set. Expansions already cached are kept
    /// as they are; call [`Model::clear_cache`] to re-filter them.
    pub fn set_forbidden_actions(&mut self, forbidden: Option<HashSet<ActionCode>>) {
        self.forbidden = forbidden;
    }

    pub fn forbidden_actions(&self) -> Option<&HashSet<ActionCode>> {
        self.forbidden.as_ref()
    }

    fn is_forbidden(&self, code: ActionCode) -> bool {
        self.forbidden
            .as_ref()
            .is_some_and(|forbidden| forbidden.contains(&code))
    }

    pub fn is_expanded(&self, handle: CachedState) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|slot| slot.expansion.is_some())
    }

    /// Number of times the inner model has been asked to expand a state.
    pub fn expansions(&self) -> u64 {
        self.expansions
    }

    /// Number of interned states.
    pub fn state_count(&self) -> usize {
        self.slots.len()
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: Model> Model for CachingModel<M> {
    type State = CachedState;

    fn initial_state(&mut self) -> CachedState {
        let initial = self.inner.initial_state();
        self.state(initial)
    }

    fn actions(&self) -> Vec<Action> {
        self.inner
            .actions()
            .into_iter()
            .filter(|a| !self.is_forbidden(a.code()))
            .collect()
    }

    fn outgoing(&mut self, state: &CachedState) -> Result<Transitions<CachedState>, ModelError> {
        let slot = self
            .slots
            .get(state.index())
            .ok_or_else(|| ModelError::UnknownState {
                state: format!("{state:?}"),
            })?;
        if let Some(expansion) = &slot.expansion {
            return Ok(expansion.clone());
        }

        let inner_state = slot.inner.clone();
        let inner_transitions = self.inner.outgoing(&inner_state)?;
        self.expansions += 1;

        let mut visible = Vec::with_capacity(inner_transitions.len());
        for t in inner_transitions.iter() {
            if self.is_forbidden(t.action.code()) {
                continue;
            }
            let dest = self.state(t.dest.clone());
            visible.push(Transition {
                source: *state,
                action: t.action.clone(),
                dest,
            });
        }

        let expansion: Transitions<CachedState> = visible.into();
        self.slots[state.index()].expansion = Some(expansion.clone());
        Ok(expansion)
    }

    /// Drops every memoized expansion. Handles stay valid and keep denoting
    /// the same inner states.
    fn clear_cache(&mut self) {
        let dropped = self
            .slots
            .iter_mut()
            .filter_map(|slot| slot.expansion.take())
            .count();
        debug!(dropped, states = self.slots.len(), "state cache cleared");
        self.inner.clear_cache();
    }
}
