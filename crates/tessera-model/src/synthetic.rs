//! An unbounded counter model, materialized on demand.
//!
//! State `k` offers `inc` (to `k + 1`), `reset` (to `0`) and, for `k > 0`,
//! `dec` (to `k - 1`). States live in an arena indexed by `k`; asking for
//! state `k` allocates every missing state up to `k` once and returns a
//! stable handle.

use std::rc::Rc;

use tessera_ir::action::Action;

use crate::lts::{Model, ModelError, Transition, Transitions};

pub const INC: u32 = 0;
pub const DEC: u32 = 1;
pub const RESET: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SyntheticState(u32);

impl SyntheticState {
    pub fn value(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Node {
    expansion: Option<Transitions<SyntheticState>>,
}

#[derive(Debug)]
pub struct SyntheticModel {
    alphabet: [Action; 3],
    arena: Vec<Node>,
}

impl SyntheticModel {
    pub fn new() -> Self {
        Self::with_names("inc", "dec", "reset")
    }

    pub fn with_names(inc: &str, dec: &str, reset: &str) -> Self {
        Self {
            alphabet: [
                Action::new(INC, inc),
                Action::new(DEC, dec),
                Action::new(RESET, reset),
            ],
            arena: vec![Node::default()],
        }
    }

    /// Handle for state `k`, materializing states `0..=k` as needed.
    pub fn state(&mut self, k: u32) -> SyntheticState {
        let needed = k as usize + 1;
        if self.arena.len() < needed {
            self.arena.resize_with(needed, Node::default);
        }
        SyntheticState(k)
    }

    /// Number of states allocated so far.
    pub fn materialized(&self) -> usize {
        self.arena.len()
    }
}

impl Default for SyntheticModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for SyntheticModel {
    type State = SyntheticState;

    fn initial_state(&mut self) -> SyntheticState {
        self.state(0)
    }

    fn actions(&self) -> Vec<Action> {
        self.alphabet.to_vec()
    }

    fn outgoing(&mut self, state: &SyntheticState) -> Result<Transitions<SyntheticState>, ModelError> {
        let k = state.0;
        let node = self
            .arena
            .get(k as usize)
            .ok_or_else(|| ModelError::UnknownState {
                state: format!("{state:?}"),
            })?;
        if let Some(expansion) = &node.expansion {
            return Ok(Rc::clone(expansion));
        }

        let [inc, dec, reset] = self.alphabet.clone();
        let mut transitions = vec![Transition {
            source: *state,
            action: inc,
            dest: self.state(k + 1),
        }];
        if k > 0 {
            transitions.push(Transition {
                source: *state,
                action: dec,
                dest: SyntheticState(k - 1),
            });
        }
        transitions.push(Transition {
            source: *state,
            action: reset,
            dest: SyntheticState(0),
        });

        let expansion: Transitions<SyntheticState> = transitions.into();
        self.arena[k as usize].expansion = Some(Rc::clone(&expansion));
        Ok(expansion)
    }

    fn clear_cache(&mut self) {
        for node in &mut self.arena {
            node.expansion = None;
        }
    }
}
