use std::rc::Rc;

use tessera_compiler::index::ActionIndex;
use tessera_ir::action::Action;
use tessera_ir::lsts::Lsts;

use crate::lts::{Model, ModelError, Transition, Transitions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LstsState(pub u32);

/// A component model backed by an explicit transition table.
///
/// Outgoing lists are built once at construction, one per state.
#[derive(Debug, Clone)]
pub struct LstsModel {
    initial: LstsState,
    alphabet: Vec<Action>,
    rows: Vec<Transitions<LstsState>>,
}

impl LstsModel {
    /// Standalone model. Action codes are the local action indices, or the
    /// global codes if the table has already been indexed; names are the
    /// component's local names.
    pub fn new(lsts: &Lsts) -> Result<Self, ModelError> {
        lsts.validate()?;
        let alphabet: Vec<Action> = match lsts.global_codes() {
            Some(codes) => codes
                .iter()
                .zip(&lsts.actions)
                .map(|(&code, name)| Action::new(code, name.as_str()))
                .collect(),
            None => lsts
                .actions
                .iter()
                .enumerate()
                .map(|(i, name)| Action::new(i as u32, name.as_str()))
                .collect(),
        };
        Ok(Self::build(lsts, alphabet))
    }

    /// Model of an indexed component, named by its qualified global names.
    pub fn with_index(lsts: &Lsts, index: &ActionIndex) -> Result<Self, ModelError> {
        lsts.validate()?;
        let codes = lsts.global_codes().ok_or(ModelError::NotIndexed)?;
        let alphabet = codes
            .iter()
            .map(|&code| index.action(code))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::build(lsts, alphabet))
    }

    fn build(lsts: &Lsts, alphabet: Vec<Action>) -> Self {
        let rows: Vec<Transitions<LstsState>> = (0..lsts.state_count)
            .map(|s| {
                lsts.transitions_from(s)
                    .filter_map(|t| {
                        let action = alphabet.iter().find(|a| a.code() == t.action)?;
                        Some(Transition {
                            source: LstsState(t.source),
                            action: action.clone(),
                            dest: LstsState(t.dest),
                        })
                    })
                    .collect::<Vec<_>>()
                    .into()
            })
            .collect();

        Self {
            initial: LstsState(lsts.initial),
            alphabet,
            rows,
        }
    }

    pub fn state_count(&self) -> usize {
        self.rows.len()
    }
}

impl Model for LstsModel {
    type State = LstsState;

    fn initial_state(&mut self) -> LstsState {
        self.initial
    }

    fn actions(&self) -> Vec<Action> {
        self.alphabet.clone()
    }

    fn outgoing(&mut self, state: &LstsState) -> Result<Transitions<LstsState>, ModelError> {
        self.rows
            .get(state.0 as usize)
            .map(Rc::clone)
            .ok_or_else(|| ModelError::UnknownState {
                state: format!("{state:?}"),
            })
    }
}
