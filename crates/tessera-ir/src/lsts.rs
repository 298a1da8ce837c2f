//! Labeled state-transition system description of one component.
//!
//! An [`Lsts`] is plain data: numbered states, an ordered list of local action
//! names and a transition table. Transition actions start out as indices into
//! `actions` and are rewritten once to global action codes when the component
//! joins a composition.

use serde::{Deserialize, Serialize};

use crate::action::ActionCode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LstsError {
    #[error("initial state {initial} out of range (state_count = {state_count})")]
    InitialOutOfRange { initial: u32, state_count: u32 },

    #[error("transition {index}: state {state} out of range (state_count = {state_count})")]
    StateOutOfRange {
        index: usize,
        state: u32,
        state_count: u32,
    },

    #[error("transition {index}: local action {action} out of range ({count} actions)")]
    ActionOutOfRange {
        index: usize,
        action: u32,
        count: usize,
    },

    #[error("duplicate local action name '{name}'")]
    DuplicateAction { name: String },

    #[error("transition table already rewritten to global action codes")]
    AlreadyIndexed,

    #[error("expected {expected} global codes, got {got}")]
    CodeCountMismatch { expected: usize, got: usize },
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LstsTransition {
    pub source: u32,
    /// Local action index before indexing, global action code after.
    pub action: ActionCode,
    pub dest: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lsts {
    pub actions: Vec<String>,
    pub state_count: u32,
    #[serde(default)]
    pub initial: u32,
    #[serde(default)]
    pub transitions: Vec<LstsTransition>,
    /// Global code per local action, set by [`Lsts::rewrite_actions`].
    #[serde(skip)]
    global_codes: Option<Vec<ActionCode>>,
}

impl Lsts {
    pub fn new(state_count: u32, initial: u32) -> Self {
        Self {
            actions: Vec::new(),
            state_count,
            initial,
            transitions: Vec::new(),
            global_codes: None,
        }
    }

    /// Register a local action name, returning its local index.
    pub fn add_action(&mut self, name: &str) -> u32 {
        if let Some(pos) = self.actions.iter().position(|a| a == name) {
            return pos as u32;
        }
        self.actions.push(name.to_string());
        (self.actions.len() - 1) as u32
    }

    /// Builder-style transition insertion by local action name.
    pub fn with_transition(mut self, source: u32, action: &str, dest: u32) -> Self {
        let action = self.add_action(action);
        self.transitions.push(LstsTransition {
            source,
            action,
            dest,
        });
        self
    }

    pub fn validate(&self) -> Result<(), LstsError> {
        if self.initial >= self.state_count {
            return Err(LstsError::InitialOutOfRange {
                initial: self.initial,
                state_count: self.state_count,
            });
        }

        for (i, name) in self.actions.iter().enumerate() {
            if self.actions[..i].contains(name) {
                return Err(LstsError::DuplicateAction { name: name.clone() });
            }
        }

        for (index, t) in self.transitions.iter().enumerate() {
            for state in [t.source, t.dest] {
                if state >= self.state_count {
                    return Err(LstsError::StateOutOfRange {
                        index,
                        state,
                        state_count: self.state_count,
                    });
                }
            }
            if self.global_codes.is_none() && t.action as usize >= self.actions.len() {
                return Err(LstsError::ActionOutOfRange {
                    index,
                    action: t.action,
                    count: self.actions.len(),
                });
            }
        }

        Ok(())
    }

    /// Transitions leaving `state`, in table order.
    pub fn transitions_from(&self, state: u32) -> impl Iterator<Item = &LstsTransition> {
        self.transitions.iter().filter(move |t| t.source == state)
    }

    pub fn is_indexed(&self) -> bool {
        self.global_codes.is_some()
    }

    /// Global code per local action once the table has been rewritten.
    pub fn global_codes(&self) -> Option<&[ActionCode]> {
        self.global_codes.as_deref()
    }

    /// Rewrite every transition's local action index to its global code.
    ///
    /// `codes[i]` is the global code of `actions[i]`. Runs at most once per
    /// table: a second call would reinterpret global codes as local indices.
    pub fn rewrite_actions(&mut self, codes: Vec<ActionCode>) -> Result<(), LstsError> {
        if self.global_codes.is_some() {
            return Err(LstsError::AlreadyIndexed);
        }
        if codes.len() != self.actions.len() {
            return Err(LstsError::CodeCountMismatch {
                expected: self.actions.len(),
                got: codes.len(),
            });
        }
        for t in &mut self.transitions {
            t.action = codes[t.action as usize];
        }
        self.global_codes = Some(codes);
        Ok(())
    }
}
