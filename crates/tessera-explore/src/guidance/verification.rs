//! Verification loops.
//!
//! A verification sequence is a stretch of the model that starts with an
//! action named `<start prefix><sequence>` and ends with one named
//! `<end prefix><sequence>`. When the walk reaches a state that offers an
//! unsatisfied start action, the overlay takes that action and then follows
//! the loop while it is deterministic (exactly one outgoing transition).
//! Finishing a loop marks the sequence satisfied for the state it started
//! from. Executing any other action outside a loop means the system may have
//! changed, so every loop becomes eligible again.

use std::collections::HashSet;
use std::hash::Hash;

use tessera_model::{Model, Transition};
use tracing::debug;

use super::{Guidance, GuidanceError};
use crate::requirement::Requirement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPrefixes {
    pub start: String,
    pub end: String,
}

impl Default for VerificationPrefixes {
    fn default() -> Self {
        Self {
            start: "start_sv".to_string(),
            end: "end_sv".to_string(),
        }
    }
}

impl VerificationPrefixes {
    pub fn start_of<'a>(&self, action_name: &'a str) -> Option<&'a str> {
        sequence_suffix(action_name, &self.start)
    }

    pub fn end_of<'a>(&self, action_name: &'a str) -> Option<&'a str> {
        sequence_suffix(action_name, &self.end)
    }
}

// Qualified names ("Component.local" or "Component:local") are matched on
// their local part.
fn sequence_suffix<'a>(action_name: &'a str, prefix: &str) -> Option<&'a str> {
    let local = action_name
        .rsplit(['.', ':'])
        .next()
        .unwrap_or(action_name);
    local.strip_prefix(prefix)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopMode<S> {
    Idle,
    InLoop { sequence: String, origin: S },
}

/// The loop-following state machine, independent of any fallback guidance.
#[derive(Debug, Clone)]
pub struct VerificationLoop<S> {
    prefixes: VerificationPrefixes,
    mode: LoopMode<S>,
    satisfied: HashSet<(S, String)>,
}

impl<S: Clone + Eq + Hash> VerificationLoop<S> {
    pub fn new(prefixes: VerificationPrefixes) -> Self {
        Self {
            prefixes,
            mode: LoopMode::Idle,
            satisfied: HashSet::new(),
        }
    }

    pub fn mode(&self) -> &LoopMode<S> {
        &self.mode
    }

    pub fn is_satisfied(&self, state: &S, sequence: &str) -> bool {
        self.satisfied.contains(&(state.clone(), sequence.to_string()))
    }

    pub fn satisfied_count(&self) -> usize {
        self.satisfied.len()
    }

    /// The overlay's choice at `state`, or `None` to defer to the fallback.
    pub fn propose(&self, state: &S, outgoing: &[Transition<S>]) -> Option<Transition<S>> {
        match &self.mode {
            LoopMode::Idle => outgoing
                .iter()
                .find(|t| {
                    self.prefixes
                        .start_of(t.action.name())
                        .is_some_and(|seq| !self.is_satisfied(state, seq))
                })
                .cloned(),
            LoopMode::InLoop { .. } if outgoing.len() == 1 => Some(outgoing[0].clone()),
            LoopMode::InLoop { sequence, .. } => {
                debug!(
                    sequence = sequence.as_str(),
                    choices = outgoing.len(),
                    "verification loop branches; deferring"
                );
                None
            }
        }
    }

    pub fn mark_executed(&mut self, transition: &Transition<S>) {
        let name = transition.action.name();
        if let LoopMode::InLoop { sequence, origin } = &self.mode {
            if self.prefixes.end_of(name).is_some() {
                debug!(sequence = sequence.as_str(), "verification loop finished");
                self.satisfied.insert((origin.clone(), sequence.clone()));
                self.mode = LoopMode::Idle;
            }
            return;
        }
        if let Some(sequence) = self.prefixes.start_of(name) {
            debug!(sequence, "verification loop entered");
            self.mode = LoopMode::InLoop {
                sequence: sequence.to_string(),
                origin: transition.source.clone(),
            };
        } else if self.prefixes.end_of(name).is_none() && !self.satisfied.is_empty() {
            debug!(action = name, "state may have changed; loops eligible again");
            self.satisfied.clear();
        }
    }
}

impl<S: Clone + Eq + Hash> Default for VerificationLoop<S> {
    fn default() -> Self {
        Self::new(VerificationPrefixes::default())
    }
}

/// Runs verification loops, leaving every other choice to `fallback`.
pub struct VerificationLoopGuidance<S, G> {
    overlay: VerificationLoop<S>,
    fallback: G,
}

impl<S: Clone + Eq + Hash, G> VerificationLoopGuidance<S, G> {
    pub fn new(fallback: G, prefixes: VerificationPrefixes) -> Self {
        Self {
            overlay: VerificationLoop::new(prefixes),
            fallback,
        }
    }

    pub fn overlay(&self) -> &VerificationLoop<S> {
        &self.overlay
    }

    pub fn fallback(&self) -> &G {
        &self.fallback
    }
}

impl<M, G> Guidance<M> for VerificationLoopGuidance<M::State, G>
where
    M: Model,
    G: Guidance<M>,
{
    fn suggest(
        &mut self,
        model: &mut M,
        state: &M::State,
        outgoing: &[Transition<M::State>],
        requirement: &mut dyn Requirement<M::State>,
    ) -> Result<Transition<M::State>, GuidanceError> {
        match self.overlay.propose(state, outgoing) {
            Some(t) => Ok(t),
            None => self.fallback.suggest(model, state, outgoing, requirement),
        }
    }

    fn mark_executed(&mut self, transition: &Transition<M::State>) {
        self.overlay.mark_executed(transition);
        self.fallback.mark_executed(transition);
    }

    fn name(&self) -> &str {
        "verification_loop"
    }
}
