//! Guidance: choosing the next transition to execute.

pub mod lookahead;
pub mod random;
pub mod verification;

use tessera_model::{Model, ModelError, Transition};

use crate::requirement::{Requirement, RequirementError};

pub use lookahead::LookaheadGuidance;
pub use random::RandomGuidance;
pub use verification::{LoopMode, VerificationLoop, VerificationLoopGuidance, VerificationPrefixes};

#[derive(Debug, thiserror::Error)]
pub enum GuidanceError {
    #[error("no transitions to choose from")]
    NoChoice,

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Requirement error: {0}")]
    Requirement(#[from] RequirementError),
}

/// Picks one of the transitions leaving the current state.
///
/// `suggest` may explore the model and speculate on the requirement with
/// `push`/`pop`, but must leave the requirement at the depth it was given.
pub trait Guidance<M: Model> {
    fn suggest(
        &mut self,
        model: &mut M,
        state: &M::State,
        outgoing: &[Transition<M::State>],
        requirement: &mut dyn Requirement<M::State>,
    ) -> Result<Transition<M::State>, GuidanceError>;

    /// Told about every transition actually executed.
    fn mark_executed(&mut self, _transition: &Transition<M::State>) {}

    fn name(&self) -> &str;
}

impl<M: Model, G: Guidance<M> + ?Sized> Guidance<M> for Box<G> {
    fn suggest(
        &mut self,
        model: &mut M,
        state: &M::State,
        outgoing: &[Transition<M::State>],
        requirement: &mut dyn Requirement<M::State>,
    ) -> Result<Transition<M::State>, GuidanceError> {
        (**self).suggest(model, state, outgoing, requirement)
    }

    fn mark_executed(&mut self, transition: &Transition<M::State>) {
        (**self).mark_executed(transition)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
