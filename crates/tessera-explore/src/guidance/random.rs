use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tessera_model::{Model, Transition};

use super::{Guidance, GuidanceError};
use crate::requirement::Requirement;

/// Seeded random walk that follows the requirement's hint when it can.
///
/// With probability equal to the hint weight, the choice is restricted to
/// transitions the hint prefers (if any are enabled); otherwise it is
/// uniform over all outgoing transitions.
pub struct RandomGuidance {
    rng: ChaCha8Rng,
}

impl RandomGuidance {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<M: Model> Guidance<M> for RandomGuidance {
    fn suggest(
        &mut self,
        _model: &mut M,
        _state: &M::State,
        outgoing: &[Transition<M::State>],
        requirement: &mut dyn Requirement<M::State>,
    ) -> Result<Transition<M::State>, GuidanceError> {
        if let Some(hint) = requirement.execution_hint() {
            if self.rng.gen::<f64>() < hint.weight {
                let preferred: Vec<&Transition<M::State>> = outgoing
                    .iter()
                    .filter(|t| hint.prefers(&t.action))
                    .collect();
                if let Some(t) = preferred.choose(&mut self.rng) {
                    return Ok((*t).clone());
                }
            }
        }
        outgoing
            .choose(&mut self.rng)
            .cloned()
            .ok_or(GuidanceError::NoChoice)
    }

    fn name(&self) -> &str {
        "random"
    }
}
