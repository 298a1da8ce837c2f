use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tessera_model::{Model, Transition};
use tracing::trace;

use super::{Guidance, GuidanceError};
use crate::requirement::Requirement;

const EPSILON: f64 = 1e-9;

/// Bounded depth-first lookahead over the model.
///
/// Each candidate is scored by the best requirement percentage reachable
/// within `depth` steps, found by speculating on the requirement with
/// push/pop. Higher score wins, then the shorter path to it, then a seeded
/// random pick. `max_nodes` caps the transitions examined per decision.
pub struct LookaheadGuidance {
    depth: usize,
    max_nodes: usize,
    rng: ChaCha8Rng,
}

#[derive(Debug, Clone, Copy)]
struct Score {
    percentage: f64,
    distance: usize,
}

impl Score {
    fn beats(self, other: Score) -> bool {
        self.percentage > other.percentage + EPSILON
            || ((self.percentage - other.percentage).abs() <= EPSILON
                && self.distance < other.distance)
    }

    fn ties(self, other: Score) -> bool {
        (self.percentage - other.percentage).abs() <= EPSILON && self.distance == other.distance
    }
}

impl LookaheadGuidance {
    pub const DEFAULT_DEPTH: usize = 3;
    pub const DEFAULT_MAX_NODES: usize = 10_000;

    pub fn new(depth: usize, seed: u64) -> Self {
        Self {
            depth: depth.max(1),
            max_nodes: Self::DEFAULT_MAX_NODES,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes.max(1);
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    // Best score reachable from `state` within `remaining` more steps.
    // Distance is counted from `state`.
    fn search<M: Model>(
        model: &mut M,
        state: &M::State,
        requirement: &mut dyn Requirement<M::State>,
        remaining: usize,
        budget: &mut usize,
    ) -> Result<Score, GuidanceError> {
        let mut best = Score {
            percentage: requirement.percentage(),
            distance: 0,
        };
        if best.percentage >= 1.0 || remaining == 0 || *budget == 0 {
            return Ok(best);
        }
        let outgoing = model.outgoing(state)?;
        for t in outgoing.iter() {
            if *budget == 0 {
                break;
            }
            *budget -= 1;
            let checkpoint = requirement.push();
            requirement.mark_executed(t);
            let found = Self::search(model, &t.dest, requirement, remaining - 1, budget);
            requirement.pop(checkpoint)?;
            let found = found?;
            let candidate = Score {
                percentage: found.percentage,
                distance: found.distance + 1,
            };
            if candidate.beats(best) {
                best = candidate;
            }
        }
        Ok(best)
    }
}

impl<M: Model> Guidance<M> for LookaheadGuidance {
    fn suggest(
        &mut self,
        model: &mut M,
        _state: &M::State,
        outgoing: &[Transition<M::State>],
        requirement: &mut dyn Requirement<M::State>,
    ) -> Result<Transition<M::State>, GuidanceError> {
        let mut budget = self.max_nodes;
        let mut best: Option<Score> = None;
        let mut winners: Vec<&Transition<M::State>> = Vec::new();

        for t in outgoing {
            let checkpoint = requirement.push();
            requirement.mark_executed(t);
            let found = Self::search(model, &t.dest, requirement, self.depth - 1, &mut budget);
            requirement.pop(checkpoint)?;
            let found = found?;
            let score = Score {
                percentage: found.percentage,
                distance: found.distance + 1,
            };
            trace!(
                action = t.action.name(),
                percentage = score.percentage,
                distance = score.distance,
                "lookahead candidate"
            );
            match best {
                Some(b) if b.beats(score) => {}
                Some(b) if b.ties(score) => winners.push(t),
                _ => {
                    best = Some(score);
                    winners.clear();
                    winners.push(t);
                }
            }
        }

        winners
            .choose(&mut self.rng)
            .map(|t| (*t).clone())
            .ok_or(GuidanceError::NoChoice)
    }

    fn name(&self) -> &str {
        "lookahead"
    }
}
