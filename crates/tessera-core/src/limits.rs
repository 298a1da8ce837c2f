//! Resource limits for a test run.
//!
//! The engine itself has no timeouts; the session checks these between real
//! steps and ends the run with a partial report when one is hit.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tessera_explore::engine::StopReason;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Maximum inputs sent to the adapter.
    pub max_steps: u64,
    /// Maximum wall-clock seconds before forced stop.
    pub max_wall_secs: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_wall_secs: 300, // 5 minutes
        }
    }
}

/// Check resource usage against limits.
pub struct ResourceChecker {
    limits: ResourceLimits,
    start_time: Instant,
}

impl ResourceChecker {
    pub fn new(limits: ResourceLimits) -> Self {
        Self {
            limits,
            start_time: Instant::now(),
        }
    }

    /// Returns None if all ok, or the reason for stopping.
    pub fn check(&self, steps: u64) -> Option<StopReason> {
        if steps >= self.limits.max_steps {
            return Some(StopReason::StepLimit);
        }
        if self.wall_time_exceeded() {
            return Some(StopReason::WallTimeExceeded);
        }
        None
    }

    pub fn wall_time_exceeded(&self) -> bool {
        self.start_time.elapsed().as_secs() >= self.limits.max_wall_secs
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }
}
