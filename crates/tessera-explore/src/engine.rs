use std::fmt;

use tessera_ir::action::Action;
use tessera_ir::template::{ExpandError, TemplateTable};
use tessera_model::{Model, ModelError};
use tessera_vif::adapter::{Adapter, AdapterError};
use tracing::{debug, info, warn};

use crate::guidance::{Guidance, GuidanceError};
use crate::requirement::Requirement;
use crate::trace::RunTrace;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine is not running (call start first)")]
    NotRunning,

    #[error("engine was already started")]
    AlreadyStarted,

    #[error("guidance '{guidance}' chose '{action}', which is not enabled in the current state")]
    InvalidChoice { guidance: String, action: String },

    #[error("guidance left {depth} requirement checkpoint(s) outstanding")]
    UnbalancedSpeculation { depth: usize },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Guidance error: {0}")]
    Guidance(#[from] GuidanceError),

    #[error("Template error: {0}")]
    Expand(#[from] ExpandError),

    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requirement reached 100%.
    RequirementMet,
    /// The current state has no outgoing transitions.
    Deadlock,
    /// The adapter returned `false` for an input.
    AdapterRejected,
    /// The step budget ran out.
    StepLimit,
    /// The wall-clock budget ran out.
    WallTimeExceeded,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::RequirementMet => write!(f, "requirement met"),
            StopReason::Deadlock => write!(f, "deadlock"),
            StopReason::AdapterRejected => write!(f, "input rejected by adapter"),
            StopReason::StepLimit => write!(f, "step limit reached"),
            StopReason::WallTimeExceeded => write!(f, "wall time exceeded"),
        }
    }
}

/// Outcome of a run, from the system under test's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The requirement was met with no fault reported.
    Pass,
    /// An input was rejected or a fault was reported.
    Fail,
    /// The run ended before the requirement was met, without a failure.
    Inconclusive,
}

impl Verdict {
    /// Any reported fault fails the run regardless of how it stopped.
    pub fn from_stop(reason: StopReason, errors_found: u64) -> Self {
        if errors_found > 0 {
            return Verdict::Fail;
        }
        match reason {
            StopReason::RequirementMet => Verdict::Pass,
            StopReason::AdapterRejected => Verdict::Fail,
            StopReason::Deadlock | StopReason::StepLimit | StopReason::WallTimeExceeded => {
                Verdict::Inconclusive
            }
        }
    }
}

/// Result of a single engine step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The adapter accepted the action; the model moved.
    Executed(Action),
    /// The adapter rejected the action; the model did not move.
    Rejected(Action),
    /// Nothing to execute from the current state.
    Deadlock,
    /// The requirement was already complete; nothing was sent.
    RequirementMet,
}

impl StepOutcome {
    /// The stop reason this outcome implies, if the run should end.
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            StepOutcome::Executed(_) => None,
            StepOutcome::Rejected(_) => Some(StopReason::AdapterRejected),
            StepOutcome::Deadlock => Some(StopReason::Deadlock),
            StepOutcome::RequirementMet => Some(StopReason::RequirementMet),
        }
    }
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub verdict: Verdict,
    pub stop_reason: StopReason,
    /// Inputs sent to the adapter, including a final rejected one.
    pub steps: u64,
    /// Requirement percentage at the end of the run.
    pub percentage: f64,
    /// Faults reported through [`TestEngine::report_error`].
    pub errors_found: u64,
    /// Every input sent, in order.
    pub trace: RunTrace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Running,
    Stopped,
}

/// The driving loop: ask guidance for a transition, send it to the adapter,
/// and on acceptance feed it to the requirement and the guidance.
///
/// A rejected input ends the run with a failing verdict; it is never retried
/// and never reaches the requirement.
pub struct TestEngine<M: Model, G, A> {
    model: M,
    guidance: G,
    adapter: A,
    requirement: Box<dyn Requirement<M::State>>,
    templates: TemplateTable,
    state: M::State,
    trace: RunTrace,
    steps: u64,
    errors_found: u64,
    phase: Phase,
}

impl<M, G, A> TestEngine<M, G, A>
where
    M: Model,
    G: Guidance<M>,
    A: Adapter,
{
    /// Build an engine positioned at the model's initial state.
    pub fn new(
        mut model: M,
        guidance: G,
        requirement: Box<dyn Requirement<M::State>>,
        adapter: A,
    ) -> Self {
        let state = model.initial_state();
        Self {
            model,
            guidance,
            adapter,
            requirement,
            templates: TemplateTable::new(),
            state,
            trace: RunTrace::new(),
            steps: 0,
            errors_found: 0,
            phase: Phase::Ready,
        }
    }

    /// Expand `$(name)$` placeholders in action names before sending.
    pub fn with_templates(mut self, templates: TemplateTable) -> Self {
        self.templates = templates;
        self
    }

    /// Prepare the adapter. Must be called once before `step`.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::Ready {
            return Err(EngineError::AlreadyStarted);
        }
        self.adapter.prepare_for_run()?;
        self.phase = Phase::Running;
        info!(
            guidance = self.guidance.name(),
            requirement = self.requirement.name(),
            adapter = self.adapter.name(),
            "test run started"
        );
        Ok(())
    }

    /// Choose one transition, send it, and on acceptance move the model and
    /// update the requirement and guidance.
    ///
    /// Fails if the guidance leaves requirement checkpoints outstanding or
    /// picks a transition the current state does not offer.
    pub fn step(&mut self) -> Result<StepOutcome, EngineError> {
        if self.phase != Phase::Running {
            return Err(EngineError::NotRunning);
        }
        if self.requirement.is_complete() {
            return Ok(StepOutcome::RequirementMet);
        }

        let outgoing = self.model.outgoing(&self.state)?;
        if outgoing.is_empty() {
            warn!(state = ?self.state, "no outgoing transitions");
            return Ok(StepOutcome::Deadlock);
        }

        let chosen = self.guidance.suggest(
            &mut self.model,
            &self.state,
            &outgoing,
            self.requirement.as_mut(),
        )?;
        let depth = self.requirement.depth();
        if depth != 0 {
            return Err(EngineError::UnbalancedSpeculation { depth });
        }
        if !outgoing.contains(&chosen) {
            return Err(EngineError::InvalidChoice {
                guidance: self.guidance.name().to_string(),
                action: chosen.action.name().to_string(),
            });
        }

        let input = self.templates.expand(chosen.action.name())?;
        let accepted = self.adapter.send_input(&input);
        self.steps += 1;

        if !accepted {
            info!(action = %chosen.action, input = input.as_str(), "input rejected");
            self.trace.record(
                chosen.action.name(),
                input,
                false,
                self.requirement.percentage(),
            );
            return Ok(StepOutcome::Rejected(chosen.action));
        }

        self.requirement.mark_executed(&chosen);
        self.guidance.mark_executed(&chosen);
        let percentage = self.requirement.percentage();
        debug!(
            step = self.steps,
            action = %chosen.action,
            percentage,
            "executed"
        );
        self.trace.record(chosen.action.name(), input, true, percentage);
        self.state = chosen.dest;
        Ok(StepOutcome::Executed(chosen.action))
    }

    /// Report a fault detected outside `send_input`. Fails the run.
    pub fn report_error(&mut self) {
        self.errors_found += 1;
        self.adapter.error_found();
    }

    /// Stop the adapter if the run was started. Idempotent.
    pub fn stop(&mut self) {
        if self.phase == Phase::Running {
            self.adapter.stop();
        }
        self.phase = Phase::Stopped;
    }

    /// Start, step until the run ends or `max_steps` inputs have been sent,
    /// then stop the adapter.
    pub fn run(&mut self, max_steps: u64) -> Result<RunReport, EngineError> {
        self.start()?;
        let result = self.drive(max_steps);
        self.stop();
        let reason = result?;
        Ok(self.report(reason))
    }

    fn drive(&mut self, max_steps: u64) -> Result<StopReason, EngineError> {
        loop {
            if self.steps >= max_steps {
                return Ok(StopReason::StepLimit);
            }
            if let Some(reason) = self.step()?.stop_reason() {
                return Ok(reason);
            }
        }
    }

    /// Snapshot the run so far as a report ending with `stop_reason`.
    pub fn report(&self, stop_reason: StopReason) -> RunReport {
        let verdict = Verdict::from_stop(stop_reason, self.errors_found);
        info!(
            reason = %stop_reason,
            verdict = ?verdict,
            steps = self.steps,
            "test run finished"
        );
        RunReport {
            verdict,
            stop_reason,
            steps: self.steps,
            percentage: self.requirement.percentage(),
            errors_found: self.errors_found,
            trace: self.trace.clone(),
        }
    }

    pub fn state(&self) -> &M::State {
        &self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn trace(&self) -> &RunTrace {
        &self.trace
    }

    pub fn requirement(&self) -> &dyn Requirement<M::State> {
        self.requirement.as_ref()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn guidance(&self) -> &G {
        &self.guidance
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}
