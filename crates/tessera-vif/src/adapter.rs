use tessera_ir::pattern::{ActionPattern, PatternError};
use tracing::{debug, info, warn};

use crate::params::{AdapterParams, ParamError};

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("adapter '{adapter}' could not prepare: {reason}")]
    Prepare { adapter: String, reason: String },

    #[error("Invalid adapter parameter: {0}")]
    Param(#[from] ParamError),

    #[error("Invalid reject pattern: {0}")]
    Pattern(#[from] PatternError),
}

/// The only interface between the engine and the system under test.
///
/// The engine calls `prepare_for_run` once before the first input, then
/// `send_input` once per executed action with the action's expanded name,
/// and `stop` once at the end. `send_input` returning `false` means the
/// system rejected the input; that is a test verdict, not an engine error.
pub trait Adapter {
    fn name(&self) -> &str;

    fn prepare_for_run(&mut self) -> Result<(), AdapterError>;

    fn send_input(&mut self, action: &str) -> bool;

    fn stop(&mut self);

    /// Called when an external fault is detected, independent of any
    /// `send_input` result.
    fn error_found(&mut self) {}
}

impl<A: Adapter + ?Sized> Adapter for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn prepare_for_run(&mut self) -> Result<(), AdapterError> {
        (**self).prepare_for_run()
    }

    fn send_input(&mut self, action: &str) -> bool {
        (**self).send_input(action)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn error_found(&mut self) {
        (**self).error_found()
    }
}

/// Accepts every input. Used to run the model on its own.
#[derive(Debug, Default)]
pub struct ModelOnlyAdapter {
    inputs: u64,
}

impl ModelOnlyAdapter {
    pub const NAME: &'static str = "model_only";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params<I, K, V>(pairs: I) -> Result<Self, AdapterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        AdapterParams::new(Self::NAME, &[], pairs)?;
        Ok(Self::new())
    }

    pub fn inputs(&self) -> u64 {
        self.inputs
    }
}

impl Adapter for ModelOnlyAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn prepare_for_run(&mut self) -> Result<(), AdapterError> {
        self.inputs = 0;
        Ok(())
    }

    fn send_input(&mut self, _action: &str) -> bool {
        self.inputs += 1;
        true
    }

    fn stop(&mut self) {
        debug!(inputs = self.inputs, "model-only run stopped");
    }
}

/// Records every input and rejects by rule.
///
/// Parameters:
/// - `reject`: pattern; inputs whose full text matches are rejected.
/// - `fail_after`: inputs after this many accepted ones are rejected.
#[derive(Debug, Default)]
pub struct ScriptedAdapter {
    reject: Option<ActionPattern>,
    fail_after: Option<u64>,
    accepted: u64,
    sent: Vec<String>,
    errors_found: u64,
    prepared: bool,
    stopped: bool,
}

impl ScriptedAdapter {
    pub const NAME: &'static str = "scripted";
    pub const PARAMS: &'static [&'static str] = &["reject", "fail_after"];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params<I, K, V>(pairs: I) -> Result<Self, AdapterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params = AdapterParams::new(Self::NAME, Self::PARAMS, pairs)?;
        let reject = params.get("reject").map(ActionPattern::new).transpose()?;
        Ok(Self {
            reject,
            fail_after: params.parse("fail_after")?,
            ..Self::default()
        })
    }

    pub fn rejecting(mut self, pattern: ActionPattern) -> Self {
        self.reject = Some(pattern);
        self
    }

    pub fn failing_after(mut self, accepted: u64) -> Self {
        self.fail_after = Some(accepted);
        self
    }

    /// Every input received, accepted or not.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    pub fn errors_found(&self) -> u64 {
        self.errors_found
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Adapter for ScriptedAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn prepare_for_run(&mut self) -> Result<(), AdapterError> {
        if self.stopped {
            return Err(AdapterError::Prepare {
                adapter: Self::NAME.to_string(),
                reason: "already stopped".to_string(),
            });
        }
        self.prepared = true;
        Ok(())
    }

    fn send_input(&mut self, action: &str) -> bool {
        self.sent.push(action.to_string());
        if !self.prepared || self.stopped {
            warn!(action, "input sent outside a run");
            return false;
        }
        if self.reject.as_ref().is_some_and(|p| p.matches(action)) {
            info!(action, "input rejected by pattern");
            return false;
        }
        if self.fail_after.is_some_and(|limit| self.accepted >= limit) {
            info!(action, accepted = self.accepted, "input rejected after limit");
            return false;
        }
        self.accepted += 1;
        true
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn error_found(&mut self) {
        self.errors_found += 1;
    }
}
