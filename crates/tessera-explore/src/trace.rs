/// One input sent to the system under test.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceStep {
    /// Step number (monotonic within the run).
    pub step_number: u64,
    /// The model action chosen.
    pub action: String,
    /// The text actually sent, after template expansion.
    pub input: String,
    /// Whether the adapter accepted the input.
    pub accepted: bool,
    /// Requirement percentage after the step.
    pub percentage: f64,
}

/// Full record of a run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunTrace {
    steps: Vec<TraceStep>,
    next_step: u64,
}

impl RunTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step, numbering it after the previous one.
    pub fn record(&mut self, action: &str, input: String, accepted: bool, percentage: f64) {
        self.steps.push(TraceStep {
            step_number: self.next_step,
            action: action.to_string(),
            input,
            accepted,
            percentage,
        });
        self.next_step += 1;
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    /// Actions in execution order.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.action.as_str())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
