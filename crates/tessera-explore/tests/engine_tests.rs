use tessera_ir::lsts::Lsts;
use tessera_ir::template::TemplateTable;
use tessera_ir::Action;
use tessera_model::{LstsModel, Model, SyntheticModel, Transition};
use tessera_vif::{ModelOnlyAdapter, ScriptedAdapter};

use tessera_explore::engine::{EngineError, StepOutcome, StopReason, TestEngine, Verdict};
use tessera_explore::guidance::{
    Guidance, GuidanceError, LookaheadGuidance, RandomGuidance, VerificationLoopGuidance,
    VerificationPrefixes,
};
use tessera_explore::requirement::{NullRequirement, Requirement, SequenceRequirement};

/// Always takes the first enabled transition.
struct FirstEnabled;

impl<M: Model> Guidance<M> for FirstEnabled {
    fn suggest(
        &mut self,
        _model: &mut M,
        _state: &M::State,
        outgoing: &[Transition<M::State>],
        _requirement: &mut dyn Requirement<M::State>,
    ) -> Result<Transition<M::State>, GuidanceError> {
        outgoing.first().cloned().ok_or(GuidanceError::NoChoice)
    }

    fn name(&self) -> &str {
        "first_enabled"
    }
}

/// Forgets to pop its speculative checkpoint.
struct LeakyGuidance;

impl<M: Model> Guidance<M> for LeakyGuidance {
    fn suggest(
        &mut self,
        _model: &mut M,
        _state: &M::State,
        outgoing: &[Transition<M::State>],
        requirement: &mut dyn Requirement<M::State>,
    ) -> Result<Transition<M::State>, GuidanceError> {
        let _ = requirement.push();
        outgoing.first().cloned().ok_or(GuidanceError::NoChoice)
    }

    fn name(&self) -> &str {
        "leaky"
    }
}

/// Returns a transition the model never offered.
struct MadeUpGuidance;

impl<M: Model> Guidance<M> for MadeUpGuidance {
    fn suggest(
        &mut self,
        _model: &mut M,
        state: &M::State,
        _outgoing: &[Transition<M::State>],
        _requirement: &mut dyn Requirement<M::State>,
    ) -> Result<Transition<M::State>, GuidanceError> {
        Ok(Transition {
            source: state.clone(),
            action: Action::new(999, "teleport"),
            dest: state.clone(),
        })
    }

    fn name(&self) -> &str {
        "made_up"
    }
}

fn verification_model() -> LstsModel {
    // A=0 offers {other, start_sv_x}; B=1 {step1}; C=2 {end_sv_x}; D=3 {back}.
    let lsts = Lsts::new(4, 0)
        .with_transition(0, "other", 3)
        .with_transition(0, "start_sv_x", 1)
        .with_transition(1, "step1", 2)
        .with_transition(2, "end_sv_x", 0)
        .with_transition(3, "back", 0);
    LstsModel::new(&lsts).unwrap()
}

#[test]
fn test_verification_loop_scenario() {
    let guidance = VerificationLoopGuidance::new(FirstEnabled, VerificationPrefixes::default());
    let mut engine = TestEngine::new(
        verification_model(),
        guidance,
        Box::new(NullRequirement::new()),
        ModelOnlyAdapter::new(),
    );
    let report = engine.run(6).unwrap();

    // The loop runs once; back at A the fallback decides ("other"), and after
    // that unrelated move the loop is offered again.
    let actions: Vec<&str> = report.trace.actions().collect();
    assert_eq!(
        actions,
        ["start_sv_x", "step1", "end_sv_x", "other", "back", "start_sv_x"]
    );
    assert_eq!(report.stop_reason, StopReason::StepLimit);
    assert_eq!(report.verdict, Verdict::Inconclusive);
}

#[test]
fn test_loop_steps_are_visible_to_requirements() {
    let guidance = VerificationLoopGuidance::new(FirstEnabled, VerificationPrefixes::default());
    let requirement = SequenceRequirement::parse("step1 THEN end_sv_x").unwrap();
    let mut engine = TestEngine::new(
        verification_model(),
        guidance,
        Box::new(requirement),
        ModelOnlyAdapter::new(),
    );
    let report = engine.run(10).unwrap();
    assert_eq!(report.stop_reason, StopReason::RequirementMet);
    assert_eq!(report.verdict, Verdict::Pass);
    assert_eq!(report.steps, 3);
    assert_eq!(report.percentage, 1.0);
}

#[test]
fn test_lookahead_meets_sequence() {
    let requirement = SequenceRequirement::parse("inc THEN inc THEN reset").unwrap();
    let mut engine = TestEngine::new(
        SyntheticModel::new(),
        LookaheadGuidance::new(3, 11),
        Box::new(requirement),
        ModelOnlyAdapter::new(),
    );
    let report = engine.run(50).unwrap();
    assert_eq!(report.verdict, Verdict::Pass);
    assert_eq!(
        report.trace.actions().collect::<Vec<_>>(),
        ["inc", "inc", "reset"]
    );
    assert_eq!(engine.adapter().inputs(), 3);
}

#[test]
fn test_rejection_fails_the_run() {
    let requirement = SequenceRequirement::parse("inc THEN inc THEN inc THEN inc").unwrap();
    let mut engine = TestEngine::new(
        SyntheticModel::new(),
        LookaheadGuidance::new(2, 0),
        Box::new(requirement),
        ScriptedAdapter::new().failing_after(2),
    );
    let report = engine.run(50).unwrap();
    assert_eq!(report.stop_reason, StopReason::AdapterRejected);
    assert_eq!(report.verdict, Verdict::Fail);
    assert_eq!(report.steps, 3);
    // The rejected input never reached the requirement.
    assert_eq!(report.percentage, 0.5);
    let last = report.trace.steps().last().unwrap();
    assert!(!last.accepted);
    assert!(engine.adapter().is_stopped());
}

#[test]
fn test_deadlock_is_inconclusive() {
    let lsts = Lsts::new(2, 0).with_transition(0, "only", 1);
    let mut engine = TestEngine::new(
        LstsModel::new(&lsts).unwrap(),
        RandomGuidance::seeded(3),
        Box::new(NullRequirement::new()),
        ModelOnlyAdapter::new(),
    );
    let report = engine.run(10).unwrap();
    assert_eq!(report.stop_reason, StopReason::Deadlock);
    assert_eq!(report.verdict, Verdict::Inconclusive);
    assert_eq!(report.steps, 1);
}

#[test]
fn test_templates_expand_before_sending() {
    let lsts = Lsts::new(1, 0).with_transition(0, "login $(user)$", 0);
    let mut templates = TemplateTable::new();
    templates.insert("user", "alice");
    let mut engine = TestEngine::new(
        LstsModel::new(&lsts).unwrap(),
        FirstEnabled,
        Box::new(NullRequirement::new()),
        ScriptedAdapter::new(),
    )
    .with_templates(templates);
    engine.run(2).unwrap();
    assert_eq!(engine.adapter().sent(), ["login alice", "login alice"]);
    let step = &engine.trace().steps()[0];
    assert_eq!(step.action, "login $(user)$");
    assert_eq!(step.input, "login alice");
}

#[test]
fn test_undefined_template_is_a_typed_error() {
    let lsts = Lsts::new(1, 0).with_transition(0, "login $(nobody)$", 0);
    let mut engine = TestEngine::new(
        LstsModel::new(&lsts).unwrap(),
        FirstEnabled,
        Box::new(NullRequirement::new()),
        ScriptedAdapter::new(),
    );
    let err = engine.run(5).unwrap_err();
    assert!(matches!(err, EngineError::Expand(_)));
    assert!(engine.adapter().sent().is_empty());
    assert!(engine.adapter().is_stopped());
}

#[test]
fn test_reported_error_fails_run() {
    let mut engine = TestEngine::new(
        SyntheticModel::new(),
        FirstEnabled,
        Box::new(NullRequirement::new()),
        ScriptedAdapter::new(),
    );
    engine.start().unwrap();
    assert!(matches!(engine.step().unwrap(), StepOutcome::Executed(_)));
    engine.report_error();
    let report = engine.report(StopReason::StepLimit);
    assert_eq!(report.verdict, Verdict::Fail);
    assert_eq!(engine.adapter().errors_found(), 1);
}

#[test]
fn test_lifecycle_misuse() {
    let mut engine = TestEngine::new(
        SyntheticModel::new(),
        FirstEnabled,
        Box::new(NullRequirement::new()),
        ModelOnlyAdapter::new(),
    );
    assert!(matches!(engine.step(), Err(EngineError::NotRunning)));
    engine.start().unwrap();
    assert!(matches!(engine.start(), Err(EngineError::AlreadyStarted)));
    engine.stop();
    assert!(matches!(engine.step(), Err(EngineError::NotRunning)));
}

#[test]
fn test_unbalanced_guidance_is_caught() {
    let mut engine = TestEngine::new(
        SyntheticModel::new(),
        LeakyGuidance,
        Box::new(SequenceRequirement::parse("inc").unwrap()),
        ModelOnlyAdapter::new(),
    );
    let err = engine.run(5).unwrap_err();
    assert!(matches!(
        err,
        EngineError::UnbalancedSpeculation { depth: 1 }
    ));
    assert_eq!(engine.adapter().inputs(), 0);
}

#[test]
fn test_invented_transition_is_rejected() {
    let mut engine = TestEngine::new(
        SyntheticModel::new(),
        MadeUpGuidance,
        Box::new(NullRequirement::new()),
        ModelOnlyAdapter::new(),
    );
    let err = engine.run(5).unwrap_err();
    assert!(matches!(err, EngineError::InvalidChoice { .. }));
}
