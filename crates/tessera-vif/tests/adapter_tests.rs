use tessera_ir::pattern::ActionPattern;
use tessera_vif::{Adapter, AdapterError, ModelOnlyAdapter, ParamError, ScriptedAdapter};

#[test]
fn test_model_only_accepts_everything() {
    let mut adapter = ModelOnlyAdapter::new();
    adapter.prepare_for_run().unwrap();
    assert!(adapter.send_input("anything"));
    assert!(adapter.send_input("else"));
    adapter.stop();
    assert_eq!(adapter.inputs(), 2);
}

#[test]
fn test_model_only_takes_no_params() {
    let err = ModelOnlyAdapter::from_params([("verbose", "1")]).unwrap_err();
    assert!(matches!(err, AdapterError::Param(ParamError::Unknown { .. })));
}

#[test]
fn test_scripted_reject_pattern() {
    let mut adapter = ScriptedAdapter::from_params([("reject", "end_.*")]).unwrap();
    adapter.prepare_for_run().unwrap();
    assert!(adapter.send_input("call"));
    assert!(!adapter.send_input("end_call"));
    assert!(adapter.send_input("bill"));
    assert_eq!(adapter.sent(), ["call", "end_call", "bill"]);
}

#[test]
fn test_scripted_fail_after() {
    let mut adapter = ScriptedAdapter::new().failing_after(2);
    adapter.prepare_for_run().unwrap();
    assert!(adapter.send_input("a"));
    assert!(adapter.send_input("b"));
    assert!(!adapter.send_input("c"));
}

#[test]
fn test_scripted_requires_prepare() {
    let mut adapter = ScriptedAdapter::new();
    assert!(!adapter.send_input("a"));
    adapter.prepare_for_run().unwrap();
    assert!(adapter.send_input("a"));
    adapter.stop();
    assert!(adapter.is_stopped());
    assert!(!adapter.send_input("a"));
    assert!(adapter.prepare_for_run().is_err());
}

#[test]
fn test_scripted_error_found_is_independent_of_inputs() {
    let mut adapter = ScriptedAdapter::new().rejecting(ActionPattern::literal("x").unwrap());
    adapter.prepare_for_run().unwrap();
    adapter.error_found();
    assert!(adapter.send_input("y"));
    assert_eq!(adapter.errors_found(), 1);
}

#[test]
fn test_scripted_bad_params() {
    assert!(matches!(
        ScriptedAdapter::from_params([("fail_after", "soon")]),
        Err(AdapterError::Param(ParamError::InvalidValue { .. }))
    ));
    assert!(matches!(
        ScriptedAdapter::from_params([("reject", "(")]),
        Err(AdapterError::Pattern(_))
    ));
}
