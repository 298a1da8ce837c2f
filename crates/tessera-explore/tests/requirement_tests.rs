use proptest::prelude::*;
use tessera_ir::Action;
use tessera_model::Transition;

use tessera_explore::requirement::{Requirement, SequenceRequirement};

const NAMES: [&str; 3] = ["a", "b", "c"];

fn step(i: usize) -> Transition<u32> {
    Transition {
        source: 0,
        action: Action::new(i as u32, NAMES[i]),
        dest: 0,
    }
}

fn sequence(indices: &[usize]) -> SequenceRequirement {
    let text = indices
        .iter()
        .map(|&i| NAMES[i])
        .collect::<Vec<_>>()
        .join(" THEN ");
    SequenceRequirement::parse(&text).unwrap()
}

fn percentage(req: &SequenceRequirement) -> f64 {
    Requirement::<u32>::percentage(req)
}

proptest! {
    #[test]
    fn prop_progress_is_matched_prefix(
        patterns in prop::collection::vec(0usize..3, 1..8),
        k in 0usize..8,
    ) {
        let k = k.min(patterns.len());
        let mut req = sequence(&patterns);
        prop_assert_eq!(percentage(&req), 0.0);
        for &i in &patterns[..k] {
            req.mark_executed(&step(i));
        }
        let expected = k as f64 / patterns.len() as f64;
        prop_assert!((percentage(&req) - expected).abs() < 1e-12);
    }

    #[test]
    fn prop_push_pop_restores_percentage(
        patterns in prop::collection::vec(0usize..3, 1..8),
        before in prop::collection::vec(0usize..3, 0..10),
        during in prop::collection::vec(0usize..3, 0..10),
    ) {
        let mut req = sequence(&patterns);
        for &i in &before {
            req.mark_executed(&step(i));
        }
        let saved = percentage(&req);
        let checkpoint = Requirement::<u32>::push(&mut req);
        for &i in &during {
            req.mark_executed(&step(i));
        }
        Requirement::<u32>::pop(&mut req, checkpoint).unwrap();
        prop_assert_eq!(percentage(&req), saved);
        prop_assert_eq!(Requirement::<u32>::depth(&req), 0);
    }

    #[test]
    fn prop_percentage_never_decreases(
        patterns in prop::collection::vec(0usize..3, 1..8),
        run in prop::collection::vec(0usize..3, 0..20),
    ) {
        let mut req = sequence(&patterns);
        let mut last = percentage(&req);
        for &i in &run {
            req.mark_executed(&step(i));
            let now = percentage(&req);
            prop_assert!(now >= last);
            prop_assert!(now <= 1.0);
            last = now;
        }
    }
}
