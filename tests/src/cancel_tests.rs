//! Cancellation, slot reuse, and pool-capacity behavior

use proptest::prelude::*;
use repeater_core::test_utils::event_script::KeyScript;
use repeater_core::test_utils::harness::run_script;
use repeater_core::{Key, Repeater, RepeaterConfig, Rule};

const A: Key = Key::plain(0x04);
const B: Key = Key::plain(0x05);
const C: Key = Key::plain(0x29);
const D: Key = Key::plain(0x2a);
const R: Key = Key::plain(0x15);
const R2: Key = Key::plain(0x16);

fn engine(rules: &[Rule]) -> Repeater<'_, 1, 4> {
    let mut engine = Repeater::new(RepeaterConfig::default());
    engine.register_rules(rules);
    engine
}

/// A cancel key stops only the rule it belongs to.
#[test]
fn test_cancel_is_per_rule() {
    let rules = [Rule::new(A, R, [C]), Rule::new(B, R2, [D])];
    let mut engine = engine(&rules);

    let script = KeyScript::new("Two repeats, one cancel")
        .press(A, 0)
        .release(A, 50)
        .press(B, 60)
        .release(B, 110)
        .press(C, 300);
    let capture = run_script(&mut engine, &script, 0, 10, 500);

    // R stops at 300, R2 keeps going to the end of the run.
    assert_eq!(capture.cycles_with(R).last(), Some(&290));
    assert_eq!(capture.cycles_with(R2).last(), Some(&500));
}

/// One cancel key may appear in several rules and stops all their targets.
#[test]
fn test_shared_cancel_key() {
    let rules = [Rule::new(A, R, [C]), Rule::new(B, R2, [C])];
    let mut engine = engine(&rules);

    let script = KeyScript::new("Shared cancel")
        .press(A, 0)
        .release(A, 50)
        .press(B, 60)
        .release(B, 110)
        .press(C, 200);
    let capture = run_script(&mut engine, &script, 0, 10, 400);

    assert!(capture.injections_of(R) > 0);
    assert!(capture.injections_of(R2) > 0);
    assert!(capture.quiet_from(200));
}

/// Two rules sharing a target never produce a second repeat source, and one
/// cancel press silences the target for good.
#[test]
fn test_shared_target_single_source() {
    let rules = [Rule::new(A, R, [C]), Rule::new(B, R, [C])];
    let mut engine = engine(&rules);

    let script = KeyScript::new("Shared target")
        .press(A, 0)
        .release(A, 50)
        .press(B, 60)
        .release(B, 110)
        .press(C, 300);
    let capture = run_script(&mut engine, &script, 0, 10, 500);

    for cycle in capture.cycles() {
        assert!(cycle.keys.iter().filter(|&&k| k == R).count() <= 1);
    }
    assert!(capture.quiet_from(300));
}

/// With a two-slot pool, a third concurrent tap attempt is dropped without
/// disturbing the two tracked ones.
#[test]
fn test_pool_exhaustion_drops_new_taps() {
    const A3: Key = Key::plain(0x06);
    const R3: Key = Key::plain(0x17);
    let rules = [
        Rule::new(A, R, [C]),
        Rule::new(B, R2, [C]),
        Rule::new(A3, R3, [C]),
    ];
    let mut engine: Repeater<'_, 1, 2> = Repeater::new(RepeaterConfig::default());
    engine.register_rules(&rules);

    let script = KeyScript::new("Three taps, two slots")
        .press(A, 0)
        .press(B, 10)
        .press(A3, 20)
        .release(A, 50)
        .release(B, 60)
        .release(A3, 70);
    let capture = run_script(&mut engine, &script, 0, 10, 200);

    assert!(capture.injections_of(R) > 0);
    assert!(capture.injections_of(R2) > 0);
    assert_eq!(capture.injections_of(R3), 0);
}

/// Cancelling a target that is not repeating changes nothing.
#[test]
fn test_cancel_noop_when_idle() {
    let rules = [Rule::new(A, R, [C])];
    let mut engine = engine(&rules);

    let script = KeyScript::new("Cancel only").press(C, 0).press(C, 50);
    let capture = run_script(&mut engine, &script, 0, 10, 150);
    assert!(capture.quiet_from(0));
}

proptest! {
    /// Arbitrary press/release interleavings never produce an injected key
    /// outside the registered targets, never duplicate a target within a
    /// cycle, and always go quiet after stop_all().
    #[test]
    fn prop_injections_are_well_formed(
        edges in proptest::collection::vec((0u8..6, any::<bool>(), 1u64..40), 0..48)
    ) {
        let keys = [A, B, C, D, R, R2];
        let rules = [Rule::new(A, R, [C]), Rule::new(B, R2, [C])];
        let mut engine = engine(&rules);

        let mut script = KeyScript::new("Fuzz");
        let mut at_ms = 0;
        for (idx, pressed, dt) in edges {
            at_ms += dt;
            let key = keys[idx as usize];
            script = if pressed {
                script.press(key, at_ms)
            } else {
                script.release(key, at_ms)
            };
        }

        let capture = run_script(&mut engine, &script, 0, 10, at_ms + 100);
        for cycle in capture.cycles() {
            for key in &cycle.keys {
                prop_assert!(*key == R || *key == R2);
            }
            prop_assert!(cycle.keys.iter().filter(|&&k| k == R).count() <= 1);
            prop_assert!(cycle.keys.iter().filter(|&&k| k == R2).count() <= 1);
        }

        engine.stop_all();
        let silence = KeyScript::new("Silence");
        let capture = run_script(&mut engine, &silence, 0, 10, 100);
        prop_assert!(capture.quiet_from(0));
    }
}
