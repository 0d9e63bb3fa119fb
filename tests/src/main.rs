// Scenario runner for the tap-to-repeat engine: replays the headline
// timelines against a real engine and prints what each cycle emitted.

use repeater_core::test_utils::event_script::KeyScript;
use repeater_core::test_utils::harness::run_script;
use repeater_core::{Key, Repeater, RepeaterConfig, Rule, VERSION};

const A: Key = Key::plain(0x04);
const C: Key = Key::plain(0x29);
const R: Key = Key::plain(0x15);

fn main() {
    println!("🧪 Tap-to-repeat scenario runner (repeater-core {VERSION})");
    println!();

    scenario_tap_then_cancel();
    scenario_hold();
    scenario_layer_gate();

    println!("✅ All scenarios behaved as specified");
    println!();
    println!("📝 Run the full suite with: cargo test");
}

/// Tap A within the timeout, watch R repeat, cancel with C.
fn scenario_tap_then_cancel() {
    println!("Scenario 1: tap at 100ms (< 150ms timeout), cancel at 500ms");

    let rules = [Rule::new(A, R, [C])];
    let mut engine = Repeater::<1, 4>::new(RepeaterConfig::default());
    engine.register_rules(&rules);

    let script = KeyScript::tap(A, 0, 100).press(C, 500);
    let capture = run_script(&mut engine, &script, 0, 10, 700);

    let cycles = capture.cycles_with(R);
    println!(
        "  R injected in {} cycles, first at {}ms, last at {}ms",
        cycles.len(),
        cycles.first().unwrap(),
        cycles.last().unwrap()
    );
    assert_eq!(cycles.first(), Some(&100));
    assert!(capture.quiet_from(500));
    println!("  ✅ repeat started on tap, stopped on cancel");
}

/// Hold A past the timeout: nothing ever repeats.
fn scenario_hold() {
    println!("Scenario 2: release at 200ms (> 150ms timeout)");

    let rules = [Rule::new(A, R, [C])];
    let mut engine = Repeater::<1, 4>::new(RepeaterConfig::default());
    engine.register_rules(&rules);

    let script = KeyScript::tap(A, 0, 200);
    let capture = run_script(&mut engine, &script, 0, 10, 500);

    assert_eq!(capture.injections_of(R), 0);
    println!("  ✅ hold classified correctly, zero injections");
}

/// Layer-restricted engine ignores events on other layers.
fn scenario_layer_gate() {
    println!("Scenario 3: engine limited to layer 1, tap arrives on layer 0");

    let rules = [Rule::new(A, R, [C])];
    let mut engine = Repeater::<1, 4>::new(RepeaterConfig::default());
    engine.register_rules(&rules);
    engine.set_layer_restriction(Some(1));

    let script = KeyScript::tap(A, 0, 100);
    let capture = run_script(&mut engine, &script, 0, 10, 300);
    assert_eq!(capture.injections_of(R), 0);

    let script = KeyScript::tap(A, 0, 100);
    let capture = run_script(&mut engine, &script, 1, 10, 300);
    assert!(capture.injections_of(R) > 0);
    println!("  ✅ layer gate drops foreign-layer taps, passes matching ones");
}
