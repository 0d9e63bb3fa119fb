//! Event processor: consumes key events, drives the tracking pool according
//! to the rule table, and emits synthetic repeat presses once per reporting
//! cycle.

use heapless::spsc::Producer;

use crate::hal::{Duration, Instant};
use crate::pool::TrackingPool;
use crate::types::{EventOutcome, Key, KeyEvent, LayerId, RepeaterConfig, Rule};

/// Tap-to-repeat engine.
///
/// Owned by the host's scan loop and driven synchronously: once per physical
/// key-state change through [`on_key_event`](Self::on_key_event) and once per
/// output cycle through [`before_reporting`](Self::before_reporting). The
/// host samples its monotonic clock once per cycle and passes it in; the
/// engine never reads time on its own.
///
/// `CANCEL` is the per-rule cancel key count, `SLOTS` the tracking pool
/// capacity.
pub struct Repeater<'r, const CANCEL: usize = 1, const SLOTS: usize = 4> {
    rules: &'r [Rule<CANCEL>],
    pool: TrackingPool<SLOTS>,
    config: RepeaterConfig,
    engaged: bool,
}

impl<'r, const CANCEL: usize, const SLOTS: usize> Repeater<'r, CANCEL, SLOTS> {
    /// Create an engaged engine with an empty rule table
    pub const fn new(config: RepeaterConfig) -> Self {
        Self {
            rules: &[],
            pool: TrackingPool::new(),
            config,
            engaged: true,
        }
    }

    /// Install the rule table, replacing any prior one.
    ///
    /// The engine borrows the slice for its lifetime; rules are evaluated in
    /// array order on every event.
    pub fn register_rules(&mut self, rules: &'r [Rule<CANCEL>]) {
        self.rules = rules;
    }

    pub fn set_tap_timeout(&mut self, tap_timeout: Duration) {
        self.config.tap_timeout = tap_timeout;
    }

    /// Restrict the engine to run only while `layer` is topmost, or lift the
    /// restriction with `None`
    pub fn set_layer_restriction(&mut self, layer: Option<LayerId>) {
        self.config.limited_to_layer = layer;
    }

    pub fn activate(&mut self) {
        self.engaged = true;
    }

    /// Disengage and drop all tracked keys. Nothing is emitted until the
    /// engine is reactivated and a fresh tap occurs.
    pub fn deactivate(&mut self) {
        self.engaged = false;
        self.pool.stop_all();
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Stop repeating `key` across all rules
    pub fn stop(&mut self, key: Key) {
        self.pool.stop(key);
    }

    /// Clear every tracked key without disengaging
    pub fn stop_all(&mut self) {
        self.pool.stop_all();
    }

    pub fn config(&self) -> &RepeaterConfig {
        &self.config
    }

    fn layer_allows(&self, active_layer: LayerId) -> bool {
        match self.config.limited_to_layer {
            Some(layer) => layer == active_layer,
            None => true,
        }
    }

    /// Process one event from the host's input pipeline.
    ///
    /// Events without a matrix address or carrying the injected flag are
    /// ignored so the engine never reacts to its own synthetic presses.
    ///
    /// On a press edge every rule is checked twice, in array order: once as
    /// a potential action key (starts a tap timer unless the target already
    /// repeats or the key is already timing) and once as a cancel key (stops
    /// the rule's target). A key may be both for different rules; both
    /// effects apply in the same pass. On a release edge each rule whose
    /// action key matches resolves its timer to tap or hold.
    pub fn on_key_event(
        &mut self,
        event: &KeyEvent,
        active_layer: LayerId,
        now: Instant,
    ) -> EventOutcome {
        if !self.engaged || !self.layer_allows(active_layer) {
            return EventOutcome::Ignored;
        }
        if event.addr.is_none() || event.state.is_injected() {
            return EventOutcome::Ignored;
        }

        let rules = self.rules;
        if event.state.is_toggled_on() {
            for rule in rules {
                if event.key == rule.action
                    && !self.pool.is_repeating(rule.target)
                    && !self.pool.is_timing(event.key)
                {
                    self.pool.start_timer(event.key, now);
                }
                if rule.is_cancel_key(event.key) {
                    self.pool.stop(rule.target);
                }
            }
        } else if event.state.is_toggled_off() {
            for rule in rules {
                if event.key == rule.action {
                    self.pool.resolve_tap_or_timeout(
                        rule.action,
                        rule.target,
                        self.config.tap_timeout,
                        now,
                    );
                }
            }
        }
        // Held and matrix-level repeat states change nothing.

        EventOutcome::Proceed
    }

    /// Emit one synthetic held press per repeating slot into the host's
    /// injection queue. Called once per output cycle, before the report
    /// assembler runs. Returns the number of events enqueued; slots that do
    /// not fit this cycle are retried on the next one.
    pub fn before_reporting<const N: usize>(
        &self,
        active_layer: LayerId,
        queue: &mut Producer<'_, KeyEvent, N>,
    ) -> usize {
        if !self.engaged || !self.layer_allows(active_layer) {
            return 0;
        }

        let mut injected = 0;
        for key in self.pool.repeating() {
            if queue.enqueue(KeyEvent::injected_repeat(key)).is_ok() {
                injected += 1;
            }
        }
        injected
    }
}
