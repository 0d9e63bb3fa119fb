//! Test utilities for driving the engine with scripted key timelines.
//!
//! Everything here is deterministic: scripts carry absolute millisecond
//! timestamps and the harness converts them to [`Instant`]s, so no time
//! driver or sleeping is involved.

pub mod event_script {
    //! Scripted key press/release timelines

    use heapless::{String, Vec};

    use crate::types::Key;

    /// One scripted edge at an absolute time
    #[derive(Debug, Clone, Copy)]
    pub struct ScriptedEvent {
        pub at_ms: u64,
        pub key: Key,
        pub pressed: bool,
    }

    /// A timeline of key edges to replay against the engine
    #[derive(Debug, Clone)]
    pub struct KeyScript {
        pub events: Vec<ScriptedEvent, 64>,
        pub description: String<32>,
    }

    impl KeyScript {
        pub fn new(description: &str) -> Self {
            Self {
                events: Vec::new(),
                description: String::try_from(description).unwrap_or_default(),
            }
        }

        /// Press-then-release of `key` within a single timeline
        pub fn tap(key: Key, down_ms: u64, up_ms: u64) -> Self {
            Self::new("Tap").press(key, down_ms).release(key, up_ms)
        }

        pub fn press(mut self, key: Key, at_ms: u64) -> Self {
            self.events
                .push(ScriptedEvent {
                    at_ms,
                    key,
                    pressed: true,
                })
                .ok();
            self
        }

        pub fn release(mut self, key: Key, at_ms: u64) -> Self {
            self.events
                .push(ScriptedEvent {
                    at_ms,
                    key,
                    pressed: false,
                })
                .ok();
            self
        }
    }
}

pub mod harness {
    //! Replays a [`KeyScript`](super::event_script::KeyScript) against an
    //! engine, running a reporting cycle at a fixed interval and capturing
    //! every injected event.

    use heapless::spsc::Queue;

    use super::event_script::KeyScript;
    use crate::engine::Repeater;
    use crate::hal::Instant;
    use crate::types::{Key, KeyAddr, KeyEvent, LayerId};

    /// Injected keys observed during one reporting cycle
    #[derive(Debug, Clone)]
    pub struct CycleRecord {
        pub at_ms: u64,
        pub keys: Vec<Key>,
    }

    /// All injections captured over a harness run
    #[derive(Debug, Default)]
    pub struct InjectionCapture {
        cycles: Vec<CycleRecord>,
    }

    impl InjectionCapture {
        pub fn cycles(&self) -> &[CycleRecord] {
            &self.cycles
        }

        /// Total number of injected presses of `key` across all cycles
        pub fn injections_of(&self, key: Key) -> usize {
            self.cycles
                .iter()
                .map(|c| c.keys.iter().filter(|&&k| k == key).count())
                .sum()
        }

        /// True if no cycle at or after `at_ms` injected anything
        pub fn quiet_from(&self, at_ms: u64) -> bool {
            self.cycles
                .iter()
                .filter(|c| c.at_ms >= at_ms)
                .all(|c| c.keys.is_empty())
        }

        /// Cycles (by start time) in which `key` was injected
        pub fn cycles_with(&self, key: Key) -> Vec<u64> {
            self.cycles
                .iter()
                .filter(|c| c.keys.contains(&key))
                .map(|c| c.at_ms)
                .collect()
        }
    }

    /// Replay `script` against `engine`.
    ///
    /// Events fire at their own timestamps; a reporting cycle runs every
    /// `cycle_ms` from 0 through `run_for_ms`. Each scripted key is given a
    /// matrix address derived from its keycode, so all scripted events look
    /// physical to the engine.
    pub fn run_script<const CANCEL: usize, const SLOTS: usize>(
        engine: &mut Repeater<'_, CANCEL, SLOTS>,
        script: &KeyScript,
        active_layer: LayerId,
        cycle_ms: u64,
        run_for_ms: u64,
    ) -> InjectionCapture {
        assert!(cycle_ms > 0, "cycle interval must be non-zero");

        let mut events: Vec<_> = script.events.iter().copied().collect();
        events.sort_by_key(|e| e.at_ms);
        let mut next = 0;

        let mut capture = InjectionCapture::default();
        let mut now_ms = 0;
        while now_ms <= run_for_ms {
            while next < events.len() && events[next].at_ms <= now_ms {
                let scripted = events[next];
                let addr = KeyAddr::new(0, scripted.key.keycode());
                let event = if scripted.pressed {
                    KeyEvent::press(scripted.key, addr)
                } else {
                    KeyEvent::release(scripted.key, addr)
                };
                engine.on_key_event(&event, active_layer, Instant::from_millis(scripted.at_ms));
                next += 1;
            }

            let mut queue: Queue<KeyEvent, 16> = Queue::new();
            let (mut producer, mut consumer) = queue.split();
            engine.before_reporting(active_layer, &mut producer);

            let mut keys = Vec::new();
            while let Some(event) = consumer.dequeue() {
                keys.push(event.key);
            }
            capture.cycles.push(CycleRecord { at_ms: now_ms, keys });

            now_ms += cycle_ms;
        }
        capture
    }
}
