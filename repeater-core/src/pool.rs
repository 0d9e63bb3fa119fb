//! Fixed-capacity tracking pool: the stateful heart of the engine.
//!
//! Each slot either times an action key (tap vs. hold not yet decided) or
//! repeats a target key (tap confirmed, synthetic presses flowing). A slot
//! whose key is [`Key::NONE`] is free.

use crate::hal::{Duration, Instant};
use crate::types::Key;

/// One tracking slot
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct TrackedKey {
    /// Action key being timed, or target key being repeated
    key: Key,
    /// When the action key went down. Meaningful only while `is_timer`.
    tap_start: Instant,
    /// Timing an action key (true) vs. repeating a target key (false)
    is_timer: bool,
}

impl TrackedKey {
    const EMPTY: TrackedKey = TrackedKey {
        key: Key::NONE,
        tap_start: Instant::from_millis(0),
        is_timer: false,
    };

    fn is_free(&self) -> bool {
        self.key.is_none()
    }
}

/// Bounded pool of tracked keys.
///
/// Every operation is a non-blocking O(`SLOTS`) scan. Capacity exhaustion is
/// policy, not failure: a tap attempt with no free slot is dropped and
/// existing trackers are left untouched.
pub struct TrackingPool<const SLOTS: usize = 4> {
    slots: [TrackedKey; SLOTS],
}

impl<const SLOTS: usize> TrackingPool<SLOTS> {
    pub const fn new() -> Self {
        Self {
            slots: [TrackedKey::EMPTY; SLOTS],
        }
    }

    /// True if some slot is repeating `key`
    pub fn is_repeating(&self, key: Key) -> bool {
        self.slots
            .iter()
            .any(|s| !s.is_timer && !s.is_free() && s.key == key)
    }

    /// True if some slot is timing `key`
    pub fn is_timing(&self, key: Key) -> bool {
        self.slots.iter().any(|s| s.is_timer && s.key == key)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_free()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_free())
    }

    /// Keys of all currently repeating slots, in slot order
    pub fn repeating(&self) -> impl Iterator<Item = Key> + '_ {
        self.slots
            .iter()
            .filter(|s| !s.is_timer && !s.is_free())
            .map(|s| s.key)
    }

    /// Begin timing an action key in the first free slot.
    ///
    /// The caller must not call this for a key that is already timing; the
    /// event processor checks [`is_timing`](Self::is_timing) first. When the
    /// pool is full the call has no effect.
    pub fn start_timer(&mut self, key: Key, now: Instant) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.is_free()) {
            *slot = TrackedKey {
                key,
                tap_start: now,
                is_timer: true,
            };
            #[cfg(feature = "defmt")]
            defmt::trace!("repeater: timing {}", key);
        }
    }

    /// Stop repeating `key`. Timing slots are untouched; cancellation only
    /// affects already-confirmed repeats. No-op when `key` is not repeating.
    pub fn stop(&mut self, key: Key) {
        for slot in self.slots.iter_mut() {
            if !slot.is_timer && slot.key == key {
                slot.key = Key::NONE;
                #[cfg(feature = "defmt")]
                defmt::trace!("repeater: stopped {}", key);
            }
        }
    }

    /// Clear every slot regardless of state
    pub fn stop_all(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.key = Key::NONE;
        }
    }

    /// Decide tap vs. hold on release of `action`.
    ///
    /// Finds the first timing slot for `action`:
    /// - held longer than `timeout`: a hold, the slot is cleared;
    /// - otherwise a tap: the slot converts in place to repeat `target`,
    ///   unless `target` is already repeating from another slot (two rules
    ///   sharing a target), in which case the slot is just cleared.
    ///
    /// Only the first match is processed; at most one timer runs per action
    /// key because the event processor refuses duplicate timers.
    pub fn resolve_tap_or_timeout(
        &mut self,
        action: Key,
        target: Key,
        timeout: Duration,
        now: Instant,
    ) {
        let Some(idx) = self
            .slots
            .iter()
            .position(|s| s.is_timer && s.key == action)
        else {
            return;
        };

        let held = now.duration_since(self.slots[idx].tap_start);
        if held > timeout {
            // Held too long, not a tap.
            self.slots[idx].key = Key::NONE;
        } else if self.is_repeating(target) {
            // Another action key already drives this target; keep the one
            // repeat source and free the slot.
            self.slots[idx].key = Key::NONE;
        } else {
            #[cfg(feature = "defmt")]
            defmt::trace!("repeater: tap confirmed, repeating {}", target);
            self.slots[idx] = TrackedKey {
                key: target,
                tap_start: self.slots[idx].tap_start,
                is_timer: false,
            };
        }
    }
}

impl<const SLOTS: usize> Default for TrackingPool<SLOTS> {
    fn default() -> Self {
        Self::new()
    }
}
