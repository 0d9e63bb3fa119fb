//! Core data types for the tap-to-repeat engine

use crate::hal::Duration;

/// A logical key as mapped by the host keymap: HID keycode plus modifier
/// flags. The engine never interprets the contents, it only stores and
/// compares values.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Key {
    keycode: u8,
    modifiers: u8,
}

impl Key {
    /// Sentinel marking an unused tracking slot.
    pub const NONE: Key = Key {
        keycode: 0,
        modifiers: 0,
    };

    pub const fn new(keycode: u8, modifiers: u8) -> Self {
        Self { keycode, modifiers }
    }

    /// Plain key without modifiers
    pub const fn plain(keycode: u8) -> Self {
        Self {
            keycode,
            modifiers: 0,
        }
    }

    pub const fn keycode(&self) -> u8 {
        self.keycode
    }

    pub const fn is_none(&self) -> bool {
        self.keycode == 0 && self.modifiers == 0
    }
}

/// Physical position of a key switch in the scan matrix
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyAddr {
    pub row: u8,
    pub col: u8,
}

impl KeyAddr {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// Key switch state flags as delivered by the scanner.
///
/// The current and previous scan states combine into the edge predicates:
/// toggled-on is a fresh press, toggled-off a fresh release, held means the
/// switch was down in both scans. `INJECTED` marks events synthesized by
/// this engine (or another host component) rather than by hardware.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyState(u8);

impl KeyState {
    pub const PRESSED: u8 = 1 << 0;
    pub const WAS_PRESSED: u8 = 1 << 1;
    pub const INJECTED: u8 = 1 << 7;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Fresh press edge
    pub const fn toggled_on() -> Self {
        Self(Self::PRESSED)
    }

    /// Fresh release edge
    pub const fn toggled_off() -> Self {
        Self(Self::WAS_PRESSED)
    }

    /// Key down in this scan and the previous one
    pub const fn held() -> Self {
        Self(Self::PRESSED | Self::WAS_PRESSED)
    }

    /// Synthetic continuously-held press, the shape emitted once per cycle
    /// for every repeating slot
    pub const fn injected_held() -> Self {
        Self(Self::PRESSED | Self::WAS_PRESSED | Self::INJECTED)
    }

    pub const fn is_toggled_on(&self) -> bool {
        self.0 & Self::PRESSED != 0 && self.0 & Self::WAS_PRESSED == 0
    }

    pub const fn is_toggled_off(&self) -> bool {
        self.0 & Self::PRESSED == 0 && self.0 & Self::WAS_PRESSED != 0
    }

    pub const fn is_held(&self) -> bool {
        self.0 & Self::PRESSED != 0 && self.0 & Self::WAS_PRESSED != 0
    }

    pub const fn is_injected(&self) -> bool {
        self.0 & Self::INJECTED != 0
    }
}

/// One key event flowing through the host's input pipeline.
///
/// `addr` is `None` for synthetic events that have no switch behind them.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub key: Key,
    pub addr: Option<KeyAddr>,
    pub state: KeyState,
}

impl KeyEvent {
    /// Physical press edge at the given matrix position
    pub const fn press(key: Key, addr: KeyAddr) -> Self {
        Self {
            key,
            addr: Some(addr),
            state: KeyState::toggled_on(),
        }
    }

    /// Physical release edge at the given matrix position
    pub const fn release(key: Key, addr: KeyAddr) -> Self {
        Self {
            key,
            addr: Some(addr),
            state: KeyState::toggled_off(),
        }
    }

    /// Synthetic held press produced by the reporting pass. Carries no
    /// matrix address, so the event processor ignores its own output.
    pub const fn injected_repeat(key: Key) -> Self {
        Self {
            key,
            addr: None,
            state: KeyState::injected_held(),
        }
    }
}

/// One repetition rule: tapping `action` starts repeating `target`,
/// pressing any of `cancel` stops it.
///
/// `CANCEL` is the per-rule cancel key count, fixed at compile time.
/// Unused cancel positions can be padded with [`Key::NONE`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rule<const CANCEL: usize = 1> {
    pub action: Key,
    pub target: Key,
    pub cancel: [Key; CANCEL],
}

impl<const CANCEL: usize> Rule<CANCEL> {
    pub const fn new(action: Key, target: Key, cancel: [Key; CANCEL]) -> Self {
        Self {
            action,
            target,
            cancel,
        }
    }

    /// Membership test over this rule's cancel keys
    pub fn is_cancel_key(&self, key: Key) -> bool {
        !key.is_none() && self.cancel.iter().any(|&c| c == key)
    }
}

/// Identifier of a keymap layer, assigned by the host's layer stack
pub type LayerId = u8;

/// Engine configuration parameters
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RepeaterConfig {
    /// Maximum press-to-release time for a press to count as a tap
    pub tap_timeout: Duration,
    /// When set, the engine only runs while this layer is topmost
    pub limited_to_layer: Option<LayerId>,
}

impl Default for RepeaterConfig {
    fn default() -> Self {
        Self {
            tap_timeout: Duration::from_millis(150),
            limited_to_layer: None,
        }
    }
}

impl RepeaterConfig {
    /// Create a new configuration with validation
    pub fn new(
        tap_timeout_ms: u64,
        limited_to_layer: Option<LayerId>,
    ) -> Result<Self, &'static str> {
        if tap_timeout_ms == 0 || tap_timeout_ms > 5000 {
            return Err("Tap timeout must be between 1 and 5000ms");
        }

        Ok(Self {
            tap_timeout: Duration::from_millis(tap_timeout_ms),
            limited_to_layer,
        })
    }
}

/// What the host loop should do with an event after the engine saw it
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventOutcome {
    /// Event was evaluated against the rule table; keep processing it
    Proceed,
    /// Engine disengaged, layer gate closed, or synthetic event; no state
    /// was touched
    Ignored,
}
