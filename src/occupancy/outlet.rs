//! Outlet command deduplication.
//!
//! The outlet gives no acknowledgement, so the believed state is updated
//! optimistically the moment a command is forwarded.  `force_off` skips the
//! dedup check; it backs the periodic re-assertion and the shutdown path.

use core::fmt;

use crate::app::ports::OutletPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutletState {
    On,
    Off,
}

impl OutletState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for OutletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Believed outlet state plus the dedup rules around it.
#[derive(Debug, Clone, Default)]
pub struct OutletGate {
    commanded_on: bool,
}

impl OutletGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.commanded_on
    }

    /// Forward `on` unless already believed on.  Returns whether a command went out.
    pub fn request_on(&mut self, port: &mut impl OutletPort) -> bool {
        if self.commanded_on {
            return false;
        }
        port.set_state(OutletState::On);
        self.commanded_on = true;
        true
    }

    /// Forward `off` only if believed on.  Returns whether a command went out.
    pub fn request_off(&mut self, port: &mut impl OutletPort) -> bool {
        if !self.commanded_on {
            return false;
        }
        port.set_state(OutletState::Off);
        self.commanded_on = false;
        true
    }

    /// Always forward `off`.
    pub fn force_off(&mut self, port: &mut impl OutletPort) {
        port.set_state(OutletState::Off);
        self.commanded_on = false;
    }
}
