//! System time adapter.
//!
//! Monotonic time from `std::time::Instant`, wall-clock time from the
//! system's local timezone, sleep from `std::thread::sleep`.

use core::time::Duration;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};

use crate::app::ports::TimePort;

pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TimePort for SystemClock {
    fn monotonic_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn local_now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
