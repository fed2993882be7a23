// src/clock.rs
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for resolution timestamps on workflow transitions.
///
/// Production code uses `Clock::system()`. Tests use `Clock::fixed(..)` and
/// drive it with `set`/`advance` so transitions are stamped deterministically.
#[derive(Clone)]
pub struct Clock {
    source: ClockSource,
}

#[derive(Clone)]
enum ClockSource {
    System,
    Fixed(Arc<Mutex<DateTime<Utc>>>),
}

impl Clock {
    pub fn system() -> Self {
        Self {
            source: ClockSource::System,
        }
    }

    pub fn fixed(start: DateTime<Utc>) -> Self {
        Self {
            source: ClockSource::Fixed(Arc::new(Mutex::new(start))),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        match &self.source {
            ClockSource::System => Utc::now(),
            ClockSource::Fixed(time) => *time.lock().unwrap(),
        }
    }

    /// No-op on the system clock.
    pub fn set(&self, instant: DateTime<Utc>) {
        if let ClockSource::Fixed(time) = &self.source {
            *time.lock().unwrap() = instant;
        }
    }

    /// No-op on the system clock.
    pub fn advance(&self, duration: Duration) {
        if let ClockSource::Fixed(time) = &self.source {
            let mut guard = time.lock().unwrap();
            *guard += duration;
        }
    }
}
