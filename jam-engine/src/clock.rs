use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam::atomic::AtomicCell;

/// A source of wall-clock time in milliseconds.
///
/// All playback math is derived from this. It is injected into the engine so
/// tests can control time deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current wall time in milliseconds.
    fn now_ms(&self) -> u64;
}

/// The process-wide clock, backed by the system time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to. Useful for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicCell<u64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicCell::new(start),
        }
    }

    /// Moves the clock forward by the given amount of milliseconds.
    pub fn advance(&self, amount: u64) {
        self.now.fetch_add(amount);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load()
    }
}
