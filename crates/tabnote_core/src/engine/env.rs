//! Id and clock sources injected into transitions.
//!
//! The transition engine never reads the system clock or a random source
//! directly; it asks a [`TransitionEnv`]. Production uses [`SystemEnv`],
//! tests and replays use [`SequenceEnv`].

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// Supplies fresh identifiers and timestamps.
pub trait TransitionEnv {
    /// Returns an id that has never been returned before, as `<prefix>-...`.
    fn next_id(&mut self, prefix: &str) -> String;
    /// Returns the current time in Unix epoch milliseconds.
    fn now_ms(&mut self) -> i64;
}

/// UUID v4 ids and wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl TransitionEnv for SystemEnv {
    fn next_id(&mut self, prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4().simple())
    }

    fn now_ms(&mut self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Deterministic counter ids and a clock that ticks 1 ms per read.
#[derive(Debug, Clone)]
pub struct SequenceEnv {
    counter: u64,
    clock_ms: i64,
}

impl SequenceEnv {
    pub const DEFAULT_START_MS: i64 = 1_700_000_000_000;

    pub fn new() -> Self {
        Self::starting_at(Self::DEFAULT_START_MS)
    }

    pub fn starting_at(clock_ms: i64) -> Self {
        Self {
            counter: 0,
            clock_ms,
        }
    }
}

impl Default for SequenceEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionEnv for SequenceEnv {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}-seq{}", self.counter)
    }

    fn now_ms(&mut self) -> i64 {
        let now = self.clock_ms;
        self.clock_ms += 1;
        now
    }
}

/// Formats epoch milliseconds as an RFC 3339 UTC timestamp.
pub fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
