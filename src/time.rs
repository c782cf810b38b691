//! Timestamp type and the injected clock dependency.
//!
//! The core treats the monotonic/realtime clock as an external collaborator
//! rather than reaching for `std::time::SystemTime` directly everywhere, so a
//! host can supply a deterministic clock in tests.

use std::time::{SystemTime, UNIX_EPOCH};

/// A `(seconds, nanoseconds)` timestamp, matching `fs_timespec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub sec: i64,
    pub nsec: i64,
}

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp { sec: 0, nsec: 0 };

    pub fn new(sec: i64, nsec: i64) -> Self {
        Timestamp { sec, nsec }
    }
}

/// A source of wall-clock timestamps.
///
/// Every metadata-touching operation calls this exactly once to stamp
/// `atime`/`mtime`/`ctime`/`btime`, so implementations may assume calls are
/// cheap and do not need to be memoized by the caller.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// A `utimensat`-style per-field update instruction.
#[derive(Debug, Clone, Copy)]
pub enum UtimeSpec {
    Now,
    Omit,
    Set(Timestamp),
}

/// The default clock, backed by [`std::time::SystemTime`].
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp {
            sec: dur.as_secs() as i64,
            nsec: dur.subsec_nanos() as i64,
        }
    }
}
