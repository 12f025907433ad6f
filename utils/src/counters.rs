//! In-process operation counters surfaced by the health report.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Thread-safe counters for the engine's hot operations.
///
/// These reset on restart; durable totals live in the store itself.
#[derive(Debug, Default)]
pub struct OpCounters {
    logins: AtomicU64,
    ballots_cast: AtomicU64,
    casts_rejected: AtomicU64,
    resets: AtomicU64,
}

impl OpCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_login(&self) {
        self.logins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ballot(&self) {
        self.ballots_cast.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_cast(&self) {
        self.casts_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> OpSnapshot {
        OpSnapshot {
            logins: self.logins.load(Ordering::Relaxed),
            ballots_cast: self.ballots_cast.load(Ordering::Relaxed),
            casts_rejected: self.casts_rejected.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OpSnapshot {
    pub logins: u64,
    pub ballots_cast: u64,
    pub casts_rejected: u64,
    pub resets: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let counters = OpCounters::new();
        counters.record_login();
        counters.record_login();
        counters.record_ballot();
        counters.record_rejected_cast();

        let snap = counters.snapshot();
        assert_eq!(snap.logins, 2);
        assert_eq!(snap.ballots_cast, 1);
        assert_eq!(snap.casts_rejected, 1);
        assert_eq!(snap.resets, 0);
    }
}
