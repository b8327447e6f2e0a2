//! Virtual simulation time.
//!
//! Virtual time is a non-negative, monotone non-decreasing quantity expressed
//! in seconds. It bears no relation to wall-clock time: it only moves when the
//! scheduler pops the next event.
//!
//! The central clock is published through an atomic cell so that client
//! processes and the watchdog can read it without locking, while the scheduler
//! remains its only writer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Virtual simulation time, in seconds.
pub type SimTime = f64;

/// A totally ordered wrapper over [`SimTime`], usable as an ordered map key.
///
/// Timestamps are asserted finite at the API boundary, so the total order
/// coincides with the usual order on reals.
#[derive(Copy, Clone, Debug)]
pub(crate) struct TimeKey(SimTime);

impl TimeKey {
    pub(crate) fn new(time: SimTime) -> Self {
        Self(time)
    }

    pub(crate) fn get(self) -> SimTime {
        self.0
    }
}

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == std::cmp::Ordering::Equal
    }
}

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// The writing side of the shared virtual clock.
///
/// A single `f64` bit pattern fits in one atomic word, so reads can never be
/// torn; relaxed ordering is sufficient because the clock is only advanced
/// while all observers are quiescent.
pub(crate) struct AtomicTime {
    bits: Arc<AtomicU64>,
}

impl AtomicTime {
    pub(crate) fn new(time: SimTime) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(time.to_bits())),
        }
    }

    pub(crate) fn write(&self, time: SimTime) {
        self.bits.store(time.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn read(&self) -> SimTime {
        SimTime::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Returns a read-only handle to the clock.
    pub(crate) fn reader(&self) -> AtomicTimeReader {
        AtomicTimeReader {
            bits: self.bits.clone(),
        }
    }
}

/// A read-only handle to the shared virtual clock.
#[derive(Clone)]
pub(crate) struct AtomicTimeReader {
    bits: Arc<AtomicU64>,
}

impl AtomicTimeReader {
    pub(crate) fn read(&self) -> SimTime {
        SimTime::from_bits(self.bits.load(Ordering::Relaxed))
    }
}
