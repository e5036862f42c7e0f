//! Wall-clock time source.
//!
//! Growth is measured against real elapsed time, not frame time, so crops keep
//! growing while the game is closed. Tests swap in a `ManualClock`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1000.0).round() as i64)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Seconds elapsed from `earlier` to `self`; negative if `earlier` is in the future.
    pub fn seconds_since(self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0) as f64 / 1000.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        let millis = i64::try_from(rhs.as_millis()).unwrap_or(i64::MAX);
        Timestamp(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

pub trait WallClock: Send + Sync + 'static {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Timestamp(millis)
    }
}

/// Hand-driven clock. Clones share the same instant.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn starting_at(at: Timestamp) -> Self {
        Self(Arc::new(AtomicI64::new(at.as_millis())))
    }

    pub fn set(&self, at: Timestamp) {
        self.0.store(at.as_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let next = self.now() + by;
        self.set(next);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.0
            .fetch_add((secs * 1000.0).round() as i64, Ordering::SeqCst);
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.0.load(Ordering::SeqCst))
    }
}

/// The clock every system reads "now" from.
#[derive(Resource, Clone)]
pub struct SimClock(Arc<dyn WallClock>);

impl SimClock {
    pub fn system() -> Self {
        Self(Arc::new(SystemClock))
    }

    /// Returns the resource together with a handle for driving it.
    pub fn manual(start: Timestamp) -> (Self, ManualClock) {
        let clock = ManualClock::starting_at(start);
        (Self(Arc::new(clock.clone())), clock)
    }

    pub fn new(clock: impl WallClock) -> Self {
        Self(Arc::new(clock))
    }

    pub fn now(&self) -> Timestamp {
        self.0.now()
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::system()
    }
}
