//! Wall-clock deadlines shared by all stages.

use std::time::{Duration, Instant};

/// A point in time after which bounded operations return their best result.
/// `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No time limit.
    pub fn unbounded() -> Self {
        Deadline(None)
    }

    /// A deadline `limit` from now.
    pub fn after(limit: Duration) -> Self {
        Deadline(Instant::now().checked_add(limit))
    }

    /// `after(limit)` if a limit is given, otherwise unbounded.
    pub fn from_limit(limit: Option<Duration>) -> Self {
        limit.map_or(Deadline::unbounded(), Deadline::after)
    }

    /// Time left, `None` if unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn expired(&self) -> bool {
        self.0.map_or(false, |at| Instant::now() >= at)
    }

    /// The earlier of two deadlines.
    pub fn min(self, other: Deadline) -> Deadline {
        match (self.0, other.0) {
            (Some(a), Some(b)) => Deadline(Some(a.min(b))),
            (Some(a), None) | (None, Some(a)) => Deadline(Some(a)),
            (None, None) => Deadline(None),
        }
    }

    /// A deadline after `fraction` of the remaining time. Unbounded stays
    /// unbounded.
    pub fn share(&self, fraction: f64) -> Deadline {
        match self.remaining() {
            Some(left) => Deadline::after(left.mul_f64(fraction.clamp(0.0, 1.0))),
            None => Deadline::unbounded(),
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Deadline::unbounded()
    }
}
