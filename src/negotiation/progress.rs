//! Deadline progress signals

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fraction of the negotiation deadline used so far, in `[0, 1]`
pub trait ProgressSignal: Send {
    fn progress(&self) -> f64;
}

/// Progress measured against a wall-clock deadline
#[derive(Clone, Debug)]
pub struct WallClock {
    started: Instant,
    duration: Duration,
}

impl WallClock {
    pub fn start(duration: Duration) -> Self {
        Self {
            started: Instant::now(),
            duration,
        }
    }
}

impl ProgressSignal for WallClock {
    fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.started.elapsed().as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }
}

/// Progress measured in protocol turns; clones share the same counter
#[derive(Clone, Debug)]
pub struct RoundClock {
    round: Arc<AtomicU32>,
    total: u32,
}

impl RoundClock {
    pub fn new(total: u32) -> Self {
        Self {
            round: Arc::new(AtomicU32::new(0)),
            total,
        }
    }

    /// Move to the next turn, saturating at the deadline
    pub fn advance(&self) -> u32 {
        let total = self.total;
        let previous = self
            .round
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| {
                Some(r.saturating_add(1).min(total))
            })
            .unwrap_or(total);
        previous.saturating_add(1).min(total)
    }

    pub fn round(&self) -> u32 {
        self.round.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> u32 {
        self.total
    }
}

impl ProgressSignal for RoundClock {
    fn progress(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        f64::from(self.round()) / f64::from(self.total)
    }
}
