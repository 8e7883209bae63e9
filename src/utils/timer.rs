//! Timer utilities
//!
//! Measures a test run: wall-clock start for the record, monotonic clock for
//! the duration.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

use crate::models::Timing;

/// Stopwatch for a single test execution
#[derive(Debug)]
pub struct Stopwatch {
    started_at: DateTime<Utc>,
    start: Instant,
}

impl Stopwatch {
    /// Create and start a new stopwatch
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop and return the timing pair for a result
    pub fn stop(self) -> Timing {
        let time = self.elapsed().as_secs_f64();
        tracing::debug!("elapsed {:.6}s", time);
        Timing {
            timestamp: self.started_at,
            time,
        }
    }
}
