//! Clock utilities for the monitoring loop.
//!
//! Alarm decisions work on monotonic seconds relative to a fixed epoch so
//! they can be driven by a simulated clock in tests. The wall-clock stamp is
//! only used for log output.

use std::time::Instant;

/// A monotonic clock anchored to the moment monitoring started.
#[derive(Debug, Clone)]
pub struct MonitorClock {
    /// The instant monitoring started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl MonitorClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds elapsed since the epoch.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at the epoch.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Local wall-clock time for a monotonic offset, formatted for humans.
    pub fn wall_time_at(&self, secs: f64) -> String {
        let offset = chrono::Duration::milliseconds((secs * 1000.0) as i64);
        let started = chrono::DateTime::parse_from_rfc3339(&self.epoch_wall)
            .map(|t| t.with_timezone(&chrono::Local))
            .unwrap_or_else(|_| chrono::Local::now());
        (started + offset).format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = MonitorClock::start();
        assert!(clock.elapsed_secs() < 1.0);
    }

    #[test]
    fn test_wall_time_offsets_from_epoch() {
        let clock = MonitorClock::start();
        let at_start = clock.wall_time_at(0.0);
        let later = clock.wall_time_at(3600.0);
        assert_eq!(at_start.len(), "2026-01-01 00:00:00".len());
        assert_ne!(at_start, later);
    }
}
