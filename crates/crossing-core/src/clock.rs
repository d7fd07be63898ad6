//! Elapsed-time clock shared by every task of a run
//!
//! All timestamps are measured from one synchronized start instant. The clock
//! reads `tokio::time::Instant`, so tests that pause tokio time get a fully
//! deterministic clock without any extra injection.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Length of one input time unit. The input format counts tenths of a second.
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_millis(100);

/// Time elapsed since the start of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Elapsed(Duration);

impl Elapsed {
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    /// Elapsed time rounded to the nearest tenth of a second.
    pub fn total_tenths(&self) -> u128 {
        (self.0.as_micros() + 50_000) / 100_000
    }
}

impl fmt::Display for Elapsed {
    /// Renders as `HH:MM:SS.t`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tenths = self.total_tenths();
        let hours = tenths / 36_000;
        let minutes = (tenths % 36_000) / 600;
        let seconds = (tenths % 600) / 10;
        write!(f, "{:02}:{:02}:{:02}.{}", hours, minutes, seconds, tenths % 10)
    }
}

/// Clock anchored at the synchronized start of a run.
///
/// The anchor is set once, by the first `anchor` call. Every task of a run
/// calls it right after the start barrier releases.
#[derive(Debug, Default)]
pub struct SimClock {
    start: OnceLock<Instant>,
}

impl SimClock {
    /// A clock that anchors on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock anchored at the current instant.
    pub fn start_now() -> Self {
        let clock = Self::new();
        clock.anchor();
        clock
    }

    /// Fix the start instant if nobody has yet, and return it.
    pub fn anchor(&self) -> Instant {
        *self.start.get_or_init(Instant::now)
    }

    pub fn elapsed(&self) -> Elapsed {
        Elapsed(self.anchor().elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_formatting() {
        assert_eq!(Elapsed::default().to_string(), "00:00:00.0");
        assert_eq!(Elapsed::new(Duration::from_millis(1_300)).to_string(), "00:00:01.3");
        assert_eq!(
            Elapsed::new(Duration::from_secs(3_600 + 2 * 60 + 5)).to_string(),
            "01:02:05.0"
        );
    }

    #[test]
    fn test_elapsed_rounds_to_nearest_tenth() {
        assert_eq!(Elapsed::new(Duration::from_millis(149)).to_string(), "00:00:00.1");
        assert_eq!(Elapsed::new(Duration::from_millis(150)).to_string(), "00:00:00.2");
        assert_eq!(Elapsed::new(Duration::from_millis(59_960)).to_string(), "00:01:00.0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_follows_tokio_time() {
        let clock = SimClock::start_now();
        assert_eq!(clock.elapsed().to_string(), "00:00:00.0");
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(clock.elapsed().to_string(), "00:00:02.5");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_starts_at_first_anchor() {
        let clock = SimClock::new();
        tokio::time::sleep(Duration::from_secs(4)).await;
        let start = clock.anchor();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(clock.anchor(), start);
        assert_eq!(clock.elapsed().to_string(), "00:00:00.3");
    }
}
