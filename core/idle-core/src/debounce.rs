//! Collapses the raw activity event stream into sparse pulses.
//!
//! Pointer movement, key presses, scrolls and the like arrive continuously;
//! downstream only needs to know "the user is present" at most once per
//! window. Observation only: this never fails and has no side effects.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug)]
pub struct ActivityDebouncer {
    window: Duration,
    last_pulse_at: Option<DateTime<Utc>>,
}

impl ActivityDebouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window: Duration::milliseconds(window_ms as i64),
            last_pulse_at: None,
        }
    }

    /// Records a raw activity event. Returns `true` when the event should be
    /// forwarded as a pulse.
    ///
    /// The window is anchored to the last *forwarded* pulse, not the wall
    /// clock, so a continuous burst yields exactly one pulse per window.
    pub fn observe(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_pulse_at {
            if now.signed_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_pulse_at = Some(now);
        true
    }

    /// Forgets the anchor so the next event is forwarded immediately.
    pub fn reset(&mut self) {
        self.last_pulse_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    #[test]
    fn first_event_is_forwarded() {
        let mut debouncer = ActivityDebouncer::new(1000);
        assert!(debouncer.observe(at(0)));
    }

    #[test]
    fn burst_collapses_to_one_pulse_per_window() {
        let mut debouncer = ActivityDebouncer::new(1000);
        assert!(debouncer.observe(at(0)));
        assert!(!debouncer.observe(at(100)));
        assert!(!debouncer.observe(at(500)));
        assert!(!debouncer.observe(at(999)));
        assert!(debouncer.observe(at(1000)));
    }

    #[test]
    fn window_is_anchored_to_last_forwarded_pulse() {
        let mut debouncer = ActivityDebouncer::new(1000);
        assert!(debouncer.observe(at(0)));
        // Suppressed events do not move the anchor.
        assert!(!debouncer.observe(at(900)));
        assert!(!debouncer.observe(at(950)));
        assert!(debouncer.observe(at(1000)));
        // New anchor at 1000, not 950.
        assert!(!debouncer.observe(at(1999)));
        assert!(debouncer.observe(at(2000)));
    }

    #[test]
    fn clock_regression_is_suppressed() {
        let mut debouncer = ActivityDebouncer::new(1000);
        assert!(debouncer.observe(at(5000)));
        assert!(!debouncer.observe(at(4000)));
    }

    #[test]
    fn reset_forwards_the_next_event() {
        let mut debouncer = ActivityDebouncer::new(1000);
        assert!(debouncer.observe(at(0)));
        debouncer.reset();
        assert!(debouncer.observe(at(1)));
    }
}
