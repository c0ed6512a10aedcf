//! Deadline scheduler: the warning deadline, the idle deadline, and the
//! one-second countdown tick used only while warning.
//!
//! Deadlines are absolute instants compared against the caller's clock in
//! [`DeadlineScheduler::poll`]. Remaining time is always recomputed as
//! `idle_deadline - now`, never as a count of ticks, so a suspended or
//! throttled host resumes with the correct countdown. Arming always
//! supersedes the previous epoch; a superseded deadline can never fire.

use chrono::{DateTime, Duration, Utc};

/// A deadline crossing reported by [`DeadlineScheduler::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerFiring {
    /// The warning deadline passed. Fired at most once per epoch.
    Warning { remaining_seconds: u64 },
    /// One second of the warning countdown elapsed.
    Tick { remaining_seconds: u64 },
    /// The idle deadline passed. Fired at most once per epoch; stops the tick.
    Idle,
}

#[derive(Debug)]
pub struct DeadlineScheduler {
    idle_timeout: Duration,
    warning_lead: Duration,
    warning_at: Option<DateTime<Utc>>,
    idle_at: Option<DateTime<Utc>>,
    next_tick_at: Option<DateTime<Utc>>,
    warning_fired: bool,
    idle_fired: bool,
}

impl DeadlineScheduler {
    pub fn new(idle_timeout_ms: u64, warning_lead_ms: u64) -> Self {
        Self {
            idle_timeout: Duration::milliseconds(idle_timeout_ms as i64),
            warning_lead: Duration::milliseconds(warning_lead_ms as i64),
            warning_at: None,
            idle_at: None,
            next_tick_at: None,
            warning_fired: false,
            idle_fired: false,
        }
    }

    /// Starts a new epoch anchored at `now`, superseding any prior one.
    ///
    /// The warning deadline is scheduled only when its delay is strictly
    /// positive; the idle deadline is always scheduled.
    pub fn arm(&mut self, now: DateTime<Utc>) {
        let warning_delay = self.idle_timeout - self.warning_lead;
        self.warning_at = if warning_delay > Duration::zero() {
            Some(now + warning_delay)
        } else {
            None
        };
        self.idle_at = Some(now + self.idle_timeout);
        self.next_tick_at = None;
        self.warning_fired = false;
        self.idle_fired = false;
    }

    /// Cancels every deadline. Nothing fires until the next `arm`.
    pub fn disarm(&mut self) {
        self.warning_at = None;
        self.idle_at = None;
        self.next_tick_at = None;
        self.warning_fired = false;
        self.idle_fired = false;
    }

    pub fn is_armed(&self) -> bool {
        self.idle_at.is_some()
    }

    /// Whole seconds until the idle deadline, rounded up, clamped at zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        let Some(idle_at) = self.idle_at else {
            return 0;
        };
        let ms = idle_at.signed_duration_since(now).num_milliseconds();
        if ms <= 0 {
            0
        } else {
            ((ms + 999) / 1000) as u64
        }
    }

    /// Reports every deadline crossed as of `now`, in order: warning, then
    /// countdown tick, then idle. A single poll after a long suspension may
    /// report several crossings at once.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<TimerFiring> {
        let mut fired = Vec::new();
        let Some(idle_at) = self.idle_at else {
            return fired;
        };

        if !self.warning_fired {
            if let Some(warning_at) = self.warning_at {
                if now >= warning_at {
                    self.warning_fired = true;
                    self.next_tick_at = Some(now + Duration::seconds(1));
                    fired.push(TimerFiring::Warning {
                        remaining_seconds: self.remaining_seconds(now),
                    });
                }
            }
        }

        if self.warning_fired && !self.idle_fired {
            if let Some(tick_at) = self.next_tick_at {
                if now >= tick_at {
                    self.next_tick_at = Some(now + Duration::seconds(1));
                    fired.push(TimerFiring::Tick {
                        remaining_seconds: self.remaining_seconds(now),
                    });
                }
            }
        }

        if !self.idle_fired && now >= idle_at {
            self.idle_fired = true;
            self.next_tick_at = None;
            fired.push(TimerFiring::Idle);
        }

        fired
    }
}
