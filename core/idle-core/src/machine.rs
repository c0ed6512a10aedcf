//! The authoritative idle state for one context.
//!
//! Phases move `Active → Warning → Idle` within one activity epoch; only a
//! recognized activity reset moves backward. Observers are notified at most
//! once per epoch for warning and idle, and on every genuine return to
//! active. When disabled the machine is inert: no deadlines, no callbacks,
//! snapshot reports `Active`.

use chrono::{DateTime, Utc};

use crate::config::IdleConfig;
use crate::scheduler::{DeadlineScheduler, TimerFiring};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePhase {
    Active,
    Warning,
    Idle,
}

/// Read-only view exposed to consumers. `remaining_seconds` is meaningful
/// only while the phase is `Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleSnapshot {
    pub phase: IdlePhase,
    pub remaining_seconds: u64,
}

/// Callbacks driven by [`IdleStateMachine::poll`] and
/// [`IdleStateMachine::reset_timer`].
pub trait IdleObserver {
    /// The warning period started. At most once per epoch.
    fn on_warning(&mut self, _remaining_seconds: u64) {}
    /// One second of the warning countdown elapsed; the value is recomputed
    /// from the absolute idle deadline.
    fn on_tick(&mut self, _remaining_seconds: u64) {}
    /// The idle deadline passed. At most once per epoch.
    fn on_idle(&mut self) {}
    /// Recognized activity moved the machine back to `Active` from a
    /// non-active phase.
    fn on_active(&mut self) {}
}

/// Machine callback captured as a value, for observers that buffer instead
/// of acting inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    Warning { remaining_seconds: u64 },
    Tick { remaining_seconds: u64 },
    Idle,
    Active,
}

impl IdleObserver for Vec<IdleEvent> {
    fn on_warning(&mut self, remaining_seconds: u64) {
        self.push(IdleEvent::Warning { remaining_seconds });
    }

    fn on_tick(&mut self, remaining_seconds: u64) {
        self.push(IdleEvent::Tick { remaining_seconds });
    }

    fn on_idle(&mut self) {
        self.push(IdleEvent::Idle);
    }

    fn on_active(&mut self) {
        self.push(IdleEvent::Active);
    }
}

#[derive(Debug)]
pub struct IdleStateMachine {
    scheduler: DeadlineScheduler,
    phase: IdlePhase,
    remaining_seconds: u64,
    enabled: bool,
    last_activity_at: Option<DateTime<Utc>>,
}

impl IdleStateMachine {
    /// Builds the machine and, when enabled, arms the first epoch at `now`.
    pub fn new(config: &IdleConfig, enabled: bool, now: DateTime<Utc>) -> Self {
        let mut scheduler = DeadlineScheduler::new(config.idle_timeout_ms, config.warning_lead_ms);
        let last_activity_at = if enabled {
            scheduler.arm(now);
            Some(now)
        } else {
            None
        };
        Self {
            scheduler,
            phase: IdlePhase::Active,
            remaining_seconds: 0,
            enabled,
            last_activity_at,
        }
    }

    pub fn phase(&self) -> IdlePhase {
        self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The most recent activity this machine has folded in, local or remote.
    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        self.last_activity_at
    }

    pub fn snapshot(&self) -> IdleSnapshot {
        IdleSnapshot {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
        }
    }

    /// Recognized activity at `now`: returns to `Active` from any phase and
    /// starts a fresh epoch. Calling it repeatedly is idempotent; the most
    /// recent call always wins and no superseded deadline can fire.
    pub fn reset_timer(&mut self, now: DateTime<Utc>, observer: &mut dyn IdleObserver) {
        if !self.enabled {
            return;
        }
        let was_active = self.phase == IdlePhase::Active;
        self.phase = IdlePhase::Active;
        self.remaining_seconds = 0;
        self.last_activity_at = Some(now);
        self.scheduler.arm(now);
        if !was_active {
            observer.on_active();
        }
    }

    /// Drives the machine forward to `now`, notifying the observer of every
    /// transition that occurred since the previous poll.
    pub fn poll(&mut self, now: DateTime<Utc>, observer: &mut dyn IdleObserver) {
        if !self.enabled {
            return;
        }
        for firing in self.scheduler.poll(now) {
            match firing {
                TimerFiring::Warning { remaining_seconds } => {
                    self.phase = IdlePhase::Warning;
                    self.remaining_seconds = remaining_seconds;
                    observer.on_warning(remaining_seconds);
                }
                TimerFiring::Tick { remaining_seconds } => {
                    if self.phase == IdlePhase::Warning {
                        self.remaining_seconds = remaining_seconds;
                        observer.on_tick(remaining_seconds);
                    }
                }
                TimerFiring::Idle => {
                    self.phase = IdlePhase::Idle;
                    self.remaining_seconds = 0;
                    observer.on_idle();
                }
            }
        }
    }

    /// Gates the whole machine. Disabling cancels every deadline
    /// synchronously and leaves the snapshot at `Active`; re-enabling arms a
    /// fresh epoch from `now`.
    pub fn set_enabled(&mut self, enabled: bool, now: DateTime<Utc>) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        self.phase = IdlePhase::Active;
        self.remaining_seconds = 0;
        if enabled {
            self.last_activity_at = Some(now);
            self.scheduler.arm(now);
        } else {
            self.scheduler.disarm();
        }
    }
}
