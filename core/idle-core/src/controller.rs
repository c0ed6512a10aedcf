//! Consumer-facing session controller.
//!
//! Binds the state machine to concrete session semantics: the authentication
//! gate decides whether the mechanism runs at all, and reaching idle performs
//! exactly two side effects in order: clear the locally held credentials,
//! then navigate to the login surface with an idle reason. Both the automatic
//! idle path and the manual "log out now" action share a one-shot guard, so a
//! race between them performs the side effects exactly once.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::IdleConfig;
use crate::debounce::ActivityDebouncer;
use crate::error::Result;
use crate::machine::{IdleEvent, IdleSnapshot, IdleStateMachine};
use crate::sync::{generate_context_id, ActivitySlot, ContextSynchronizer};

/// Why the user was sent to the login surface. Rendered as the redirect's
/// reason query value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    Idle,
}

impl LogoutReason {
    pub fn as_query_value(&self) -> &'static str {
        match self {
            LogoutReason::Idle => "idle",
        }
    }
}

/// External collaborator: is a session currently authenticated?
pub trait SessionGate {
    fn is_authenticated(&self) -> bool;
}

/// External collaborators performing the logout side effects. Both must be
/// idempotent on their side; the controller additionally guarantees it calls
/// them at most once per session.
pub trait SessionActions {
    fn clear_credentials(&mut self);
    fn navigate_to_login(&mut self, reason: LogoutReason);
}

/// What the consumer should surface to the user after a call into the
/// controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Show the warning dialog with this countdown start value.
    WarningStarted { remaining_seconds: u64 },
    /// Update the countdown display.
    CountdownTick { remaining_seconds: u64 },
    /// Dismiss the warning dialog; activity was recognized somewhere.
    ActivityResumed,
    /// Credentials were cleared and the login redirect issued.
    LoggedOut,
}

pub struct SessionController<G: SessionGate, A: SessionActions> {
    config: IdleConfig,
    clock: Arc<dyn Clock>,
    machine: IdleStateMachine,
    debouncer: ActivityDebouncer,
    sync: ContextSynchronizer,
    gate: G,
    actions: A,
    logged_out: bool,
}

impl<G: SessionGate, A: SessionActions> SessionController<G, A> {
    /// Validates the configuration and checks the gate once, the mount-time
    /// query. An unauthenticated session leaves the mechanism inert until a
    /// later [`poll`](Self::poll) observes authentication.
    pub fn new(
        config: IdleConfig,
        clock: Arc<dyn Clock>,
        slot: Box<dyn ActivitySlot>,
        gate: G,
        actions: A,
    ) -> Result<Self> {
        config.validate()?;
        let now = clock.now();
        let enabled = config.enabled && gate.is_authenticated();
        let machine = IdleStateMachine::new(&config, enabled, now);
        let debouncer = ActivityDebouncer::new(config.debounce_ms);
        let sync = ContextSynchronizer::new(generate_context_id(), slot);
        Ok(Self {
            config,
            clock,
            machine,
            debouncer,
            sync,
            gate,
            actions,
            logged_out: false,
        })
    }

    pub fn snapshot(&self) -> IdleSnapshot {
        self.machine.snapshot()
    }

    pub fn is_logged_out(&self) -> bool {
        self.logged_out
    }

    /// Feed one raw activity event (pointer move, key press, scroll, ...).
    /// Debounced to one pulse per window; a forwarded pulse resets the local
    /// clock and publishes to the shared slot for the other contexts.
    pub fn observe_activity(&mut self) -> Vec<SessionEvent> {
        if !self.machine.is_enabled() || self.logged_out {
            return Vec::new();
        }
        let now = self.clock.now();
        if !self.debouncer.observe(now) {
            return Vec::new();
        }
        let mut fired = Vec::new();
        self.machine.reset_timer(now, &mut fired);
        self.sync.publish(now);
        self.translate(fired, now)
    }

    /// Drive the mechanism forward. Re-checks the authentication gate, folds
    /// in newer activity published by other contexts, then advances the
    /// state machine to the current instant.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let now = self.clock.now();
        self.refresh_gate(now);
        if !self.machine.is_enabled() {
            return Vec::new();
        }

        let mut fired = Vec::new();
        if let Some(remote) = self.sync.poll_remote(self.machine.last_activity_at()) {
            debug!(
                remote = %remote.to_rfc3339(),
                "Foreign activity observed; resetting idle clock"
            );
            // Anchor the new epoch at the remote activity time, not at the
            // moment this context noticed it.
            self.machine.reset_timer(remote, &mut fired);
        }
        self.machine.poll(now, &mut fired);
        self.translate(fired, now)
    }

    /// The "stay logged in" action from the warning dialog. Counts as
    /// recognized activity and propagates to the other contexts.
    pub fn extend_session(&mut self) -> Vec<SessionEvent> {
        if !self.machine.is_enabled() || self.logged_out {
            return Vec::new();
        }
        let now = self.clock.now();
        let mut fired = Vec::new();
        self.machine.reset_timer(now, &mut fired);
        self.sync.publish(now);
        self.translate(fired, now)
    }

    /// The "log out now" action from the warning dialog: the same two side
    /// effects as reaching idle, immediately. Returns whether this call
    /// performed them (`false` when a concurrent path already did).
    pub fn logout_now(&mut self) -> bool {
        let now = self.clock.now();
        self.perform_logout(now)
    }

    fn refresh_gate(&mut self, now: DateTime<Utc>) {
        let enabled = self.config.enabled && !self.logged_out && self.gate.is_authenticated();
        self.machine.set_enabled(enabled, now);
    }

    fn translate(&mut self, fired: Vec<IdleEvent>, now: DateTime<Utc>) -> Vec<SessionEvent> {
        let mut events = Vec::with_capacity(fired.len());
        for event in fired {
            match event {
                IdleEvent::Warning { remaining_seconds } => {
                    events.push(SessionEvent::WarningStarted { remaining_seconds });
                }
                IdleEvent::Tick { remaining_seconds } => {
                    events.push(SessionEvent::CountdownTick { remaining_seconds });
                }
                IdleEvent::Active => {
                    events.push(SessionEvent::ActivityResumed);
                }
                IdleEvent::Idle => {
                    if self.perform_logout(now) {
                        events.push(SessionEvent::LoggedOut);
                    }
                }
            }
        }
        events
    }

    fn perform_logout(&mut self, now: DateTime<Utc>) -> bool {
        if self.logged_out {
            debug!("Logout already performed; skipping");
            return false;
        }
        self.logged_out = true;
        info!("Idle session timed out; clearing credentials and redirecting to login");
        self.actions.clear_credentials();
        self.actions.navigate_to_login(LogoutReason::Idle);
        self.machine.set_enabled(false, now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sync::MemoryActivitySlot;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct FlagGate(Arc<AtomicBool>);

    impl FlagGate {
        fn authenticated() -> Self {
            Self(Arc::new(AtomicBool::new(true)))
        }

        fn set(&self, value: bool) {
            self.0.store(value, Ordering::SeqCst);
        }
    }

    impl SessionGate for FlagGate {
        fn is_authenticated(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Clone, Default)]
    struct RecordingActions {
        inner: Arc<Mutex<ActionLog>>,
    }

    #[derive(Default)]
    struct ActionLog {
        credential_clears: u32,
        navigations: Vec<&'static str>,
    }

    impl RecordingActions {
        fn clears(&self) -> u32 {
            self.inner.lock().unwrap().credential_clears
        }

        fn navigations(&self) -> Vec<&'static str> {
            self.inner.lock().unwrap().navigations.clone()
        }
    }

    impl SessionActions for RecordingActions {
        fn clear_credentials(&mut self) {
            self.inner.lock().unwrap().credential_clears += 1;
        }

        fn navigate_to_login(&mut self, reason: LogoutReason) {
            self.inner.lock().unwrap().navigations.push(reason.as_query_value());
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 31, 0, 0, 0).unwrap()
    }

    fn config() -> IdleConfig {
        IdleConfig {
            idle_timeout_ms: 10_000,
            warning_lead_ms: 4_000,
            debounce_ms: 1_000,
            enabled: true,
        }
    }

    fn controller(
        gate: FlagGate,
        actions: RecordingActions,
    ) -> (SessionController<FlagGate, RecordingActions>, ManualClock) {
        let clock = ManualClock::new(start());
        let controller = SessionController::new(
            config(),
            Arc::new(clock.clone()),
            Box::new(MemoryActivitySlot::new()),
            gate,
            actions,
        )
        .expect("valid config");
        (controller, clock)
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let clock = ManualClock::new(start());
        let result = SessionController::new(
            IdleConfig {
                idle_timeout_ms: 1_000,
                warning_lead_ms: 1_000,
                ..IdleConfig::default()
            },
            Arc::new(clock),
            Box::new(MemoryActivitySlot::new()),
            FlagGate::authenticated(),
            RecordingActions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn idle_performs_clear_then_redirect_once() {
        let actions = RecordingActions::default();
        let (mut controller, clock) = controller(FlagGate::authenticated(), actions.clone());

        clock.advance_ms(10_000);
        let events = controller.poll();
        assert!(events.contains(&SessionEvent::LoggedOut));
        assert_eq!(actions.clears(), 1);
        assert_eq!(actions.navigations(), vec!["idle"]);

        // Further polls stay quiet.
        clock.advance_ms(60_000);
        assert!(controller.poll().is_empty());
        assert_eq!(actions.clears(), 1);
    }

    #[test]
    fn manual_logout_races_safely_with_idle() {
        let actions = RecordingActions::default();
        let (mut controller, clock) = controller(FlagGate::authenticated(), actions.clone());

        clock.advance_ms(6_000);
        let events = controller.poll();
        assert_eq!(
            events,
            vec![SessionEvent::WarningStarted {
                remaining_seconds: 4
            }]
        );

        assert!(controller.logout_now());
        // The idle deadline that would have fired at 10 000 is gone, and a
        // second manual logout is a no-op.
        assert!(!controller.logout_now());
        clock.advance_ms(10_000);
        assert!(controller.poll().is_empty());

        assert_eq!(actions.clears(), 1);
        assert_eq!(actions.navigations(), vec!["idle"]);
    }

    #[test]
    fn raw_activity_is_debounced() {
        let (mut controller, clock) = controller(FlagGate::authenticated(), RecordingActions::default());

        // A burst of raw events; only the first within the window counts.
        controller.observe_activity();
        clock.advance_ms(100);
        controller.observe_activity();
        clock.advance_ms(100);
        controller.observe_activity();

        // The epoch is anchored at the first pulse (t=0): warning at 6 000.
        clock.set(start() + chrono::Duration::milliseconds(6_000));
        let events = controller.poll();
        assert_eq!(
            events,
            vec![SessionEvent::WarningStarted {
                remaining_seconds: 4
            }]
        );
    }

    #[test]
    fn extend_session_during_warning_resumes_activity() {
        let (mut controller, clock) = controller(FlagGate::authenticated(), RecordingActions::default());

        clock.advance_ms(7_000);
        controller.poll();
        assert_eq!(controller.snapshot().phase, crate::machine::IdlePhase::Warning);

        let events = controller.extend_session();
        assert_eq!(events, vec![SessionEvent::ActivityResumed]);
        assert_eq!(controller.snapshot().phase, crate::machine::IdlePhase::Active);

        // Original idle deadline (10 000) must not fire.
        clock.set(start() + chrono::Duration::milliseconds(10_500));
        assert!(controller.poll().is_empty());
    }

    #[test]
    fn losing_authentication_suppresses_the_mechanism() {
        let gate = FlagGate::authenticated();
        let actions = RecordingActions::default();
        let (mut controller, clock) = controller(gate.clone(), actions.clone());

        clock.advance_ms(5_000);
        gate.set(false);
        clock.advance_ms(60_000);
        assert!(controller.poll().is_empty());
        assert_eq!(actions.clears(), 0);
    }

    #[test]
    fn regaining_authentication_rearms_from_now() {
        let gate = FlagGate::default();
        let (mut controller, clock) = controller(gate.clone(), RecordingActions::default());

        clock.advance_ms(60_000);
        assert!(controller.poll().is_empty());

        gate.set(true);
        controller.poll();
        clock.advance_ms(6_000);
        let events = controller.poll();
        assert_eq!(
            events,
            vec![SessionEvent::WarningStarted {
                remaining_seconds: 4
            }]
        );
    }

    #[test]
    fn disabled_config_never_fires() {
        let clock = ManualClock::new(start());
        let actions = RecordingActions::default();
        let mut controller = SessionController::new(
            IdleConfig {
                enabled: false,
                ..config()
            },
            Arc::new(clock.clone()),
            Box::new(MemoryActivitySlot::new()),
            FlagGate::authenticated(),
            actions.clone(),
        )
        .expect("valid config");

        clock.advance_ms(3_600_000);
        assert!(controller.poll().is_empty());
        assert!(controller.observe_activity().is_empty());
        assert_eq!(actions.clears(), 0);
    }
}
