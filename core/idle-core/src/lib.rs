//! # sentinel-idle-core
//!
//! Idle-session timeout mechanism: watches for user activity, predicts when
//! a session should expire from inactivity, warns shortly before expiry, and
//! coordinates the decision across every context (window, tab, process)
//! sharing the session, without a server round trip per keystroke.
//!
//! ## Design principles
//!
//! - **Synchronous and poll-driven**: no async runtime dependency. The host
//!   calls [`SessionController::poll`] from whatever loop it already runs;
//!   deadlines are absolute and recomputed from an injected [`Clock`], so a
//!   suspended or throttled host resumes with the correct countdown.
//! - **Graceful degradation**: an unavailable shared slot degrades to
//!   per-context idle tracking, never to a broken session.
//! - **Trait seams for collaborators**: authentication ([`SessionGate`]),
//!   logout side effects ([`SessionActions`]), the shared slot
//!   ([`ActivitySlot`]) and the clock are all injected, so the whole
//!   mechanism is testable without a browser, a backend, or real delays.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use sentinel_idle_core::{
//!     FileActivitySlot, IdleConfig, SessionController, SystemClock,
//! };
//!
//! let slot = FileActivitySlot::new(FileActivitySlot::default_path()?);
//! let mut controller = SessionController::new(
//!     IdleConfig::default(),
//!     std::sync::Arc::new(SystemClock),
//!     Box::new(slot),
//!     gate,
//!     actions,
//! )?;
//!
//! // On every raw input event:
//! controller.observe_activity();
//! // Periodically (e.g. every 250 ms):
//! for event in controller.poll() { /* update the warning dialog */ }
//! ```

pub mod clock;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod machine;
pub mod scheduler;
pub mod sync;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::IdleConfig;
pub use controller::{
    LogoutReason, SessionActions, SessionController, SessionEvent, SessionGate,
};
pub use debounce::ActivityDebouncer;
pub use error::{Result, SentinelError};
pub use machine::{IdleEvent, IdleObserver, IdlePhase, IdleSnapshot, IdleStateMachine};
pub use scheduler::{DeadlineScheduler, TimerFiring};
pub use sync::{
    generate_context_id, ActivitySlot, ContextSynchronizer, FileActivitySlot, MemoryActivitySlot,
};
