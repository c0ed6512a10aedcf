//! Interactive demo of the idle mechanism.
//!
//! Run one instance per terminal; every instance shares the same activity
//! slot, so pressing Enter in any of them resets the idle clock in all of
//! them. Uses a short timeout so the warning and logout are quick to see:
//!
//! ```text
//! cargo run --example watchdog
//! ```

use std::io::BufRead;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use sentinel_idle_core::{
    FileActivitySlot, IdleConfig, LogoutReason, SessionActions, SessionController, SessionEvent,
    SessionGate, SystemClock,
};

struct AlwaysAuthenticated;

impl SessionGate for AlwaysAuthenticated {
    fn is_authenticated(&self) -> bool {
        true
    }
}

struct PrintActions;

impl SessionActions for PrintActions {
    fn clear_credentials(&mut self) {
        info!("Credentials cleared");
    }

    fn navigate_to_login(&mut self, reason: LogoutReason) {
        info!(reason = reason.as_query_value(), "Redirecting to login");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = IdleConfig {
        idle_timeout_ms: 20_000,
        warning_lead_ms: 10_000,
        ..IdleConfig::default()
    };
    let slot = FileActivitySlot::new(FileActivitySlot::default_path()?);
    let mut controller = SessionController::new(
        config,
        Arc::new(SystemClock),
        Box::new(slot),
        AlwaysAuthenticated,
        PrintActions,
    )?;

    info!("Idle watchdog started; press Enter to register activity");

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() || tx.send(()).is_err() {
                break;
            }
        }
    });

    loop {
        while rx.try_recv().is_ok() {
            controller.observe_activity();
        }

        for event in controller.poll() {
            match event {
                SessionEvent::WarningStarted { remaining_seconds } => {
                    info!(remaining_seconds, "Session expires soon");
                }
                SessionEvent::CountdownTick { remaining_seconds } => {
                    info!(remaining_seconds, "...");
                }
                SessionEvent::ActivityResumed => {
                    info!("Activity recognized; countdown dismissed");
                }
                SessionEvent::LoggedOut => {
                    info!("Session ended");
                    return Ok(());
                }
            }
        }

        thread::sleep(Duration::from_millis(250));
    }
}
