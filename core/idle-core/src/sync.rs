//! Cross-context propagation of the latest activity timestamp.
//!
//! The slot is a single overwrite-only value shared by every context of the
//! same session. Each context publishes its own debounced pulses and folds in
//! strictly newer timestamps written by other contexts, so activity anywhere
//! resets the idle clock everywhere without a server round trip. Slot
//! failures degrade to per-context-only tracking; they never break local
//! operation.

use chrono::{DateTime, Utc};
use fs_err as fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use sentinel_activity_protocol::{ActivityRecord, SLOT_FORMAT_VERSION};

use crate::error::{Result, SentinelError};

/// The shared storage slot. Single key, single value, last-writer-wins;
/// implementations never read-modify-write.
pub trait ActivitySlot {
    fn publish(&self, record: &ActivityRecord) -> Result<()>;
    fn latest(&self) -> Result<Option<ActivityRecord>>;
}

/// File-backed slot for contexts running as separate processes.
///
/// Writes go through a temp file and rename so readers never observe a
/// partial record.
#[derive(Debug, Clone)]
pub struct FileActivitySlot {
    path: PathBuf,
}

impl FileActivitySlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default slot location shared by every context of the same user.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(SentinelError::HomeDirNotFound)?;
        Ok(home.join(".sentinel").join("activity.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActivitySlot for FileActivitySlot {
    fn publish(&self, record: &ActivityRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| SentinelError::Io {
                context: format!("creating slot directory {}", parent.display()),
                source: err,
            })?;
        }

        let payload = serde_json::to_vec_pretty(record).map_err(|err| {
            SentinelError::SlotFormat {
                context: "serializing activity record".to_string(),
                source: err,
            }
        })?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload).map_err(|err| SentinelError::Io {
            context: format!("writing activity slot {}", tmp_path.display()),
            source: err,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|err| SentinelError::Io {
            context: format!("committing activity slot {}", self.path.display()),
            source: err,
        })?;
        Ok(())
    }

    fn latest(&self) -> Result<Option<ActivityRecord>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(SentinelError::Io {
                    context: format!("reading activity slot {}", self.path.display()),
                    source: err,
                });
            }
        };

        let record =
            serde_json::from_slice(&data).map_err(|err| SentinelError::SlotFormat {
                context: format!("parsing activity slot {}", self.path.display()),
                source: err,
            })?;
        Ok(Some(record))
    }
}

/// In-process slot for contexts sharing one process, and for tests.
/// Cloning yields a handle to the same underlying value.
#[derive(Debug, Clone, Default)]
pub struct MemoryActivitySlot {
    inner: Arc<Mutex<Option<ActivityRecord>>>,
}

impl MemoryActivitySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivitySlot for MemoryActivitySlot {
    fn publish(&self, record: &ActivityRecord) -> Result<()> {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(record.clone());
        Ok(())
    }

    fn latest(&self) -> Result<Option<ActivityRecord>> {
        let guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        Ok(guard.clone())
    }
}

/// Mints a context id unique across processes and across contexts created
/// back-to-back within one process.
pub fn generate_context_id() -> String {
    format!("{}-{}", std::process::id(), ulid::Ulid::new())
}

/// One context's view of the shared slot.
///
/// Publishes the context's own pulses and surfaces strictly newer foreign
/// timestamps. A context's own writes never come back as notifications: the
/// record carries the writer's identity and the synchronizer skips its own.
pub struct ContextSynchronizer {
    context_id: String,
    slot: Box<dyn ActivitySlot>,
    degraded: bool,
}

impl ContextSynchronizer {
    pub fn new(context_id: impl Into<String>, slot: Box<dyn ActivitySlot>) -> Self {
        Self {
            context_id: context_id.into(),
            slot,
            degraded: false,
        }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Publishes a debounced pulse observed at `now`. Slot failures are
    /// swallowed; local idle tracking continues either way.
    pub fn publish(&mut self, now: DateTime<Utc>) {
        let record = ActivityRecord::new(&self.context_id, now);
        match self.slot.publish(&record) {
            Ok(()) => {
                self.degraded = false;
            }
            Err(err) => self.note_degraded(&err),
        }
    }

    /// Returns a foreign activity timestamp strictly newer than `last_known`,
    /// if one has been published. Own writes and stale or malformed records
    /// yield `None`.
    pub fn poll_remote(&mut self, last_known: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        let record = match self.slot.latest() {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => {
                self.note_degraded(&err);
                return None;
            }
        };
        self.degraded = false;

        if record.version != SLOT_FORMAT_VERSION {
            debug!(
                version = record.version,
                "Ignoring activity record with unknown format version"
            );
            return None;
        }
        if record.context_id == self.context_id {
            return None;
        }

        let Some(timestamp) = record.activity_time() else {
            debug!(
                context_id = %record.context_id,
                raw = %record.last_activity_at,
                "Ignoring activity record with malformed timestamp"
            );
            return None;
        };

        match last_known {
            Some(known) if timestamp <= known => None,
            _ => Some(timestamp),
        }
    }

    fn note_degraded(&mut self, err: &SentinelError) {
        if !self.degraded {
            warn!(
                error = %err,
                "Activity slot unavailable; idle tracking continues per-context only"
            );
            self.degraded = true;
        }
    }
}
