//! Idle mechanism configuration.
//!
//! Consumers usually construct [`IdleConfig`] in code; deployments that want
//! to tune the timeouts without rebuilding can drop a TOML file next to the
//! application and call [`IdleConfig::load`]. A missing file yields defaults;
//! a malformed file is an error.

use crate::error::{Result, SentinelError};
use fs_err as fs;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 600_000;
pub const DEFAULT_WARNING_LEAD_MS: u64 = 60_000;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdleConfig {
    /// Total inactivity budget before forced logout.
    pub idle_timeout_ms: u64,
    /// How long before the idle deadline the warning appears.
    /// Must be strictly less than `idle_timeout_ms`.
    pub warning_lead_ms: u64,
    /// Raw activity events collapse to at most one pulse per this window.
    pub debounce_ms: u64,
    /// Gates all behavior. The controller additionally gates on the
    /// authentication collaborator.
    pub enabled: bool,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            warning_lead_ms: DEFAULT_WARNING_LEAD_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            enabled: true,
        }
    }
}

impl IdleConfig {
    /// Rejects configurations the mechanism cannot honor. A warning lead at
    /// or beyond the idle timeout is a validation error, not a fallback.
    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_ms == 0 {
            return Err(SentinelError::InvalidConfig {
                reason: "idle_timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.warning_lead_ms >= self.idle_timeout_ms {
            return Err(SentinelError::InvalidConfig {
                reason: format!(
                    "warning_lead_ms ({}) must be less than idle_timeout_ms ({})",
                    self.warning_lead_ms, self.idle_timeout_ms
                ),
            });
        }
        Ok(())
    }

    /// Loads configuration from a TOML file, validating the result.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(SentinelError::Io {
                    context: format!("reading idle config {}", path.display()),
                    source: err,
                });
            }
        };

        let config: IdleConfig =
            toml::from_str(&raw).map_err(|err| SentinelError::ConfigMalformed {
                path: path.to_path_buf(),
                details: err.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = IdleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.idle_timeout_ms, 600_000);
        assert_eq!(config.warning_lead_ms, 60_000);
        assert!(config.enabled);
    }

    #[test]
    fn warning_lead_equal_to_timeout_is_rejected() {
        let config = IdleConfig {
            idle_timeout_ms: 10_000,
            warning_lead_ms: 10_000,
            ..IdleConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SentinelError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = IdleConfig {
            idle_timeout_ms: 0,
            warning_lead_ms: 0,
            ..IdleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let config = IdleConfig::load(&temp.path().join("absent.toml")).expect("load");
        assert_eq!(config.idle_timeout_ms, DEFAULT_IDLE_TIMEOUT_MS);
    }

    #[test]
    fn load_parses_partial_toml_over_defaults() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("idle.toml");
        fs::write(&path, "idle_timeout_ms = 10000\nwarning_lead_ms = 4000\n").expect("write");

        let config = IdleConfig::load(&path).expect("load");
        assert_eq!(config.idle_timeout_ms, 10_000);
        assert_eq!(config.warning_lead_ms, 4_000);
        assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("idle.toml");
        fs::write(&path, "idle_timeout_ms = 1000\nwarning_lead_ms = 5000\n").expect("write");

        assert!(matches!(
            IdleConfig::load(&path),
            Err(SentinelError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("idle.toml");
        fs::write(&path, "idle_timeout_ms = \"not a number\"").expect("write");

        assert!(matches!(
            IdleConfig::load(&path),
            Err(SentinelError::ConfigMalformed { .. })
        ));
    }
}
