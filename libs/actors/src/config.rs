//! Runtime Configuration
//!
//! Mailbox bounds, ask and shutdown timeouts, incident retention and the
//! restart window. Loaded from an optional TOML file with an optional
//! environment overlay, then `ACTORS__*` environment variables
//! (e.g. `ACTORS__ASK_TIMEOUT_MS=250`, `ACTORS__RESTART__MAX_RESTARTS=3`).

use crate::error::{ActorError, Result};
use anyhow::Context;
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runtime settings shared by every actor of a system
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum queued user messages per mailbox
    pub mailbox_capacity: usize,

    /// Default deadline for `ask` when callers do not pass one
    pub ask_timeout_ms: u64,

    /// How long a stopping parent waits for each child
    pub shutdown_timeout_ms: u64,

    /// Number of recent incidents kept for inspection
    pub incident_log_capacity: usize,

    /// Restart-in-place limits
    pub restart: RestartPolicy,
}

/// Restart window applied when an actor answers a fault with `Restart`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RestartPolicy {
    /// Restarts allowed inside one window before the actor is stopped
    pub max_restarts: u32,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: 5,
            window_secs: 60,
        }
    }
}

impl RestartPolicy {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 10_000,
            ask_timeout_ms: 5_000,
            shutdown_timeout_ms: 2_000,
            incident_log_capacity: 1_024,
            restart: RestartPolicy::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration with file and environment overrides
    ///
    /// With `environment = Some("test")` and `base_path = runtime.toml`, the
    /// file `runtime.test.toml` next to it is layered on top when present.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> anyhow::Result<Self> {
        let mut builder = Config::builder();

        if let Some(base) = base_path {
            debug!("Loading runtime config: {:?}", base);
            builder = builder.add_source(File::from(base).required(true));

            if let Some(env) = environment {
                let env_file = environment_file(base, env);
                if env_file.exists() {
                    info!("Loading environment config: {:?}", env_file);
                    builder = builder.add_source(File::from(env_file));
                } else {
                    warn!("Environment config not found: {:?}", env_file);
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ACTORS")
                .separator("__")
                .try_parsing(true),
        );

        let config: RuntimeConfig = builder
            .build()
            .context("Failed to build runtime configuration")?
            .try_deserialize()
            .context("Failed to deserialize runtime configuration")?;

        config
            .validate()
            .context("Runtime configuration is invalid")?;
        Ok(config)
    }

    /// Reject settings the runtime cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.mailbox_capacity == 0 {
            return Err(ActorError::configuration(
                "mailbox capacity must be greater than zero",
                Some("mailbox_capacity"),
            ));
        }
        if self.ask_timeout_ms == 0 {
            return Err(ActorError::configuration(
                "ask timeout must be greater than zero",
                Some("ask_timeout_ms"),
            ));
        }
        if self.shutdown_timeout_ms == 0 {
            return Err(ActorError::configuration(
                "shutdown timeout must be greater than zero",
                Some("shutdown_timeout_ms"),
            ));
        }
        if self.incident_log_capacity == 0 {
            return Err(ActorError::configuration(
                "incident log capacity must be greater than zero",
                Some("incident_log_capacity"),
            ));
        }
        Ok(())
    }

    pub fn ask_timeout(&self) -> Duration {
        Duration::from_millis(self.ask_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

fn environment_file(base: &Path, environment: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "runtime".to_string());
    base.with_file_name(format!("{}.{}.toml", stem, environment))
}
