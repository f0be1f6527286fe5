//! TOML Configuration File Support
//!
//! Renderer configuration lives in `~/.config/trackside/renderer.toml`.
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [dispatch]
//! action_timeout_ms = 30000          # 0 disables the timeout
//! on_local_handler_error = "continue" # or "abort"
//!
//! [events]
//! queue_capacity = 256
//! ```
//!
//! # Environment Variables
//!
//! - `TRACKSIDE_ACTION_TIMEOUT_MS`
//! - `TRACKSIDE_LOCAL_HANDLER_ERROR`
//! - `TRACKSIDE_EVENT_QUEUE_CAPACITY`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_ACTION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_QUEUE_CAPACITY: usize = 256;

const ENV_ACTION_TIMEOUT: &str = "TRACKSIDE_ACTION_TIMEOUT_MS";
const ENV_LOCAL_HANDLER_ERROR: &str = "TRACKSIDE_LOCAL_HANDLER_ERROR";
const ENV_QUEUE_CAPACITY: &str = "TRACKSIDE_EVENT_QUEUE_CAPACITY";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Local Handler Failure Policy
// =============================================================================

/// What the dispatcher does when a synchronous local handler fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalFailurePolicy {
    /// Log the failure and still call the host
    #[default]
    Continue,
    /// Return the failure and skip the host call
    Abort,
}

impl fmt::Display for LocalFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for LocalFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "abort" => Ok(Self::Abort),
            other => Err(ConfigError::ValidationError(format!(
                "on_local_handler_error must be \"continue\" or \"abort\", got \"{other}\""
            ))),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Dispatch section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchToml {
    /// Remote call timeout in milliseconds (0 = no timeout)
    pub action_timeout_ms: Option<u64>,

    /// Local handler failure policy
    pub on_local_handler_error: Option<LocalFailurePolicy>,
}

/// Events section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsToml {
    /// Pushed-event channel capacity
    pub queue_capacity: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererToml {
    /// Dispatch configuration section
    pub dispatch: DispatchToml,

    /// Events configuration section
    pub events: EventsToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Effective renderer configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Remote call timeout (`None` = wait forever)
    pub action_timeout: Option<Duration>,

    /// Local handler failure policy
    pub on_local_handler_error: LocalFailurePolicy,

    /// Pushed-event channel capacity
    pub event_queue_capacity: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            action_timeout: Some(Duration::from_millis(DEFAULT_ACTION_TIMEOUT_MS)),
            on_local_handler_error: LocalFailurePolicy::default(),
            event_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl BridgeConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remote call timeout in milliseconds (0 disables it)
    #[must_use]
    pub fn with_action_timeout_ms(mut self, ms: u64) -> Self {
        self.action_timeout = timeout_from_ms(ms);
        self
    }

    /// Set the local handler failure policy
    #[must_use]
    pub fn with_local_failure_policy(mut self, policy: LocalFailurePolicy) -> Self {
        self.on_local_handler_error = policy;
        self
    }

    /// Set the pushed-event channel capacity
    #[must_use]
    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero queue capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "events.queue_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Timeout in milliseconds as written in the config file (0 = none)
    #[must_use]
    pub fn action_timeout_ms(&self) -> u64 {
        self.action_timeout
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

fn timeout_from_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/trackside/renderer.toml` or
/// `~/.config/trackside/renderer.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("trackside").join("renderer.toml"))
}

/// Load configuration from the default path, then the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the merged values fail validation. A missing file is not an error.
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then the environment
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the merged
/// values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<BridgeConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<BridgeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = BridgeConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: RendererToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn apply_toml_config(config: &mut BridgeConfig, toml: &RendererToml) {
    if let Some(ms) = toml.dispatch.action_timeout_ms {
        config.action_timeout = timeout_from_ms(ms);
    }
    if let Some(policy) = toml.dispatch.on_local_handler_error {
        config.on_local_handler_error = policy;
    }
    if let Some(capacity) = toml.events.queue_capacity {
        config.event_queue_capacity = capacity;
    }
}

fn apply_env_config<F>(config: &mut BridgeConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(timeout) = env(ENV_ACTION_TIMEOUT) {
        match timeout.trim().parse::<u64>() {
            Ok(ms) => {
                config.action_timeout = timeout_from_ms(ms);
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(var = ENV_ACTION_TIMEOUT, value = %timeout, "Ignoring unparsable value"),
        }
    }
    if let Some(policy) = env(ENV_LOCAL_HANDLER_ERROR) {
        config.on_local_handler_error = policy.parse()?;
        config.source = ConfigSource::Env;
    }
    if let Some(capacity) = env(ENV_QUEUE_CAPACITY) {
        match capacity.trim().parse::<usize>() {
            Ok(n) => {
                config.event_queue_capacity = n;
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(var = ENV_QUEUE_CAPACITY, value = %capacity, "Ignoring unparsable value"),
        }
    }
    Ok(())
}

// =============================================================================
// CLI Overrides
// =============================================================================

/// Values supplied on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Remote call timeout override (milliseconds, 0 = none)
    pub action_timeout_ms: Option<u64>,

    /// Local handler failure policy override
    pub on_local_handler_error: Option<LocalFailurePolicy>,

    /// Queue capacity override
    pub event_queue_capacity: Option<usize>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.action_timeout_ms.is_none()
            && self.on_local_handler_error.is_none()
            && self.event_queue_capacity.is_none()
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the result is invalid.
    pub fn apply(&self, config: &mut BridgeConfig) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Ok(());
        }
        config.source = ConfigSource::Cli;

        if let Some(ms) = self.action_timeout_ms {
            config.action_timeout = timeout_from_ms(ms);
        }
        if let Some(policy) = self.on_local_handler_error {
            config.on_local_handler_error = policy;
        }
        if let Some(capacity) = self.event_queue_capacity {
            config.event_queue_capacity = capacity;
        }
        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
