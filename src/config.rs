//! Device buffering configuration.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: values set via builder methods (`buffer_size(4096)`)
//! 2. **Environment variables**: values from `IOCORE_*` env vars
//! 3. **Config file**: values loaded from TOML (requires `config-file` feature)
//! 4. **Defaults**: [`DeviceConfig::default()`]
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `buffer_size` | 16 KiB |
//! | `chunk_size` | 4 KiB |
//! | `write_chunk_size` | 0 (one growing chunk) |
//! | `crlf_on_write` | `cfg!(windows)` |
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `IOCORE_BUFFER_SIZE` | `usize` | `buffer_size` |
//! | `IOCORE_CHUNK_SIZE` | `usize` | `chunk_size` |
//! | `IOCORE_WRITE_CHUNK_SIZE` | `usize` | `write_chunk_size` |
//! | `IOCORE_CRLF_ON_WRITE` | `bool` | `crlf_on_write` |

/// Environment variable name for the read fill size.
pub const ENV_BUFFER_SIZE: &str = "IOCORE_BUFFER_SIZE";
/// Environment variable name for the read queue chunk size.
pub const ENV_CHUNK_SIZE: &str = "IOCORE_CHUNK_SIZE";
/// Environment variable name for the write queue chunk size.
pub const ENV_WRITE_CHUNK_SIZE: &str = "IOCORE_WRITE_CHUNK_SIZE";
/// Environment variable name for `\n` to `\r\n` expansion in text mode.
pub const ENV_CRLF_ON_WRITE: &str = "IOCORE_CRLF_ON_WRITE";

/// Default read fill size.
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Error produced while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong type.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// What the variable should contain.
        expected: &'static str,
        /// The rejected value.
        value: String,
    },
    /// A TOML document could not be parsed.
    #[error("failed to parse TOML config: {0}")]
    Toml(String),
    /// A config file could not be read.
    #[error("failed to read config file {path}: {message}")]
    Read {
        /// Path of the file.
        path: String,
        /// Underlying I/O error text.
        message: String,
    },
}

/// Buffering parameters for a [`Device`](crate::io::Device).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Bytes requested from the raw device per buffer fill. Reads of at
    /// least this size bypass the buffer.
    pub buffer_size: usize,
    /// Chunk granularity of the read queues.
    pub chunk_size: usize,
    /// Chunk granularity of the write queues (0 = one growing chunk).
    pub write_chunk_size: usize,
    /// Expand `\n` to `\r\n` when writing in text mode.
    pub crlf_on_write: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            chunk_size: crate::bytes::queue::DEFAULT_CHUNK_SIZE,
            write_chunk_size: 0,
            crlf_on_write: cfg!(windows),
        }
    }
}

impl DeviceConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with `IOCORE_*` environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] if a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Sets the read fill size.
    #[must_use]
    pub const fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the read queue chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the write queue chunk size.
    #[must_use]
    pub const fn write_chunk_size(mut self, size: usize) -> Self {
        self.write_chunk_size = size;
        self
    }

    /// Enables or disables `\r\n` expansion in text mode.
    #[must_use]
    pub const fn crlf_on_write(mut self, enabled: bool) -> Self {
        self.crlf_on_write = enabled;
        self
    }

    /// Normalize configuration values to usable ones.
    pub fn normalize(&mut self) {
        if self.buffer_size == 0 {
            self.buffer_size = 1;
        }
    }
}

/// Apply environment variable overrides to a [`DeviceConfig`].
///
/// Only variables that are set in the environment are applied.
///
/// # Errors
///
/// Returns an error if a variable is set but contains an unparseable value.
pub fn apply_env_overrides(config: &mut DeviceConfig) -> Result<(), ConfigError> {
    if let Some(val) = read_env(ENV_BUFFER_SIZE) {
        config.buffer_size = parse_usize(ENV_BUFFER_SIZE, &val)?;
    }
    if let Some(val) = read_env(ENV_CHUNK_SIZE) {
        config.chunk_size = parse_usize(ENV_CHUNK_SIZE, &val)?;
    }
    if let Some(val) = read_env(ENV_WRITE_CHUNK_SIZE) {
        config.write_chunk_size = parse_usize(ENV_WRITE_CHUNK_SIZE, &val)?;
    }
    if let Some(val) = read_env(ENV_CRLF_ON_WRITE) {
        config.crlf_on_write = parse_bool(ENV_CRLF_ON_WRITE, &val)?;
    }
    Ok(())
}

/// Read an environment variable, returning `None` if unset.
fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_usize(var: &'static str, val: &str) -> Result<usize, ConfigError> {
    val.trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidEnv {
            var,
            expected: "unsigned integer",
            value: val.to_string(),
        })
}

fn parse_bool(var: &'static str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            expected: "bool (true/false/1/0/yes/no)",
            value: val.to_string(),
        }),
    }
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable device configuration.
///
/// ```toml
/// [device]
/// buffer_size = 65536
/// chunk_size = 8192
/// write_chunk_size = 0
/// crlf_on_write = false
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct DeviceTomlConfig {
    /// Device buffering settings.
    #[serde(default)]
    pub device: DeviceToml,
}

/// Device section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
pub struct DeviceToml {
    /// Read fill size.
    pub buffer_size: Option<usize>,
    /// Read queue chunk size.
    pub chunk_size: Option<usize>,
    /// Write queue chunk size.
    pub write_chunk_size: Option<usize>,
    /// `\r\n` expansion in text mode.
    pub crlf_on_write: Option<bool>,
}

/// Apply a parsed TOML config to a [`DeviceConfig`].
///
/// Only fields that are `Some` in the TOML struct override the config.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut DeviceConfig, toml: &DeviceTomlConfig) {
    if let Some(v) = toml.device.buffer_size {
        config.buffer_size = v;
    }
    if let Some(v) = toml.device.chunk_size {
        config.chunk_size = v;
    }
    if let Some(v) = toml.device.write_chunk_size {
        config.write_chunk_size = v;
    }
    if let Some(v) = toml.device.crlf_on_write {
        config.crlf_on_write = v;
    }
}

/// Parse a TOML string into a [`DeviceTomlConfig`].
///
/// # Errors
///
/// Returns [`ConfigError::Toml`] on malformed input.
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<DeviceTomlConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::Toml(e.to_string()))
}

/// Read and parse a TOML file into a [`DeviceTomlConfig`].
///
/// # Errors
///
/// Returns [`ConfigError::Read`] or [`ConfigError::Toml`].
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> Result<DeviceTomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_toml_str(&content)
}

#[cfg(feature = "config-file")]
impl DeviceConfig {
    /// Defaults, then the TOML document, then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the TOML or an env variable is invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_toml_config(&mut config, &parse_toml_str(toml_str)?);
        apply_env_overrides(&mut config)?;
        Ok(config)
    }
}
