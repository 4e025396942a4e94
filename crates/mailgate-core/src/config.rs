//! Server configuration.
//!
//! Mirrors the gateway's server-info document; sections this layer does not
//! use (such as `smtp`) are ignored.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// No platform configuration directory is known.
    #[error("No configuration directory found; pass a path explicitly")]
    NoConfigDir,
    /// IMAP host is empty.
    #[error("IMAP host is required")]
    EmptyHost,
    /// IMAP port is zero.
    #[error("IMAP port must be 1-65535")]
    InvalidPort,
    /// IMAP user is empty.
    #[error("IMAP user is required")]
    EmptyUser,
}

impl ConfigError {
    /// Returns the configuration field the error relates to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::EmptyHost => Some("imap.host"),
            Self::InvalidPort => Some("imap.port"),
            Self::EmptyUser => Some("imap.auth.user"),
            Self::Read { .. } | Self::Parse(_) | Self::NoConfigDir => None,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Mail store connection.
    pub imap: ImapSettings,
}

/// How to reach and authenticate against the mail store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImapSettings {
    /// Server host name.
    pub host: String,
    /// Server port; defaults by security mode (993 or 143).
    #[serde(default)]
    pub port: Option<u16>,
    /// Transport security.
    #[serde(default)]
    pub security: SecurityMode,
    /// Login credentials.
    pub auth: Credentials,
    /// Per-exchange deadlines.
    #[serde(default)]
    pub timeouts: Timeouts,
}

impl std::fmt::Debug for ImapSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("user", &self.auth.user)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

/// Transport security mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// TLS from the first byte.
    #[default]
    Tls,
    /// Plain connection upgraded with STARTTLS.
    StartTls,
    /// No encryption. Only for local test servers.
    None,
}

impl From<SecurityMode> for mailgate_imap::Security {
    fn from(mode: SecurityMode) -> Self {
        match mode {
            SecurityMode::Tls => Self::Tls,
            SecurityMode::StartTls => Self::StartTls,
            SecurityMode::None => Self::Plain,
        }
    }
}

/// Login credentials. Never logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// User name.
    pub user: String,
    /// Password.
    pub pass: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

/// Deadlines for protocol exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// TCP connect, TLS handshake and greeting.
    pub connect_secs: u64,
    /// Each command exchange after the greeting.
    pub command_secs: u64,
    /// LOGOUT during teardown.
    pub logout_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            command_secs: 30,
            logout_secs: 5,
        }
    }
}

impl Timeouts {
    /// Connect deadline.
    #[must_use]
    pub const fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    /// Per-command deadline.
    #[must_use]
    pub const fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    /// Logout deadline.
    #[must_use]
    pub const fn logout(&self) -> Duration {
        Duration::from_secs(self.logout_secs)
    }
}

impl ServerConfig {
    /// Returns `<config dir>/mailgate/server.json`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] on platforms without one.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("mailgate").join("server.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), host = %config.imap.host, "loaded configuration");
        Ok(config)
    }

    /// Checks required fields.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let imap = &self.imap;
        if imap.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if imap.port == Some(0) {
            return Err(ConfigError::InvalidPort);
        }
        if imap.auth.user.trim().is_empty() {
            return Err(ConfigError::EmptyUser);
        }
        Ok(())
    }
}

impl ImapSettings {
    /// Builds the client connection configuration.
    #[must_use]
    pub fn client_config(&self) -> mailgate_imap::Config {
        mailgate_imap::Config::new(self.host.clone(), self.security.into())
            .with_port(self.port)
            .with_connect_timeout(self.timeouts.connect())
    }
}
