//! Where and how to connect.

use std::time::Duration;

/// Transport security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// TLS from the first byte (IMAPS).
    #[default]
    Tls,
    /// Plaintext upgraded with STARTTLS before login.
    StartTls,
    /// Plaintext throughout. Local test servers only.
    Plain,
}

impl Security {
    /// The IANA port for this mode: 993 for IMAPS, 143 otherwise.
    #[must_use]
    pub const fn well_known_port(self) -> u16 {
        match self {
            Self::Tls => 993,
            Self::StartTls | Self::Plain => 143,
        }
    }
}

/// Connection parameters for [`Client::connect`](crate::Client::connect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server hostname, also used for certificate verification.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Transport security.
    pub security: Security,
    /// Bound on TCP connect plus TLS handshake.
    pub connect_timeout: Duration,
}

impl Config {
    /// Connection to `host` on the well-known port for `security`.
    #[must_use]
    pub fn new(host: impl Into<String>, security: Security) -> Self {
        Self {
            host: host.into(),
            port: security.well_known_port(),
            security,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Overrides the port; `None` keeps the current one.
    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// Sets the connect bound.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
