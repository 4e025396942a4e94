//! Client errors.

use std::time::Duration;

use thiserror::Error;

use crate::types::ResponseCode;

/// Everything that can go wrong between the socket and a typed response.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or TLS stream failure.
    #[error("Transport failure: {0}")]
    Io(#[from] std::io::Error),

    /// The host cannot be used as a TLS server name.
    #[error("Bad TLS server name: {0}")]
    ServerName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A response did not follow the grammar.
    #[error("Malformed response at byte {position}: {message}")]
    Parse {
        /// Offset into the response.
        position: usize,
        /// What the parser expected.
        message: String,
    },

    /// Tagged `NO`: the server refused the command.
    #[error("Command refused: {text}")]
    No {
        /// Bracketed code, e.g. `NONEXISTENT`.
        code: Option<ResponseCode>,
        /// Server text.
        text: String,
    },

    /// Tagged `BAD`: the server rejected the command syntax.
    #[error("Command rejected as invalid: {0}")]
    Bad(String),

    /// The server closed the session.
    #[error("Server said BYE: {0}")]
    Bye(String),

    /// Connecting took longer than allowed.
    #[error("Gave up after {0:?}")]
    Timeout(Duration),

    /// The call makes no sense in the connection's current condition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Well-formed but unexpected conversation.
    #[error("Protocol violation: {0}")]
    Protocol(String),
}

impl Error {
    /// True for a tagged `NO`.
    #[must_use]
    pub const fn is_no(&self) -> bool {
        matches!(self, Self::No { .. })
    }

    /// True when the failure lies below the protocol: the connection itself
    /// is broken or could not be made.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ServerName(_) | Self::Timeout(_))
    }

    /// The response code of a refusal.
    #[must_use]
    pub const fn code(&self) -> Option<&ResponseCode> {
        match self {
            Self::No { code, .. } => code.as_ref(),
            _ => None,
        }
    }
}

/// `Result` with this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
