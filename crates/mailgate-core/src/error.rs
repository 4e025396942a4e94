//! Error types for the access layer.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::model::MessageId;
use crate::session::SessionState;

/// A protocol exchange, for timeout and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    /// TCP connect, TLS handshake and greeting.
    Connect,
    /// LOGIN and capability discovery.
    Authenticate,
    /// LIST.
    List,
    /// STATUS.
    Status,
    /// SELECT.
    Select,
    /// UID FETCH.
    Fetch,
    /// UID STORE.
    Store,
    /// UID EXPUNGE or EXPUNGE.
    Expunge,
    /// LOGOUT.
    Logout,
}

impl Exchange {
    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Authenticate => "authenticate",
            Self::List => "list",
            Self::Status => "status",
            Self::Select => "select",
            Self::Fetch => "fetch",
            Self::Store => "store",
            Self::Expunge => "expunge",
            Self::Logout => "logout",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by [`MailAccess`](crate::MailAccess) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The session could not be established or authenticated, or the
    /// transport failed underneath it.
    #[error("Connection failed during {exchange}: {source}")]
    Connection {
        /// The exchange that failed.
        exchange: Exchange,
        /// The underlying client error.
        #[source]
        source: mailgate_imap::Error,
    },

    /// The store sent a malformed, incomplete or unexpected response.
    #[error("Unexpected response to {exchange}: {reason}")]
    Protocol {
        /// The exchange that failed.
        exchange: Exchange,
        /// What was wrong.
        reason: String,
        /// The underlying client error, if any.
        #[source]
        source: Option<mailgate_imap::Error>,
    },

    /// The mailbox or message does not resolve.
    #[error("{}", describe_missing(.mailbox, .id))]
    NotFound {
        /// Mailbox the caller named.
        mailbox: String,
        /// Message id, when a message rather than the mailbox is missing.
        id: Option<MessageId>,
    },

    /// The message body could not be rendered.
    #[error("Cannot decode message {id} in {mailbox}: {source}")]
    Decode {
        /// Mailbox holding the message.
        mailbox: String,
        /// Message id.
        id: MessageId,
        /// Decoder error.
        #[source]
        source: mailgate_mime::Error,
    },

    /// The message was marked `\Deleted` but could not be expunged.
    #[error("Message {id} in {mailbox} is marked deleted but was not purged: {source}")]
    PartialDeletion {
        /// Mailbox holding the message.
        mailbox: String,
        /// Message id.
        id: MessageId,
        /// Why the purge failed.
        #[source]
        source: Box<Error>,
    },

    /// An exchange exceeded its deadline.
    #[error("{exchange} timed out after {after:?}")]
    Timeout {
        /// The exchange that timed out.
        exchange: Exchange,
        /// The configured limit.
        after: Duration,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The session is not in the state the step requires.
    #[error("Session is {actual:?}, expected {expected:?}")]
    Session {
        /// The state the step needs.
        expected: SessionState,
        /// The state the session is in.
        actual: SessionState,
    },
}

fn describe_missing(mailbox: &str, id: &Option<MessageId>) -> String {
    match id {
        Some(id) => format!("Message {id} not found in {mailbox}"),
        None => format!("Mailbox {mailbox} not found"),
    }
}

/// Stable classification of [`Error`] for the façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Connection`].
    Connection,
    /// See [`Error::Protocol`].
    Protocol,
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::Decode`].
    Decode,
    /// See [`Error::PartialDeletion`].
    PartialDeletion,
    /// See [`Error::Timeout`].
    Timeout,
    /// See [`Error::Cancelled`].
    Cancelled,
    /// See [`Error::Session`].
    Session,
}

impl ErrorKind {
    /// Returns the kind as a `snake_case` name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Protocol => "protocol",
            Self::NotFound => "not_found",
            Self::Decode => "decode",
            Self::PartialDeletion => "partial_deletion",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Returns the error's kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::PartialDeletion { .. } => ErrorKind::PartialDeletion,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Session { .. } => ErrorKind::Session,
        }
    }

    /// Maps a client error from `exchange` onto the access-layer taxonomy.
    ///
    /// Transport failures and `BYE` become [`Error::Connection`]; everything
    /// the server said that we did not expect becomes [`Error::Protocol`].
    #[must_use]
    pub fn from_imap(exchange: Exchange, source: mailgate_imap::Error) -> Self {
        match source {
            mailgate_imap::Error::Timeout(after) => Self::Timeout { exchange, after },
            e if e.is_transport() || matches!(e, mailgate_imap::Error::Bye(_)) => {
                Self::Connection {
                    exchange,
                    source: e,
                }
            }
            e => Self::Protocol {
                exchange,
                reason: e.to_string(),
                source: Some(e),
            },
        }
    }

    /// Builds a [`Error::Protocol`] that has no underlying client error.
    #[must_use]
    pub fn protocol(exchange: Exchange, reason: impl Into<String>) -> Self {
        Self::Protocol {
            exchange,
            reason: reason.into(),
            source: None,
        }
    }

    /// Builds a [`Error::NotFound`] for a mailbox.
    #[must_use]
    pub fn mailbox_not_found(mailbox: impl Into<String>) -> Self {
        Self::NotFound {
            mailbox: mailbox.into(),
            id: None,
        }
    }

    /// Builds a [`Error::NotFound`] for a message.
    #[must_use]
    pub fn message_not_found(mailbox: impl Into<String>, id: MessageId) -> Self {
        Self::NotFound {
            mailbox: mailbox.into(),
            id: Some(id),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
