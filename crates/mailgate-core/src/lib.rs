//! # mailgate-core
//!
//! The mailbox/message access layer of the mailgate webmail gateway.
//!
//! Every operation opens its own IMAP session, performs its exchanges and
//! closes the session again:
//!
//! - **Session manager** ([`session`]): connect, LOGIN, guaranteed LOGOUT,
//!   per-exchange deadlines, cooperative cancellation
//! - **Mailbox catalog** ([`catalog`]): LIST plus STATUS counts
//! - **Message index** ([`index`]): summaries with stable [`MessageId`]s
//!   derived from UIDVALIDITY and UID
//! - **Body resolver** ([`body`]): `BODY.PEEK[]` flattened to text
//! - **Deletion coordinator** ([`delete`]): mark and purge in one session
//!
//! ```ignore
//! use mailgate_core::{MailAccess, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ServerConfig::load(&ServerConfig::default_path()?)?;
//! let access = MailAccess::from_config(&config);
//! let cancel = CancellationToken::new();
//!
//! for message in access.list_messages(&cancel, "INBOX").await? {
//!     println!("{} {:?}", message.id, message.subject);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod access;
pub mod body;
pub mod catalog;
pub mod config;
pub mod connector;
pub mod delete;
mod error;
pub mod index;
pub mod model;
pub mod session;

pub use access::MailAccess;
pub use config::{ConfigError, Credentials, ImapSettings, SecurityMode, ServerConfig, Timeouts};
pub use connector::{Connector, ImapConnector};
pub use error::{Error, ErrorKind, Exchange, Result};
pub use model::{
    AttachmentRef, Mailbox, MessageBody, MessageFlags, MessageId, MessageSummary, SpecialUse,
};
pub use session::{Session, SessionState, with_session};
