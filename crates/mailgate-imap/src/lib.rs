//! Async IMAP4rev1 client for the commands a webmail gateway needs:
//! LOGIN, LIST, STATUS, SELECT, `UID FETCH`, `UID STORE` and (`UID`)
//! EXPUNGE.
//!
//! The connection is a type-state [`Client`]. Mailbox commands only exist
//! once logged in and message commands only once a mailbox is selected. A
//! transition the server turns down comes back as [`Refused`], which still
//! holds the client in the state the server left it in. Messages are only
//! ever addressed by UID. Transports are plain TCP or rustls (implicit TLS
//! and STARTTLS), and parsing is kept apart from I/O in [`parser`].
//!
//! ```ignore
//! use mailgate_imap::{Client, Config, FetchAttribute, Mailbox, Refused, Security, UidSet};
//!
//! # async fn run() -> mailgate_imap::Result<()> {
//! let config = Config::new("imap.example.com", Security::Tls);
//! let client = Client::connect(&config)
//!     .await?
//!     .login("user@example.com", "password")
//!     .await
//!     .map_err(Refused::into_error)?;
//!
//! let mut inbox = client
//!     .select(&Mailbox::inbox())
//!     .await
//!     .map_err(Refused::into_error)?;
//! let summaries = inbox
//!     .uid_fetch(&UidSet::all(), &[FetchAttribute::Uid, FetchAttribute::Envelope])
//!     .await?;
//! println!("{} of {} fetched", summaries.len(), inbox.selected().exists());
//! inbox.logout().await
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, StatusAttribute, StoreAction, TagGenerator};
pub use connection::{
    Authenticated, Authorized, Client, Config, FetchedMessage, FramedStream,
    ImapStream, NotAuthenticated, Refused, Security, Selected,
};
pub use error::{Error, Result};
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use types::{
    Capability, Condition, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode,
    SeqNum, Status, Tag, Uid, UidSet, UidValidity,
};
