//! IMAP connection management.
//!
//! Transport setup (plain, implicit TLS, STARTTLS), CRLF/literal framing and
//! the type-state [`Client`].

mod client;
mod config;
mod framed;
mod stream;

pub use client::{
    Authenticated, Authorized, Client, FetchedMessage, NotAuthenticated, Refused, Selected,
};
pub use config::{Config, Security};
pub use framed::FramedStream;
pub use stream::ImapStream;
