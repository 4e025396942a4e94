//! # mailgate-mime
//!
//! Turns a raw RFC 5322 message into a single readable text.
//!
//! ## Features
//!
//! - **MIME tree**: every message is first converted into a [`MimeNode`]
//!   tree of text, HTML, attachment, multipart and embedded-message nodes
//! - **Flattening**: `multipart/alternative` prefers `text/plain` and falls
//!   back to the first renderable part; other multiparts are concatenated
//! - **Charsets**: transfer encodings and declared charsets are decoded
//! - **Attachments**: referenced by placeholder, never inlined
//! - **Headers**: RFC 2047 encoded words are decoded
//!
//! ## Quick Start
//!
//! ```
//! let raw = b"From: Ada <ada@example.org>\r\n\
//!             Subject: =?utf-8?q?caf=C3=A9?=\r\n\
//!             Content-Type: text/plain; charset=utf-8\r\n\
//!             \r\n\
//!             Hello!\r\n";
//!
//! let body = mailgate_mime::render_message(raw).unwrap();
//! assert_eq!(body.subject.as_deref(), Some("café"));
//! assert_eq!(body.text.trim(), "Hello!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod headers;
mod message;
mod render;
mod tree;

pub use error::{Error, Result};
pub use headers::{decode_header_value, format_mailbox};
pub use message::{MessageBody, render_message};
pub use render::render;
pub use tree::{AttachmentRef, MimeNode, MultipartKind};
