//! Sans-I/O response parser.
//!
//! [`lexer`] splits bytes into tokens; [`response`] assembles tokens into
//! [`Response`] values. Input is always one complete response as framed by
//! the connection layer.
//!
//! ```
//! use mailgate_imap::parser::{Response, ResponseParser, UntaggedResponse};
//!
//! let parsed = ResponseParser::parse(b"* 3 EXISTS\r\n").unwrap();
//! assert!(matches!(parsed, Response::Untagged(UntaggedResponse::Exists(3))));
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{
    Address, Envelope, FetchItem, Response, ResponseParser, StatusItem, UntaggedResponse,
};
