//! Whole-response parser.
//!
//! Turns one complete server response (a line plus any embedded literals)
//! into a [`Response`]. Data for keywords the client never requests comes
//! back as [`UntaggedResponse::Other`]; a known keyword whose body breaks
//! the grammar is an error.

#![allow(clippy::missing_errors_doc)]

mod data;
mod fetch;
mod types;

pub use types::{Address, Envelope, FetchItem, StatusItem, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{Condition, SeqNum, Status, Tag};
use crate::{Error, Result};

use data::rest_of_line;

/// A parsed server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Completion of the command sent with `tag`.
    Tagged {
        /// Tag of the completed command.
        tag: Tag,
        /// How it completed.
        condition: Condition,
    },
    /// Server data.
    Untagged(UntaggedResponse),
    /// `+` continuation request.
    Continuation {
        /// Text after the `+`, if any.
        text: Option<String>,
    },
}

/// Stateless entry point of the parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => {
                lexer.expect_space()?;
                let untagged = Self::untagged(&mut lexer)?;
                Ok(Response::Untagged(untagged))
            }
            Token::Plus => {
                if lexer.peek() == Some(b' ') {
                    lexer.advance();
                }
                let text = rest_of_line(&mut lexer);
                Ok(Response::Continuation {
                    text: (!text.is_empty()).then_some(text),
                })
            }
            Token::Atom(tag) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?;
                let status = Status::parse(keyword)
                    .ok_or_else(|| lexer.error(&format!("Invalid status: {keyword}")))?;
                Ok(Response::Tagged {
                    tag: Tag::new(tag),
                    condition: Self::condition(&mut lexer, status)?,
                })
            }
            token => Err(Error::Parse {
                position: 0,
                message: format!("Expected *, + or a tag, got {token:?}"),
            }),
        }
    }

    fn untagged(lexer: &mut Lexer<'_>) -> Result<UntaggedResponse> {
        let response = match lexer.next_token()? {
            Token::Atom(keyword) => {
                if let Some(status) = Status::parse(keyword) {
                    return Self::condition(lexer, status).map(UntaggedResponse::Condition);
                }
                let keyword = keyword.to_ascii_uppercase();
                match keyword.as_str() {
                    "CAPABILITY" => UntaggedResponse::Capability(data::capabilities(lexer)?),
                    "FLAGS" => {
                        lexer.expect_space()?;
                        UntaggedResponse::Flags(data::flag_list(lexer)?)
                    }
                    "LIST" => {
                        lexer.expect_space()?;
                        UntaggedResponse::List(data::list_data(lexer)?)
                    }
                    "STATUS" => {
                        lexer.expect_space()?;
                        let (mailbox, items) = data::status_data(lexer)?;
                        UntaggedResponse::Status { mailbox, items }
                    }
                    _ => return Ok(Self::skip(lexer, keyword)),
                }
            }
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?.to_ascii_uppercase();
                match keyword.as_str() {
                    "EXISTS" => UntaggedResponse::Exists(n),
                    "RECENT" => UntaggedResponse::Recent(n),
                    "EXPUNGE" => UntaggedResponse::Expunge(Self::seq(lexer, n)?),
                    "FETCH" => {
                        let seq = Self::seq(lexer, n)?;
                        lexer.expect_space()?;
                        let items = fetch::items(lexer)?;
                        UntaggedResponse::Fetch { seq, items }
                    }
                    _ => return Ok(Self::skip(lexer, keyword)),
                }
            }
            token => {
                return Err(lexer.error(&format!("Unexpected token after '*': {token:?}")));
            }
        };

        Self::expect_end(lexer)?;
        Ok(response)
    }

    /// `resp-text`: optional `[code]`, then free text up to CRLF.
    fn condition(lexer: &mut Lexer<'_>, status: Status) -> Result<Condition> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        let code = match lexer.peek() {
            Some(b'[') => Some(data::response_code(lexer)?),
            _ => None,
        };
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        Ok(Condition {
            status,
            code,
            text: rest_of_line(lexer),
        })
    }

    fn skip(lexer: &mut Lexer<'_>, keyword: String) -> UntaggedResponse {
        rest_of_line(lexer);
        UntaggedResponse::Other { keyword }
    }

    /// Tolerates trailing spaces, then requires the end of the line.
    fn expect_end(lexer: &mut Lexer<'_>) -> Result<()> {
        while lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        match lexer.next_token()? {
            Token::Crlf | Token::Eof => Ok(()),
            token => Err(lexer.error(&format!("Unexpected trailing data: {token:?}"))),
        }
    }

    fn seq(lexer: &Lexer<'_>, n: u32) -> Result<SeqNum> {
        SeqNum::new(n).ok_or_else(|| lexer.error("Sequence number 0"))
    }
}
