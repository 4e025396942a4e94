//! `msg-att` lists of FETCH responses.

use crate::Result;
use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;

use super::data::{each_in_parens, flag_list, truncated};
use super::types::{Address, Envelope, FetchItem};

/// Parses `(NAME value NAME value ...)`, keeping the items this client
/// models and stepping over the rest.
pub(super) fn items(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    let mut items = Vec::new();
    each_in_parens(lexer, "FETCH response", |lexer, token| {
        let Token::Atom(name) = token else {
            return Err(lexer.error(&format!("Expected FETCH item name, got {token:?}")));
        };
        items.extend(item(lexer, &name.to_ascii_uppercase())?);
        Ok(())
    })?;
    Ok(items)
}

fn item(lexer: &mut Lexer<'_>, name: &str) -> Result<Option<FetchItem>> {
    let section = if lexer.peek() == Some(b'[') {
        Some(section(lexer)?)
    } else {
        None
    };
    lexer.expect_space()?;

    let item = match name {
        "UID" => {
            let n = lexer.read_number()?;
            FetchItem::Uid(Uid::new(n).ok_or_else(|| lexer.error("UID cannot be 0"))?)
        }
        "FLAGS" => FetchItem::Flags(flag_list(lexer)?),
        "RFC822.SIZE" => FetchItem::Rfc822Size(lexer.read_number()?),
        "INTERNALDATE" => match lexer.read_nstring()? {
            Some(date) => FetchItem::InternalDate(date),
            None => return Ok(None),
        },
        "ENVELOPE" => FetchItem::Envelope(Box::new(envelope(lexer)?)),
        "RFC822" => FetchItem::Body {
            section: None,
            data: lexer.read_nstring_bytes()?,
        },
        "BODY" if section.is_some() => FetchItem::Body {
            section,
            data: lexer.read_nstring_bytes()?,
        },
        _ => {
            skip_value(lexer)?;
            return Ok(None);
        }
    };
    Ok(Some(item))
}

/// `[section]` plus an optional `<origin>` partial marker, which is dropped.
fn section(lexer: &mut Lexer<'_>) -> Result<String> {
    lexer.advance();
    let rest = lexer.remaining();
    let Some(end) = rest.iter().position(|&b| b == b']') else {
        return Err(truncated(lexer, "BODY section"));
    };
    let text = String::from_utf8_lossy(&rest[..end]).into_owned();
    lexer.skip(end + 1);

    if lexer.peek() == Some(b'<') {
        while lexer.advance().is_some_and(|b| b != b'>') {}
    }
    Ok(text)
}

/// Consumes one value: a single token or a balanced parenthesized group.
fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen if depth > 1 => depth -= 1,
            Token::RParen if depth == 1 => return Ok(()),
            Token::RParen => return Err(lexer.error("Unbalanced parenthesis in FETCH")),
            Token::Crlf | Token::Eof => return Err(truncated(lexer, "FETCH item")),
            _ if depth == 0 => return Ok(()),
            _ => {}
        }
    }
}

fn spaced<'a, T>(
    lexer: &mut Lexer<'a>,
    read: impl FnOnce(&mut Lexer<'a>) -> Result<T>,
) -> Result<T> {
    lexer.expect_space()?;
    read(lexer)
}

/// `(date subject from sender reply-to to cc bcc in-reply-to message-id)`.
fn envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(Token::LParen)?;
    let date = lexer.read_nstring()?;
    let subject = spaced(lexer, Lexer::read_nstring)?;

    let mut lists: [Vec<Address>; 6] = Default::default();
    for list in &mut lists {
        *list = spaced(lexer, address_list)?;
    }
    let [from, sender, reply_to, to, cc, bcc] = lists;

    let in_reply_to = spaced(lexer, Lexer::read_nstring)?;
    let message_id = spaced(lexer, Lexer::read_nstring)?;
    lexer.expect(Token::RParen)?;

    Ok(Envelope {
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    })
}

/// `NIL` or `((name adl mailbox host) ...)`.
fn address_list(lexer: &mut Lexer<'_>) -> Result<Vec<Address>> {
    if lexer.peek() != Some(b'(') {
        lexer.expect(Token::Nil)?;
        return Ok(Vec::new());
    }

    let mut addresses = Vec::new();
    each_in_parens(lexer, "address list", |lexer, token| {
        if token != Token::LParen {
            return Err(lexer.error(&format!("Expected address, got {token:?}")));
        }
        let name = lexer.read_nstring()?;
        let adl = spaced(lexer, Lexer::read_nstring)?;
        let mailbox = spaced(lexer, Lexer::read_nstring)?;
        let host = spaced(lexer, Lexer::read_nstring)?;
        lexer.expect(Token::RParen)?;
        addresses.push(Address {
            name,
            adl,
            mailbox,
            host,
        });
        Ok(())
    })?;
    Ok(addresses)
}
