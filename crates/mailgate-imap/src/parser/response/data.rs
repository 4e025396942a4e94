//! Bodies of the non-FETCH untagged responses and of response codes.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, ResponseCode, Uid,
    UidValidity,
};
use crate::{Error, Result};

use super::types::StatusItem;

/// Walks a `( ... )` list, handing every non-space token to `item`.
pub(super) fn each_in_parens<'a>(
    lexer: &mut Lexer<'a>,
    what: &str,
    mut item: impl FnMut(&mut Lexer<'a>, Token<'a>) -> Result<()>,
) -> Result<()> {
    lexer.expect(Token::LParen)?;
    loop {
        match lexer.next_token()? {
            Token::RParen => return Ok(()),
            Token::Space => {}
            Token::Crlf | Token::Eof => return Err(truncated(lexer, what)),
            token => item(lexer, token)?,
        }
    }
}

pub(super) fn truncated(lexer: &Lexer<'_>, what: &str) -> Error {
    lexer.error(&format!("Truncated {what}"))
}

fn unexpected(lexer: &Lexer<'_>, what: &str, token: &Token<'_>) -> Error {
    lexer.error(&format!("Unexpected token in {what}: {token:?}"))
}

/// Rest of the line as lossy UTF-8; the CRLF is consumed but not returned.
pub(super) fn rest_of_line(lexer: &mut Lexer<'_>) -> String {
    let rest = lexer.remaining();
    let end = rest
        .windows(2)
        .position(|pair| pair == b"\r\n")
        .unwrap_or(rest.len());
    lexer.skip(end + 2);
    String::from_utf8_lossy(&rest[..end]).into_owned()
}

fn nonzero<T>(lexer: &mut Lexer<'_>, what: &str, wrap: fn(u32) -> Option<T>) -> Result<T> {
    lexer.expect_space()?;
    let n = lexer.read_number()?;
    wrap(n).ok_or_else(|| lexer.error(&format!("{what} cannot be 0")))
}

/// `[CODE args]`. Arguments of codes this client does not model are dropped.
pub(super) fn response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;
    let name = lexer.read_atom_string()?;

    let code = match name.to_ascii_uppercase().as_str() {
        "ALERT" => ResponseCode::Alert,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "NONEXISTENT" => ResponseCode::NonExistent,
        "UIDNEXT" => ResponseCode::UidNext(nonzero(lexer, "UIDNEXT", Uid::new)?),
        "UIDVALIDITY" => {
            ResponseCode::UidValidity(nonzero(lexer, "UIDVALIDITY", UidValidity::new)?)
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            ResponseCode::Unseen(lexer.read_number()?)
        }
        "CAPABILITY" => ResponseCode::Capability(capabilities(lexer)?),
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            ResponseCode::PermanentFlags(flag_list(lexer)?)
        }
        other => ResponseCode::Unknown(other.to_string()),
    };

    while !lexer.is_eof() && lexer.peek() != Some(b']') {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;
    Ok(code)
}

/// Space-led capability names up to the end of the data.
pub(super) fn capabilities(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut found = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        let capability = match lexer.next_token()? {
            Token::Atom(name) => Capability::parse(name),
            Token::Number(n) => Capability::Other(n.to_string()),
            token => return Err(unexpected(lexer, "capabilities", &token)),
        };
        found.push(capability);
    }
    Ok(found)
}

/// `(\Seen $Label)`. The `\*` of PERMANENTFLAGS becomes the keyword `*`.
pub(super) fn flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    let mut flags = Flags::new();
    each_in_parens(lexer, "flag list", |lexer, token| {
        match token {
            Token::Atom(name) => flags.insert(Flag::parse(name)),
            Token::Asterisk => flags.insert(Flag::Keyword("*".to_string())),
            token => return Err(unexpected(lexer, "flag list", &token)),
        }
        Ok(())
    })?;
    Ok(flags)
}

/// `(attrs) delimiter name`.
pub(super) fn list_data(lexer: &mut Lexer<'_>) -> Result<ListResponse> {
    let mut attributes = Vec::new();
    each_in_parens(lexer, "LIST attributes", |lexer, token| match token {
        Token::Atom(name) => {
            attributes.push(MailboxAttribute::parse(name));
            Ok(())
        }
        token => Err(unexpected(lexer, "LIST attributes", &token)),
    })?;

    lexer.expect_space()?;
    let delimiter = match lexer.next_token()? {
        Token::QuotedString(text) => text.chars().next(),
        Token::Nil => None,
        token => return Err(unexpected(lexer, "LIST delimiter", &token)),
    };
    lexer.expect_space()?;
    let name = lexer.read_astring()?;

    Ok(ListResponse {
        attributes,
        delimiter,
        mailbox: Mailbox::new(name),
    })
}

/// `name (ITEM n ITEM n)`. Counters this client never requests are skipped,
/// as are zero UIDNEXT/UIDVALIDITY values.
pub(super) fn status_data(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<StatusItem>)> {
    let mailbox = Mailbox::new(lexer.read_astring()?);
    lexer.expect_space()?;

    let mut items = Vec::new();
    each_in_parens(lexer, "STATUS", |lexer, token| {
        let Token::Atom(name) = token else {
            return Err(unexpected(lexer, "STATUS", &token));
        };
        lexer.expect_space()?;
        let n = lexer.read_number()?;
        let item = match name.to_ascii_uppercase().as_str() {
            "MESSAGES" => Some(StatusItem::Messages(n)),
            "RECENT" => Some(StatusItem::Recent(n)),
            "UNSEEN" => Some(StatusItem::Unseen(n)),
            "UIDNEXT" => Uid::new(n).map(StatusItem::UidNext),
            "UIDVALIDITY" => UidValidity::new(n).map(StatusItem::UidValidity),
            _ => None,
        };
        items.extend(item);
        Ok(())
    })?;

    Ok((mailbox, items))
}
