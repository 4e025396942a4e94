//! Rendering a whole message: selected headers plus flattened body.

use std::fmt;

use mailparse::MailHeaderMap;

use crate::error::{Error, Result};
use crate::headers::address_list;
use crate::render::render;
use crate::tree::{AttachmentRef, MimeNode};

/// A message decoded for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageBody {
    /// Decoded `Subject`.
    pub subject: Option<String>,
    /// `From` addresses, formatted.
    pub from: Vec<String>,
    /// `To` addresses, formatted.
    pub to: Vec<String>,
    /// `Cc` addresses, formatted.
    pub cc: Vec<String>,
    /// `Date` header as sent.
    pub date: Option<String>,
    /// Flattened body text, with attachment placeholders.
    pub text: String,
    /// Attachments referenced by the placeholders.
    pub attachments: Vec<AttachmentRef>,
}

/// Parses and flattens a raw message.
///
/// # Errors
///
/// Returns [`Error::Empty`] for empty input and [`Error::Malformed`] when
/// the MIME structure or a part's transfer encoding is broken.
pub fn render_message(raw: &[u8]) -> Result<MessageBody> {
    if raw.is_empty() {
        return Err(Error::Empty);
    }
    let parsed = mailparse::parse_mail(raw)?;
    let tree = MimeNode::from_parsed(&parsed, 0)?;
    let headers = &parsed.headers;

    Ok(MessageBody {
        subject: headers.get_first_value("Subject"),
        from: address_list(headers, "From"),
        to: address_list(headers, "To"),
        cc: address_list(headers, "Cc"),
        date: headers.get_first_value("Date"),
        text: render(&tree),
        attachments: tree.attachments().into_iter().cloned().collect(),
    })
}

impl fmt::Display for MessageBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.from.is_empty() {
            writeln!(f, "From: {}", self.from.join(", "))?;
        }
        if !self.to.is_empty() {
            writeln!(f, "To: {}", self.to.join(", "))?;
        }
        if !self.cc.is_empty() {
            writeln!(f, "Cc: {}", self.cc.join(", "))?;
        }
        if let Some(date) = &self.date {
            writeln!(f, "Date: {date}")?;
        }
        if let Some(subject) = &self.subject {
            writeln!(f, "Subject: {subject}")?;
        }
        writeln!(f)?;
        f.write_str(&self.text)
    }
}
