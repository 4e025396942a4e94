//! The MIME structure of a message as a recursive variant type.

use mailparse::{DispositionType, ParsedMail};

use crate::error::{Error, Result};

/// Deepest nesting of multiparts and embedded messages we follow.
const MAX_DEPTH: usize = 32;

/// One node of a decoded MIME tree.
///
/// Leaf bodies are already transfer-decoded and converted from their
/// declared charset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeNode {
    /// A `text/*` part other than HTML.
    Text(String),
    /// A `text/html` part.
    Html(String),
    /// A part that is not shown inline.
    Attachment(AttachmentRef),
    /// A `multipart/*` container.
    Multipart {
        /// The multipart subtype.
        kind: MultipartKind,
        /// Child parts, in message order.
        parts: Vec<MimeNode>,
    },
    /// An embedded `message/rfc822`.
    Message(Box<MimeNode>),
}

/// Multipart subtypes that flatten differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartKind {
    /// `multipart/alternative`: children are renditions of the same content.
    Alternative,
    /// `multipart/mixed`, `multipart/related` and anything unknown.
    Mixed(String),
}

/// Placeholder for a part that is referenced rather than rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttachmentRef {
    /// File name from `Content-Disposition` or the `name` parameter.
    pub filename: Option<String>,
    /// Lower-cased MIME type.
    pub content_type: String,
    /// Decoded size in bytes.
    pub size: usize,
}

impl std::fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[attachment: {} ({}, {} bytes)]",
            self.filename.as_deref().unwrap_or("unnamed"),
            self.content_type,
            self.size
        )
    }
}

impl MimeNode {
    /// Parses a raw message into a tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is empty, a part cannot be decoded,
    /// or nesting is unreasonably deep.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::Empty);
        }
        let parsed = mailparse::parse_mail(raw)?;
        Self::from_parsed(&parsed, 0)
    }

    /// Builds a tree from an already parsed message.
    ///
    /// # Errors
    ///
    /// Returns an error if a part's body cannot be decoded.
    pub fn from_parsed(part: &ParsedMail<'_>, depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep(MAX_DEPTH));
        }

        let mimetype = part.ctype.mimetype.to_ascii_lowercase();

        if let Some(subtype) = mimetype.strip_prefix("multipart/") {
            let kind = if subtype == "alternative" {
                MultipartKind::Alternative
            } else {
                MultipartKind::Mixed(subtype.to_string())
            };
            let parts = part
                .subparts
                .iter()
                .map(|child| Self::from_parsed(child, depth + 1))
                .collect::<Result<Vec<_>>>()?;
            return Ok(Self::Multipart { kind, parts });
        }

        let disposition = part.get_content_disposition();
        let filename = disposition
            .params
            .get("filename")
            .or_else(|| part.ctype.params.get("name"))
            .cloned();

        if matches!(disposition.disposition, DispositionType::Attachment) || filename.is_some() {
            return Self::attachment(part, filename, mimetype);
        }

        match mimetype.as_str() {
            "message/rfc822" => {
                let inner = part.get_body_raw()?;
                let parsed = mailparse::parse_mail(&inner)?;
                Ok(Self::Message(Box::new(Self::from_parsed(&parsed, depth + 1)?)))
            }
            "text/html" => Ok(Self::Html(part.get_body()?)),
            t if t.starts_with("text/") => Ok(Self::Text(part.get_body()?)),
            _ => Self::attachment(part, None, mimetype),
        }
    }

    fn attachment(
        part: &ParsedMail<'_>,
        filename: Option<String>,
        content_type: String,
    ) -> Result<Self> {
        let size = part.get_body_raw()?.len();
        Ok(Self::Attachment(AttachmentRef {
            filename,
            content_type,
            size,
        }))
    }

    /// Returns true if the node has content that can be shown as text.
    #[must_use]
    pub fn is_renderable(&self) -> bool {
        match self {
            Self::Text(_) | Self::Html(_) | Self::Message(_) => true,
            Self::Attachment(_) => false,
            Self::Multipart { parts, .. } => parts.iter().any(Self::is_renderable),
        }
    }

    /// Collects every attachment in the tree, depth first.
    #[must_use]
    pub fn attachments(&self) -> Vec<&AttachmentRef> {
        let mut found = Vec::new();
        self.collect_attachments(&mut found);
        found
    }

    fn collect_attachments<'a>(&'a self, out: &mut Vec<&'a AttachmentRef>) {
        match self {
            Self::Attachment(attachment) => out.push(attachment),
            Self::Multipart { parts, .. } => {
                for part in parts {
                    part.collect_attachments(out);
                }
            }
            Self::Message(inner) => inner.collect_attachments(out),
            Self::Text(_) | Self::Html(_) => {}
        }
    }
}
