//! Flattening a MIME tree into one text.
//!
//! Pure functions over [`MimeNode`]; nothing here touches raw bytes.

use crate::tree::{MimeNode, MultipartKind};

const PART_SEPARATOR: &str = "\n\n";
const FORWARDED_MARKER: &str = "---------- Forwarded message ----------";

/// Renders a MIME tree as text.
///
/// `multipart/alternative` picks its first `text/plain` child, otherwise the
/// first child with renderable content. Other multiparts render every child
/// in order. HTML is converted to Markdown-flavoured text and attachments
/// become one-line placeholders.
#[must_use]
pub fn render(node: &MimeNode) -> String {
    match node {
        MimeNode::Text(text) => normalize_newlines(text),
        MimeNode::Html(html) => html_to_text(html),
        MimeNode::Attachment(attachment) => attachment.to_string(),
        MimeNode::Multipart {
            kind: MultipartKind::Alternative,
            parts,
        } => match preferred_alternative(parts) {
            Some(choice) => render(choice),
            None => join(parts),
        },
        MimeNode::Multipart {
            kind: MultipartKind::Mixed(_),
            parts,
        } => join(parts),
        MimeNode::Message(inner) => format!("{FORWARDED_MARKER}\n{}", render(inner)),
    }
}

fn preferred_alternative(parts: &[MimeNode]) -> Option<&MimeNode> {
    parts
        .iter()
        .find(|p| matches!(p, MimeNode::Text(_)))
        .or_else(|| parts.iter().find(|p| p.is_renderable()))
}

fn join(parts: &[MimeNode]) -> String {
    parts
        .iter()
        .map(render)
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR)
}

fn html_to_text(html: &str) -> String {
    match htmd::convert(html) {
        Ok(text) => text.trim().to_string(),
        Err(error) => {
            tracing::debug!(%error, "HTML conversion failed, showing markup");
            normalize_newlines(html)
        }
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").trim_end().to_string()
}
