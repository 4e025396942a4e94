//! Mailbox names, LIST entries and SELECT results.

use std::fmt;

use super::{Flags, Uid, UidValidity};

/// A mailbox name as used on the wire.
///
/// Any capitalisation of `INBOX` denotes the same mailbox and is stored
/// as `INBOX`; other names are case-sensitive and kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(String);

impl Mailbox {
    /// Wraps `name`, folding INBOX.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.eq_ignore_ascii_case("INBOX") {
            return Self::inbox();
        }
        Self(name)
    }

    /// `INBOX`
    #[must_use]
    pub fn inbox() -> Self {
        Self(String::from("INBOX"))
    }

    /// Whether this is the INBOX.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.0 == "INBOX"
    }

    /// The name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What SELECT reported about the opened mailbox.
#[derive(Debug, Clone, Default)]
pub struct MailboxStatus {
    /// `EXISTS`, kept current by EXPUNGE and EXISTS updates.
    pub exists: u32,
    /// `RECENT`
    pub recent: u32,
    /// `[UIDNEXT n]`
    pub uid_next: Option<Uid>,
    /// `[UIDVALIDITY n]`; without it UIDs cannot be trusted across sessions.
    pub uid_validity: Option<UidValidity>,
    /// `FLAGS`
    pub flags: Flags,
    /// `[READ-ONLY]` on the completion.
    pub read_only: bool,
}

/// One `* LIST` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Name attributes, in server order.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter; `None` for a flat namespace.
    pub delimiter: Option<char>,
    /// The mailbox.
    pub mailbox: Mailbox,
}

impl ListResponse {
    /// False for `\Noselect` containers and `\NonExistent` placeholders.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.attributes
            .iter()
            .all(|a| !matches!(a, MailboxAttribute::NoSelect | MailboxAttribute::NonExistent))
    }
}

/// A LIST name attribute (RFC 3501, RFC 5258 and RFC 6154 special use).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// `\Noselect`
    NoSelect,
    /// `\NonExistent`
    NonExistent,
    /// `\HasNoChildren`
    HasNoChildren,
    /// `\HasChildren`
    HasChildren,
    /// `\Marked`
    Marked,
    /// `\Unmarked`
    Unmarked,
    /// `\All`
    All,
    /// `\Archive`
    Archive,
    /// `\Drafts`
    Drafts,
    /// `\Flagged`
    Flagged,
    /// `\Junk`, or the older `\Spam`.
    Junk,
    /// `\Sent`
    Sent,
    /// `\Trash`
    Trash,
    /// Anything else, as sent.
    Unknown(String),
}

impl MailboxAttribute {
    /// Classifies an attribute atom, ignoring case.
    #[must_use]
    pub fn parse(atom: &str) -> Self {
        let Some(name) = atom.strip_prefix('\\') else {
            return Self::Unknown(atom.to_string());
        };
        match name.to_ascii_lowercase().as_str() {
            "noselect" => Self::NoSelect,
            "nonexistent" => Self::NonExistent,
            "hasnochildren" => Self::HasNoChildren,
            "haschildren" => Self::HasChildren,
            "marked" => Self::Marked,
            "unmarked" => Self::Unmarked,
            "all" => Self::All,
            "archive" => Self::Archive,
            "drafts" => Self::Drafts,
            "flagged" => Self::Flagged,
            "junk" | "spam" => Self::Junk,
            "sent" => Self::Sent,
            "trash" => Self::Trash,
            _ => Self::Unknown(atom.to_string()),
        }
    }
}
