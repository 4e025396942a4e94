//! Structured server data.

use crate::types::{Capability, Condition, Flags, ListResponse, Mailbox, SeqNum, Uid, UidValidity};

/// One data item of a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// `UID`
    Uid(Uid),
    /// `FLAGS`
    Flags(Flags),
    /// `INTERNALDATE`, unparsed (`dd-Mon-yyyy hh:mm:ss +zzzz`).
    InternalDate(String),
    /// `RFC822.SIZE`
    Rfc822Size(u32),
    /// `ENVELOPE`
    Envelope(Box<Envelope>),
    /// `BODY[<section>]`; `data` is `None` when the server sent `NIL`.
    Body {
        /// Text between the brackets, empty for `BODY[]`; `None` for `RFC822`.
        section: Option<String>,
        /// Raw bytes.
        data: Option<Vec<u8>>,
    },
}

/// The ENVELOPE structure. Header values are still RFC 2047 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// `Date:`
    pub date: Option<String>,
    /// `Subject:`
    pub subject: Option<String>,
    /// `From:`
    pub from: Vec<Address>,
    /// `Sender:`
    pub sender: Vec<Address>,
    /// `Reply-To:`
    pub reply_to: Vec<Address>,
    /// `To:`
    pub to: Vec<Address>,
    /// `Cc:`
    pub cc: Vec<Address>,
    /// `Bcc:`
    pub bcc: Vec<Address>,
    /// `In-Reply-To:`
    pub in_reply_to: Option<String>,
    /// `Message-ID:`
    pub message_id: Option<String>,
}

/// An envelope address: `(name adl mailbox host)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name, still RFC 2047 encoded.
    pub name: Option<String>,
    /// Obsolete source route.
    pub adl: Option<String>,
    /// Local part.
    pub mailbox: Option<String>,
    /// Domain; `None` marks a group delimiter.
    pub host: Option<String>,
}

impl Address {
    /// `mailbox@host`, or `None` for group markers.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        let (Some(local), Some(host)) = (&self.mailbox, &self.host) else {
            return None;
        };
        Some(format!("{local}@{host}"))
    }
}

/// One counter of a STATUS response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusItem {
    /// `MESSAGES`
    Messages(u32),
    /// `RECENT`
    Recent(u32),
    /// `UIDNEXT`
    UidNext(Uid),
    /// `UIDVALIDITY`
    UidValidity(UidValidity),
    /// `UNSEEN`
    Unseen(u32),
}

/// Server data not tied to a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK|NO|BAD|PREAUTH|BYE ...`
    Condition(Condition),
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* LIST ...`
    List(ListResponse),
    /// `* FLAGS (...)`
    Flags(Flags),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`; later sequence numbers shift down by one.
    Expunge(SeqNum),
    /// `* n FETCH (...)`
    Fetch {
        /// Sequence number at the time of the response.
        seq: SeqNum,
        /// Data items in server order.
        items: Vec<FetchItem>,
    },
    /// `* STATUS mailbox (...)`
    Status {
        /// The mailbox the counters describe.
        mailbox: Mailbox,
        /// Counters in server order.
        items: Vec<StatusItem>,
    },
    /// Data this client never asks for (`* ENABLED`, `* ID`, ...).
    Other {
        /// Keyword, upper-cased.
        keyword: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(mailbox: Option<&str>, host: Option<&str>) -> Address {
        Address {
            name: None,
            adl: None,
            mailbox: mailbox.map(str::to_string),
            host: host.map(str::to_string),
        }
    }

    #[test]
    fn email_needs_both_parts() {
        assert_eq!(
            address(Some("bob"), Some("example.net")).email().as_deref(),
            Some("bob@example.net")
        );
        assert_eq!(address(Some("team"), None).email(), None);
        assert_eq!(address(None, None).email(), None);
    }
}
