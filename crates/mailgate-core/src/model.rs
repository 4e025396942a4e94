//! Domain models returned by the access layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use mailgate_imap::{Flag, Flags, MailboxAttribute, Uid, UidValidity};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

pub use mailgate_mime::{AttachmentRef, MessageBody};

/// Caller-visible message id.
///
/// Packs the mailbox's UIDVALIDITY epoch into the high 32 bits and the
/// message UID into the low 32 bits. The mapping is pure and reversible, so
/// two listings of an unchanged mailbox produce identical ids, and an id
/// from an older epoch never resolves to a different message after the store
/// renumbers the mailbox. Sequence numbers never enter the id.
///
/// Serialized as a decimal string: real ids exceed 2^53, which JSON
/// numbers read as doubles cannot hold exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(u64);

impl MessageId {
    /// Derives the id for `uid` in a mailbox at `validity`.
    #[must_use]
    pub const fn new(validity: UidValidity, uid: Uid) -> Self {
        Self(((validity.get() as u64) << 32) | uid.get() as u64)
    }

    /// Wraps a raw id as received from a caller.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the UID half, or `None` if it is zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn uid(self) -> Option<Uid> {
        Uid::new(self.0 as u32)
    }

    /// Returns the UIDVALIDITY half, or `None` if it is zero.
    #[must_use]
    pub fn uid_validity(self) -> Option<UidValidity> {
        UidValidity::new((self.0 >> 32) as u32)
    }

    /// Returns the UID if this id belongs to the `current` epoch.
    #[must_use]
    pub fn resolve(self, current: UidValidity) -> Option<Uid> {
        (self.uid_validity()? == current).then_some(self.uid()?)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl Serialize for MessageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse()
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&text), &"a decimal message id"))
    }
}

/// Special-use role of a mailbox (RFC 6154), plus INBOX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecialUse {
    /// The INBOX.
    Inbox,
    /// Virtual mailbox with every message.
    All,
    /// Archive.
    Archive,
    /// Drafts.
    Drafts,
    /// Virtual mailbox with flagged messages.
    Flagged,
    /// Junk/spam.
    Junk,
    /// Sent mail.
    Sent,
    /// Trash.
    Trash,
}

impl SpecialUse {
    /// Picks the role from LIST attributes, or INBOX by name.
    #[must_use]
    pub fn detect(name: &mailgate_imap::Mailbox, attributes: &[MailboxAttribute]) -> Option<Self> {
        if name.is_inbox() {
            return Some(Self::Inbox);
        }
        attributes.iter().find_map(|attr| match attr {
            MailboxAttribute::All => Some(Self::All),
            MailboxAttribute::Archive => Some(Self::Archive),
            MailboxAttribute::Drafts => Some(Self::Drafts),
            MailboxAttribute::Flagged => Some(Self::Flagged),
            MailboxAttribute::Junk => Some(Self::Junk),
            MailboxAttribute::Sent => Some(Self::Sent),
            MailboxAttribute::Trash => Some(Self::Trash),
            _ => None,
        })
    }
}

/// A mailbox as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    /// Full hierarchical name.
    pub name: String,
    /// Hierarchy delimiter, if the store uses one.
    pub delimiter: Option<char>,
    /// Number of messages.
    pub messages: u32,
    /// Number of messages without `\Seen`.
    pub unseen: u32,
    /// Whether the mailbox can be opened.
    pub selectable: bool,
    /// Special-use role.
    pub role: Option<SpecialUse>,
}

/// Message flags, with system flags broken out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFlags {
    /// `\Seen`.
    pub seen: bool,
    /// `\Answered`.
    pub answered: bool,
    /// `\Flagged`.
    pub flagged: bool,
    /// `\Deleted`.
    pub deleted: bool,
    /// `\Draft`.
    pub draft: bool,
    /// Keywords such as `$Forwarded`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl From<&Flags> for MessageFlags {
    fn from(flags: &Flags) -> Self {
        let mut out = Self::default();
        for flag in flags {
            match flag {
                Flag::Seen => out.seen = true,
                Flag::Answered => out.answered = true,
                Flag::Flagged => out.flagged = true,
                Flag::Deleted => out.deleted = true,
                Flag::Draft => out.draft = true,
                Flag::Recent => {}
                Flag::Keyword(keyword) => out.keywords.push(keyword.clone()),
            }
        }
        out
    }
}

/// One entry of a mailbox listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    /// Stable id, see [`MessageId`].
    pub id: MessageId,
    /// First `From` address as `Name <address>`.
    pub from: Option<String>,
    /// Decoded subject.
    pub subject: Option<String>,
    /// `Date` header as sent.
    pub date: Option<String>,
    /// When the store received the message (INTERNALDATE).
    pub received: Option<DateTime<FixedOffset>>,
    /// Flags.
    pub flags: MessageFlags,
    /// Size in octets (RFC822.SIZE).
    pub size: Option<u32>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    fn validity(n: u32) -> UidValidity {
        UidValidity::new(n).unwrap()
    }

    #[test]
    fn id_layout() {
        let id = MessageId::new(validity(1), uid(5));
        assert_eq!(id.get(), (1 << 32) | 5);
        assert_eq!(id.to_string(), "4294967301");
        assert_eq!("4294967301".parse::<MessageId>().unwrap(), id);
    }

    #[test]
    fn id_from_other_epoch_does_not_resolve() {
        let id = MessageId::new(validity(1), uid(5));
        assert_eq!(id.resolve(validity(1)), Some(uid(5)));
        assert_eq!(id.resolve(validity(2)), None);
    }

    #[test]
    fn ids_with_zero_halves_do_not_resolve() {
        assert_eq!(MessageId::from_raw(1).resolve(validity(1)), None);
        assert_eq!(MessageId::from_raw(1 << 32).resolve(validity(1)), None);
    }

    #[test]
    fn flags_are_broken_out() {
        let flags: Flags = [Flag::Seen, Flag::Deleted, Flag::Keyword("$Work".into())]
            .into_iter()
            .collect();
        let flags = MessageFlags::from(&flags);
        assert!(flags.seen && flags.deleted);
        assert!(!flags.flagged);
        assert_eq!(flags.keywords, vec!["$Work".to_string()]);
    }

    #[test]
    fn special_use_detection() {
        let inbox = mailgate_imap::Mailbox::new("inbox");
        assert_eq!(SpecialUse::detect(&inbox, &[]), Some(SpecialUse::Inbox));

        let sent = mailgate_imap::Mailbox::new("Sent Items");
        let attrs = [MailboxAttribute::HasNoChildren, MailboxAttribute::Sent];
        assert_eq!(SpecialUse::detect(&sent, &attrs), Some(SpecialUse::Sent));
        assert_eq!(SpecialUse::detect(&sent, &attrs[..1]), None);
    }

    #[test]
    fn id_survives_json_exactly() {
        let id = MessageId::new(validity(1_700_000_000), uid(5));
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"7301444403200000005\"");

        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.resolve(validity(1_700_000_000)), Some(uid(5)));
    }

    #[test]
    fn id_rejects_numbers_and_junk() {
        assert!(serde_json::from_str::<MessageId>("7301444403200000005").is_err());
        assert!(serde_json::from_str::<MessageId>("\"12ab\"").is_err());
    }

    proptest! {
        #[test]
        fn id_round_trips(v in 1u32.., u in 1u32..) {
            let id = MessageId::new(validity(v), uid(u));
            prop_assert_eq!(id.uid_validity(), Some(validity(v)));
            prop_assert_eq!(id.resolve(validity(v)), Some(uid(u)));
        }

        #[test]
        fn distinct_uids_give_distinct_ids(v in 1u32.., a in 1u32.., b in 1u32..) {
            prop_assume!(a != b);
            prop_assert_ne!(
                MessageId::new(validity(v), uid(a)),
                MessageId::new(validity(v), uid(b))
            );
        }
    }
}
