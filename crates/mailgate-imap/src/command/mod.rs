//! Client commands.
//!
//! Commands are plain values; [`Command::serialize`] renders one with its
//! tag into the bytes written to the wire.

mod serialize;
mod tag_generator;

use crate::types::{Flag, Mailbox, UidSet};

pub use tag_generator::TagGenerator;

use serialize::Line;

/// A command this client can send, grouped by the state it is valid in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Any state
    /// `CAPABILITY`
    Capability,
    /// `LOGOUT`
    Logout,

    // Not authenticated
    /// `STARTTLS`
    StartTls,
    /// `LOGIN user pass`
    Login {
        /// Account name.
        username: String,
        /// Secret; never logged.
        password: String,
    },

    // Authenticated
    /// `SELECT mailbox`
    Select {
        /// Mailbox to open.
        mailbox: Mailbox,
    },
    /// `LIST reference pattern`
    List {
        /// Prefix the pattern is relative to; usually empty.
        reference: String,
        /// Mailbox pattern with `*` / `%` wildcards.
        pattern: String,
    },
    /// `STATUS mailbox (items)`
    Status {
        /// Mailbox to query.
        mailbox: Mailbox,
        /// Requested status items.
        items: Vec<StatusAttribute>,
    },

    // Selected
    /// `EXPUNGE`: removes every `\Deleted` message.
    Expunge,
    /// UID EXPUNGE command (UIDPLUS).
    UidExpunge {
        /// Only these are removed, whatever else is `\Deleted`.
        uids: UidSet,
    },
    /// UID FETCH command.
    UidFetch {
        /// UIDs to fetch.
        uids: UidSet,
        /// Data items to fetch.
        items: Vec<FetchAttribute>,
    },
    /// UID STORE command.
    UidStore {
        /// UIDs to modify.
        uids: UidSet,
        /// How to apply the flags.
        action: StoreAction,
        /// Flags to apply.
        flags: Vec<Flag>,
        /// Suppress the untagged FETCH echo (`.SILENT`).
        silent: bool,
    },
}

impl Command {
    /// Renders the command line for `tag`, CRLF included.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut line = Line::start(tag);
        line.raw(self.name());
        match self {
            Self::Capability | Self::Logout | Self::StartTls | Self::Expunge => {}
            Self::Login { username, password } => {
                line.astring(username).astring(password);
            }
            Self::Select { mailbox } => {
                line.astring(mailbox.as_str());
            }
            Self::List { reference, pattern } => {
                line.astring(reference).astring(pattern);
            }
            Self::Status { mailbox, items } => {
                line.astring(mailbox.as_str())
                    .list(items.iter().map(|item| item.as_str()));
            }
            Self::UidExpunge { uids } => {
                line.arg(uids);
            }
            Self::UidFetch { uids, items } => {
                line.arg(uids).list(items);
            }
            Self::UidStore {
                uids,
                action,
                flags,
                silent,
            } => {
                line.arg(uids).arg(action.as_str());
                if *silent {
                    line.raw(".SILENT");
                }
                line.list(flags.iter().map(Flag::as_str));
            }
        }
        line.finish()
    }

    /// Returns the command name for logging, never including arguments.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Logout => "LOGOUT",
            Self::StartTls => "STARTTLS",
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::List { .. } => "LIST",
            Self::Status { .. } => "STATUS",
            Self::Expunge => "EXPUNGE",
            Self::UidExpunge { .. } => "UID EXPUNGE",
            Self::UidFetch { .. } => "UID FETCH",
            Self::UidStore { .. } => "UID STORE",
        }
    }
}

/// FETCH data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `UID`
    Uid,
    /// `FLAGS`
    Flags,
    /// `INTERNALDATE`
    InternalDate,
    /// `RFC822.SIZE`
    Rfc822Size,
    /// `ENVELOPE`
    Envelope,
    /// `BODY.PEEK[section]`, which leaves `\Seen` untouched.
    BodyPeek {
        /// Section specifier; `None` fetches the whole message.
        section: Option<String>,
    },
}

impl std::fmt::Display for FetchAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uid => f.write_str("UID"),
            Self::Flags => f.write_str("FLAGS"),
            Self::InternalDate => f.write_str("INTERNALDATE"),
            Self::Rfc822Size => f.write_str("RFC822.SIZE"),
            Self::Envelope => f.write_str("ENVELOPE"),
            Self::BodyPeek { section } => {
                write!(f, "BODY.PEEK[{}]", section.as_deref().unwrap_or_default())
            }
        }
    }
}

/// STATUS data item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAttribute {
    /// Message count.
    Messages,
    /// Number of messages without `\Seen`.
    Unseen,
    /// UID the next arrival will get.
    UidNext,
    /// UID epoch.
    UidValidity,
}

impl StatusAttribute {
    /// Wire form of the attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Unseen => "UNSEEN",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
        }
    }
}

/// How a STORE applies its flag list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    /// Replace the flags (`FLAGS`).
    Set,
    /// Add to the flags (`+FLAGS`).
    Add,
    /// Remove from the flags (`-FLAGS`).
    Remove,
}

impl StoreAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Set => "FLAGS",
            Self::Add => "+FLAGS",
            Self::Remove => "-FLAGS",
        }
    }
}
