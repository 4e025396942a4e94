//! Core IMAP types.
//!
//! Identifiers, flags, mailbox data, capabilities, response codes and UID
//! sets shared by the command serializer, the parser and the client.

mod capability;
mod condition;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::Capability;
pub use condition::{Condition, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{SeqNum, Tag, Uid, UidValidity};
pub use mailbox::{ListResponse, Mailbox, MailboxAttribute, MailboxStatus};
pub use response_code::ResponseCode;
pub use sequence::UidSet;
