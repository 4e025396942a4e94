//! Response codes carried in `[...]` brackets of status responses.

use super::{Capability, Flags, Uid, UidValidity};

/// Response code (RFC 3501 section 7.1, RFC 5530).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// Human-readable alert that must be shown to the user.
    Alert,
    /// Capability list piggybacked on a status response.
    Capability(Vec<Capability>),
    /// Flags the client can change permanently.
    PermanentFlags(Flags),
    /// Mailbox was selected read-only.
    ReadOnly,
    /// Mailbox was selected read-write.
    ReadWrite,
    /// Target mailbox does not exist but could be created.
    TryCreate,
    /// Next UID to be assigned.
    UidNext(Uid),
    /// Mailbox UIDVALIDITY.
    UidValidity(UidValidity),
    /// First unseen sequence number.
    Unseen(u32),
    /// The referenced mailbox does not exist (RFC 5530).
    NonExistent,
    /// Any other code, kept verbatim.
    Unknown(String),
}
