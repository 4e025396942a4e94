//! Connection states carried in the client's type.
//!
//! `NotAuthenticated` and `Authenticated` are plain markers. `Selected`
//! carries the mailbox it was opened for and the status SELECT reported.

use crate::types::{Mailbox, MailboxStatus, UidValidity};

/// Greeted but not logged in.
///
/// Only STARTTLS and LOGIN apply here.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in, no mailbox open.
///
/// LIST, STATUS and SELECT apply here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// States in which mailbox-level commands (LIST, STATUS) are valid.
///
/// Sealed: implemented for [`Authenticated`] and [`Selected`] only.
pub trait Authorized: sealed::Sealed {}

impl Authorized for Authenticated {}
impl Authorized for Selected {}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Authenticated {}
    impl Sealed for super::Selected {}
}

/// A mailbox is open.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: Mailbox,
    pub(crate) status: MailboxStatus,
}

impl Selected {
    /// State for `mailbox` as SELECT described it.
    #[must_use]
    pub const fn new(mailbox: Mailbox, status: MailboxStatus) -> Self {
        Self { mailbox, status }
    }

    /// Returns the selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Returns the mailbox status, kept current with EXISTS/EXPUNGE updates.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.status
    }

    /// Current message count.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.status.exists
    }

    /// Returns the UIDVALIDITY the server reported on SELECT.
    #[must_use]
    pub const fn uid_validity(&self) -> Option<UidValidity> {
        self.status.uid_validity
    }
}
