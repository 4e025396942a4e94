//! Numeric identifiers and command tags.

use std::fmt;
use std::num::NonZeroU32;

/// Defines a non-zero 32-bit protocol number.
macro_rules! nonzero_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wraps `n`; zero is not a valid value on the wire.
            #[must_use]
            pub const fn new(n: u32) -> Option<Self> {
                match NonZeroU32::new(n) {
                    Some(n) => Some(Self(n)),
                    None => None,
                }
            }

            /// Numeric value.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

nonzero_id! {
    /// Position of a message in the selected mailbox.
    ///
    /// Positions shift whenever an earlier message is expunged, so they are
    /// only meaningful within a single response.
    SeqNum
}

nonzero_id! {
    /// Unique identifier of a message within a mailbox.
    ///
    /// Assigned in ascending arrival order and stable for as long as the
    /// mailbox keeps its [`UidValidity`].
    Uid
}

nonzero_id! {
    /// Epoch of a mailbox's UID numbering. A new value invalidates every
    /// UID seen before.
    UidValidity
}

impl Uid {
    /// UID 1, the start of `1:*`.
    #[must_use]
    pub const fn min() -> Self {
        Self(NonZeroU32::MIN)
    }
}

/// Correlates a command with its tagged completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Wraps a tag string.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
