//! UID sets (`sequence-set` in UID commands).

use std::fmt;

use super::Uid;

/// The message set argument of `UID FETCH`, `UID STORE` and `UID EXPUNGE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// `n`
    Single(Uid),
    /// `a:b`, inclusive in either order.
    Range(Uid, Uid),
    /// `a:*`, up to the highest UID in use.
    RangeFrom(Uid),
    /// Comma-separated union.
    Set(Vec<Self>),
}

impl UidSet {
    /// `1:*`, every message.
    #[must_use]
    pub const fn all() -> Self {
        Self::RangeFrom(Uid::min())
    }
}

impl From<Uid> for UidSet {
    fn from(uid: Uid) -> Self {
        Self::Single(uid)
    }
}

impl fmt::Display for UidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(uid) => write!(f, "{uid}"),
            Self::Range(first, last) => write!(f, "{first}:{last}"),
            Self::RangeFrom(first) => write!(f, "{first}:*"),
            Self::Set(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    #[test]
    fn wire_forms() {
        assert_eq!(UidSet::all().to_string(), "1:*");
        assert_eq!(UidSet::from(uid(42)).to_string(), "42");
        assert_eq!(UidSet::Range(uid(9), uid(3)).to_string(), "9:3");
        let union = UidSet::Set(vec![uid(1).into(), UidSet::Range(uid(5), uid(7)), UidSet::RangeFrom(uid(20))]);
        assert_eq!(union.to_string(), "1,5:7,20:*");
    }
}
