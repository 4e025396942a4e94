//! Capabilities announced by the server.

/// One `CAPABILITY` atom, with the ones the client acts on broken out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1`
    Imap4Rev1,
    /// `IMAP4rev2`
    Imap4Rev2,
    /// `UIDPLUS` (RFC 4315): `UID EXPUNGE` is available.
    UidPlus,
    /// `STARTTLS`
    StartTls,
    /// `LOGINDISABLED`: plaintext LOGIN is refused.
    LoginDisabled,
    /// `SPECIAL-USE` (RFC 6154)
    SpecialUse,
    /// `AUTH=<mechanism>`, mechanism upper-cased.
    Auth(String),
    /// Anything else, as sent.
    Other(String),
}

impl Capability {
    /// Classifies a capability atom, ignoring case.
    #[must_use]
    pub fn parse(atom: &str) -> Self {
        const KNOWN: [(&str, Capability); 6] = [
            ("IMAP4REV1", Capability::Imap4Rev1),
            ("IMAP4REV2", Capability::Imap4Rev2),
            ("UIDPLUS", Capability::UidPlus),
            ("STARTTLS", Capability::StartTls),
            ("LOGINDISABLED", Capability::LoginDisabled),
            ("SPECIAL-USE", Capability::SpecialUse),
        ];

        let upper = atom.to_ascii_uppercase();
        if let Some(mechanism) = upper.strip_prefix("AUTH=") {
            return Self::Auth(mechanism.to_string());
        }
        KNOWN
            .into_iter()
            .find_map(|(name, cap)| (name == upper).then_some(cap))
            .unwrap_or_else(|| Self::Other(atom.to_string()))
    }
}
