//! Status conditions: `OK`, `NO`, `BAD`, `PREAUTH`, `BYE`.

use super::ResponseCode;

/// The keyword of a status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success.
    Ok,
    /// Operational failure; the session is still fine.
    No,
    /// The server did not understand the command.
    Bad,
    /// Greeting for an already authenticated connection.
    PreAuth,
    /// The server is closing the connection.
    Bye,
}

impl Status {
    /// Matches a status keyword, ignoring case.
    #[must_use]
    pub fn parse(keyword: &str) -> Option<Self> {
        [
            ("OK", Self::Ok),
            ("NO", Self::No),
            ("BAD", Self::Bad),
            ("PREAUTH", Self::PreAuth),
            ("BYE", Self::Bye),
        ]
        .into_iter()
        .find_map(|(name, status)| keyword.eq_ignore_ascii_case(name).then_some(status))
    }
}

/// A status keyword with its optional `[code]` and human-readable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// The keyword.
    pub status: Status,
    /// Bracketed response code, if any.
    pub code: Option<ResponseCode>,
    /// Remaining text, possibly empty.
    pub text: String,
}
