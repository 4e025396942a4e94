//! Error types for MIME decoding.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The message or one of its parts could not be parsed or decoded.
    #[error("Malformed MIME: {0}")]
    Malformed(#[from] mailparse::MailParseError),

    /// Nothing to decode.
    #[error("Message is empty")]
    Empty,

    /// Embedded messages nest deeper than we are willing to follow.
    #[error("Message nesting exceeds {0} levels")]
    TooDeep(usize),
}
