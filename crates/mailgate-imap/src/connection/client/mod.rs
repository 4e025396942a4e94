//! Type-state IMAP client connection.
//!
//! Uses the type-state pattern to enforce valid state transitions at compile time.
//! The IMAP connection states are:
//!
//! - `NotAuthenticated`: Initial state after connection
//! - `Authenticated`: After successful LOGIN
//! - `Selected`: After successful SELECT
//!
//! Each state only exposes methods that are valid for that state. Transitions
//! consume the client; a transition the server refuses returns the client in
//! the state the server left it in, wrapped in [`Refused`].

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::io;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::selected::FetchedMessage;
pub use self::states::{Authenticated, Authorized, NotAuthenticated, Selected};
use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, Condition, Mailbox, MailboxStatus, ResponseCode, Status};
use crate::{Error, Result};

/// IMAP client connection with type-state.
///
/// The type parameter `State` tracks the connection state at compile time.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.capabilities)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// A state transition the server refused.
///
/// Carries the client in the state the connection is actually in afterwards,
/// so the caller can keep using it or log out cleanly.
#[derive(Debug)]
pub struct Refused<C> {
    /// The client, still usable unless `error` is a transport failure.
    pub client: C,
    /// Why the transition failed.
    pub error: Error,
}

impl<C> Refused<C> {
    /// Drops the client and keeps the error.
    pub fn into_error(self) -> Error {
        self.error
    }
}

/// Shared implementation for all states.
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the server capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Checks if the server has a specific capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Returns true if the server supports UIDPLUS (RFC 4315).
    #[must_use]
    pub fn supports_uidplus(&self) -> bool {
        self.has_capability(&Capability::UidPlus)
    }

    /// Sends a CAPABILITY command and updates the stored capabilities.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        self.execute(&Command::Capability).await?;
        Ok(self.capabilities.clone())
    }

    /// Sends LOGOUT and shuts the transport down.
    ///
    /// A server that closes the socket right after its `BYE` is treated as a
    /// successful logout.
    pub async fn logout(mut self) -> Result<()> {
        match self.execute(&Command::Logout).await {
            Ok(_) => {}
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        }
        match self.stream.shutdown().await {
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }

    /// Sends a command and collects its untagged responses.
    ///
    /// Every response is parsed strictly, so a malformed line fails the
    /// command with [`Error::Parse`] after the tagged completion has been
    /// consumed. Capability updates (untagged or as a response code) are
    /// recorded on the way.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Vec<UntaggedResponse>> {
        let (untagged, _) = self.execute_with_code(command).await?;
        Ok(untagged)
    }

    /// Like [`Self::execute`], also returning the response code of the tagged `OK`.
    pub(crate) async fn execute_with_code(
        &mut self,
        command: &Command,
    ) -> Result<(Vec<UntaggedResponse>, Option<ResponseCode>)> {
        let tag = self.tag_gen.next();
        tracing::trace!(%tag, command = command.name(), "sending command");

        self.stream.write_command(&command.serialize(&tag)).await?;
        let raw = self.stream.read_through(&tag).await?;

        let mut untagged = Vec::with_capacity(raw.len());
        let mut completion = None;

        for bytes in &raw {
            match ResponseParser::parse(bytes)? {
                Response::Untagged(UntaggedResponse::Capability(caps)) => {
                    self.capabilities = caps;
                }
                Response::Untagged(response) => untagged.push(response),
                Response::Tagged { tag: done, condition } if done.as_str() == tag => {
                    completion = Some(condition);
                }
                Response::Tagged { tag: other, .. } => {
                    return Err(Error::Protocol(format!(
                        "completion for unknown tag {other} while waiting for {tag}"
                    )));
                }
                Response::Continuation { .. } => {
                    return Err(Error::Protocol(format!(
                        "unexpected continuation request for {}",
                        command.name()
                    )));
                }
            }
        }

        let Some(Condition { status, code, text }) = completion else {
            return Err(Error::Protocol("missing tagged response".to_string()));
        };

        tracing::trace!(%tag, ?status, "command completed");

        match status {
            Status::Ok => {
                if let Some(ResponseCode::Capability(caps)) = &code {
                    self.capabilities.clone_from(caps);
                }
                Ok((untagged, code))
            }
            Status::No => Err(Error::No { code, text }),
            Status::Bad => Err(Error::Bad(text)),
            Status::Bye => Err(Error::Bye(text)),
            Status::PreAuth => Err(Error::Protocol(format!(
                "PREAUTH completion for {}",
                command.name()
            ))),
        }
    }

    /// Runs SELECT and collects the mailbox status it reports.
    pub(crate) async fn run_select(&mut self, mailbox: &Mailbox) -> Result<MailboxStatus> {
        let command = Command::Select {
            mailbox: mailbox.clone(),
        };
        let (responses, code) = self.execute_with_code(&command).await?;

        let mut status = MailboxStatus::default();
        for response in responses {
            match response {
                UntaggedResponse::Exists(n) => status.exists = n,
                UntaggedResponse::Recent(n) => status.recent = n,
                UntaggedResponse::Flags(flags) => status.flags = flags,
                UntaggedResponse::Condition(Condition {
                    status: Status::Ok,
                    code: Some(code),
                    ..
                }) => match code {
                    ResponseCode::UidValidity(v) => status.uid_validity = Some(v),
                    ResponseCode::UidNext(uid) => status.uid_next = Some(uid),
                    _ => {}
                },
                _ => {}
            }
        }
        status.read_only = matches!(code, Some(ResponseCode::ReadOnly));

        tracing::debug!(
            mailbox = %mailbox,
            exists = status.exists,
            uid_validity = ?status.uid_validity,
            "mailbox selected"
        );

        Ok(status)
    }

    /// Moves the connection into another state, keeping the session data.
    pub(crate) fn into_state<Next>(self, state: Next) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            state,
        }
    }
}
