//! Session manager: one authenticated connection per operation.
//!
//! A [`Session`] wraps the type-state client in a runtime state machine:
//!
//! ```text
//! Disconnected ─→ Connecting ─→ Authenticated ⇄ SelectedMailbox
//!                      │              │               │
//!                      └──────────────┴───────────────┴──→ Closed
//! ```
//!
//! [`with_session`] guarantees the last transition on every exit path.
//! Each exchange runs under its own deadline and is preceded by a
//! cancellation check.

use std::future::Future;
use std::mem;
use std::time::Duration;

use mailgate_imap::parser::StatusItem;
use mailgate_imap::{
    Authenticated, Client, FetchAttribute, FetchedMessage, Flag, ListResponse, MailboxStatus,
    NotAuthenticated, Refused, Selected, StatusAttribute, StoreAction, Uid, UidSet,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use crate::config::{Credentials, Timeouts};
use crate::connector::Connector;
use crate::error::{Error, Exchange, Result};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Nothing opened yet.
    Disconnected,
    /// Connecting or authenticating.
    Connecting,
    /// Logged in, no mailbox selected.
    Authenticated,
    /// A mailbox is selected.
    SelectedMailbox,
    /// Torn down; no further exchanges.
    Closed,
}

enum Link<S> {
    Idle,
    Greeted(Client<S, NotAuthenticated>),
    Authenticated(Client<S, Authenticated>),
    Selected(Client<S, Selected>),
    Closed,
}

/// A live connection owned by one operation.
pub struct Session<S> {
    link: Link<S>,
    state: SessionState,
    timeouts: Timeouts,
    cancel: CancellationToken,
    /// False once a transport failure or timeout leaves the stream out of
    /// sync; teardown then drops the socket without LOGOUT.
    healthy: bool,
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("selected", &self.selected_mailbox())
            .field("healthy", &self.healthy)
            .finish_non_exhaustive()
    }
}

/// Runs `fut` under `limit`, reporting `exchange` on expiry.
pub(crate) async fn bounded<T>(
    limit: Duration,
    exchange: Exchange,
    fut: impl Future<Output = T>,
) -> Result<T> {
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        tracing::debug!(%exchange, ?limit, "exchange timed out");
        Error::Timeout {
            exchange,
            after: limit,
        }
    })
}

/// Errors while establishing a session are connection errors, except timeouts.
fn establish_error(exchange: Exchange, source: mailgate_imap::Error) -> Error {
    match source {
        mailgate_imap::Error::Timeout(after) => Error::Timeout { exchange, after },
        source => Error::Connection { exchange, source },
    }
}

/// Opens a session, runs `operation` on it and tears it down.
///
/// Teardown (LOGOUT under its own deadline, then socket shutdown) happens
/// whether the operation succeeds, fails, times out or is cancelled, and
/// also when connecting or authenticating fails. Nothing is retried.
///
/// # Errors
///
/// Returns [`Error::Connection`] if the session cannot be established,
/// otherwise whatever `operation` returns.
pub async fn with_session<C, T>(
    connector: &C,
    credentials: &Credentials,
    timeouts: Timeouts,
    cancel: &CancellationToken,
    operation: impl AsyncFnOnce(&mut Session<C::Stream>) -> Result<T>,
) -> Result<T>
where
    C: Connector,
{
    let mut session = Session::new(timeouts, cancel.clone());
    let result = match session.open(connector, credentials).await {
        Ok(()) => operation(&mut session).await,
        Err(e) => Err(e),
    };
    session.close().await;
    result
}

impl<S> Session<S> {
    fn new(timeouts: Timeouts, cancel: CancellationToken) -> Self {
        Self {
            link: Link::Idle,
            state: SessionState::Disconnected,
            timeouts,
            cancel,
            healthy: true,
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the selected mailbox, if any.
    #[must_use]
    pub fn selected_mailbox(&self) -> Option<&str> {
        match &self.link {
            Link::Selected(client) => Some(client.selected().mailbox().as_str()),
            _ => None,
        }
    }

    /// Returns true once the caller has asked to cancel.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            tracing::debug!(state = ?self.state, "operation cancelled");
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn wrong_state(&self, expected: SessionState) -> Error {
        Error::Session {
            expected,
            actual: self.state,
        }
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn open<C>(&mut self, connector: &C, credentials: &Credentials) -> Result<()>
    where
        C: Connector<Stream = S>,
    {
        self.checkpoint()?;
        self.state = SessionState::Connecting;

        let client = bounded(self.timeouts.connect(), Exchange::Connect, connector.connect())
            .await?
            .map_err(|e| establish_error(Exchange::Connect, e))?;

        if let Err(e) = self.checkpoint() {
            self.link = Link::Greeted(client);
            return Err(e);
        }

        let login = client.login(&credentials.user, &credentials.pass);
        match bounded(self.timeouts.command(), Exchange::Authenticate, login).await {
            Ok(Ok(client)) => {
                tracing::debug!(uidplus = client.supports_uidplus(), "session authenticated");
                self.link = Link::Authenticated(client);
                self.state = SessionState::Authenticated;
                Ok(())
            }
            Ok(Err(Refused { client, error })) => {
                tracing::debug!(%error, "login refused");
                self.link = Link::Greeted(client);
                Err(establish_error(Exchange::Authenticate, error))
            }
            Err(timeout) => {
                self.healthy = false;
                Err(timeout)
            }
        }
    }

    /// Logs out and closes the connection. Failures are logged, not returned.
    async fn close(&mut self) {
        let link = mem::replace(&mut self.link, Link::Closed);
        self.state = SessionState::Closed;

        let limit = self.timeouts.logout();
        let outcome = match link {
            Link::Greeted(client) if self.healthy => {
                bounded(limit, Exchange::Logout, client.logout()).await
            }
            Link::Authenticated(client) if self.healthy => {
                bounded(limit, Exchange::Logout, client.logout()).await
            }
            Link::Selected(client) if self.healthy => {
                bounded(limit, Exchange::Logout, client.logout()).await
            }
            // Dropping the client closes the socket.
            _ => return,
        };

        match outcome {
            Ok(Ok(())) => tracing::debug!("session closed"),
            Ok(Err(error)) => tracing::warn!(%error, "logout failed, connection dropped"),
            Err(error) => tracing::warn!(%error, "logout timed out, connection dropped"),
        }
    }

    /// Turns a bounded exchange outcome into a result, marking the session
    /// unusable when the transport is no longer trustworthy.
    fn settle<T>(
        &mut self,
        exchange: Exchange,
        outcome: Result<mailgate_imap::Result<T>>,
    ) -> Result<T> {
        let error = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => Error::from_imap(exchange, e),
            Err(timeout) => timeout,
        };
        if matches!(error, Error::Connection { .. } | Error::Timeout { .. }) {
            self.healthy = false;
        }
        Err(error)
    }

    /// `LIST "" "*"`.
    pub(crate) async fn list(&mut self) -> Result<Vec<ListResponse>> {
        self.checkpoint()?;
        let limit = self.timeouts.command();
        let outcome = match &mut self.link {
            Link::Authenticated(client) => bounded(limit, Exchange::List, client.list("", "*")).await,
            Link::Selected(client) => bounded(limit, Exchange::List, client.list("", "*")).await,
            _ => return Err(self.wrong_state(SessionState::Authenticated)),
        };
        self.settle(Exchange::List, outcome)
    }

    /// `STATUS <mailbox> (<items>)`.
    pub(crate) async fn status(
        &mut self,
        mailbox: &mailgate_imap::Mailbox,
        items: &[StatusAttribute],
    ) -> Result<Vec<StatusItem>> {
        self.checkpoint()?;
        let limit = self.timeouts.command();
        let outcome = match &mut self.link {
            Link::Authenticated(client) => {
                bounded(limit, Exchange::Status, client.status(mailbox, items)).await
            }
            Link::Selected(client) => {
                bounded(limit, Exchange::Status, client.status(mailbox, items)).await
            }
            _ => return Err(self.wrong_state(SessionState::Authenticated)),
        };
        self.settle(Exchange::Status, outcome)
    }

    /// Selects `mailbox`, switching away from any selected one.
    ///
    /// A refusal leaves the session authenticated and is reported as
    /// [`Error::NotFound`].
    pub(crate) async fn select(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        self.checkpoint()?;
        let limit = self.timeouts.command();
        let target = mailgate_imap::Mailbox::new(mailbox);

        let outcome = match mem::replace(&mut self.link, Link::Closed) {
            Link::Authenticated(client) => {
                bounded(limit, Exchange::Select, client.select(&target)).await
            }
            Link::Selected(client) => bounded(limit, Exchange::Select, client.select(&target)).await,
            other => {
                self.link = other;
                return Err(self.wrong_state(SessionState::Authenticated));
            }
        };

        match outcome {
            Ok(Ok(client)) => {
                let status = client.selected().status().clone();
                self.link = Link::Selected(client);
                self.state = SessionState::SelectedMailbox;
                Ok(status)
            }
            Ok(Err(Refused { client, error })) => {
                self.link = Link::Authenticated(client);
                self.state = SessionState::Authenticated;
                if error.is_no() {
                    tracing::debug!(mailbox, %error, "select refused");
                    Err(Error::mailbox_not_found(mailbox))
                } else {
                    self.settle(Exchange::Select, Ok(Err(error)))
                }
            }
            Err(timeout) => {
                // The client went down with the abandoned exchange.
                self.state = SessionState::Closed;
                self.healthy = false;
                Err(timeout)
            }
        }
    }

    fn selected_client(&mut self) -> Result<&mut Client<S, Selected>> {
        match &mut self.link {
            Link::Selected(client) => Ok(client),
            _ => Err(Error::Session {
                expected: SessionState::SelectedMailbox,
                actual: self.state,
            }),
        }
    }

    /// `UID FETCH <uids> (<items>)` in the selected mailbox.
    pub(crate) async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        items: &[FetchAttribute],
    ) -> Result<Vec<FetchedMessage>> {
        self.checkpoint()?;
        let limit = self.timeouts.command();
        let client = self.selected_client()?;
        let outcome = bounded(limit, Exchange::Fetch, client.uid_fetch(uids, items)).await;
        self.settle(Exchange::Fetch, outcome)
    }

    /// `UID STORE <uid> +FLAGS.SILENT (\Deleted)`.
    pub(crate) async fn mark_deleted(&mut self, uid: Uid) -> Result<()> {
        self.checkpoint()?;
        let limit = self.timeouts.command();
        let client = self.selected_client()?;
        let uids = UidSet::from(uid);
        let flags = [Flag::Deleted];
        let store = client.uid_store(&uids, StoreAction::Add, &flags, true);
        let outcome = bounded(limit, Exchange::Store, store).await;
        self.settle(Exchange::Store, outcome)
    }

    /// Purges `uid` after [`Self::mark_deleted`].
    ///
    /// Uses `UID EXPUNGE` when the server has UIDPLUS, otherwise `EXPUNGE`,
    /// which also purges anything else flagged `\Deleted` in the mailbox.
    /// Not preceded by a cancellation check: once a message is marked, the
    /// purge always runs.
    pub(crate) async fn purge(&mut self, uid: Uid) -> Result<()> {
        let limit = self.timeouts.command();
        let client = self.selected_client()?;
        let outcome = if client.supports_uidplus() {
            bounded(limit, Exchange::Expunge, client.uid_expunge(&uid.into())).await
        } else {
            tracing::debug!(%uid, "server lacks UIDPLUS, expunging all deleted messages");
            bounded(limit, Exchange::Expunge, client.expunge()).await
        };
        self.settle(Exchange::Expunge, outcome).map(|expunged| {
            tracing::debug!(%uid, expunged = expunged.len(), "expunged");
        })
    }
}
