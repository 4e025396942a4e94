//! The four operations exposed to the façade.

use tokio_util::sync::CancellationToken;

use crate::config::{Credentials, ServerConfig, Timeouts};
use crate::connector::{Connector, ImapConnector};
use crate::error::Result;
use crate::model::{Mailbox, MessageBody, MessageId, MessageSummary};
use crate::session::{self, Session};
use crate::{body, catalog, delete, index};

/// Entry point of the access layer.
///
/// Holds connection parameters only; every call opens, uses and closes its
/// own session, so a `MailAccess` can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct MailAccess<C> {
    connector: C,
    credentials: Credentials,
    timeouts: Timeouts,
}

impl MailAccess<ImapConnector> {
    /// Creates an access layer for the configured server.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            ImapConnector::new(&config.imap),
            config.imap.auth.clone(),
            config.imap.timeouts,
        )
    }
}

impl<C: Connector> MailAccess<C> {
    /// Creates an access layer over an arbitrary connector.
    #[must_use]
    pub const fn new(connector: C, credentials: Credentials, timeouts: Timeouts) -> Self {
        Self {
            connector,
            credentials,
            timeouts,
        }
    }

    /// Runs `operation` on a fresh session; see [`session::with_session`].
    ///
    /// # Errors
    ///
    /// Returns session establishment errors or the operation's error.
    pub async fn with_session<T>(
        &self,
        cancel: &CancellationToken,
        operation: impl AsyncFnOnce(&mut Session<C::Stream>) -> Result<T>,
    ) -> Result<T> {
        session::with_session(
            &self.connector,
            &self.credentials,
            self.timeouts,
            cancel,
            operation,
        )
        .await
    }

    /// Lists the store's mailboxes.
    ///
    /// # Errors
    ///
    /// See [`catalog::list_mailboxes`].
    pub async fn list_mailboxes(&self, cancel: &CancellationToken) -> Result<Vec<Mailbox>> {
        let result = self
            .with_session(cancel, async |session| catalog::list_mailboxes(session).await)
            .await;
        log_outcome("list_mailboxes", None, None, &result, |m| m.len());
        result
    }

    /// Lists the messages in `mailbox`, newest first.
    ///
    /// # Errors
    ///
    /// See [`index::list_messages`].
    pub async fn list_messages(
        &self,
        cancel: &CancellationToken,
        mailbox: &str,
    ) -> Result<Vec<MessageSummary>> {
        let result = self
            .with_session(cancel, async |session| {
                index::list_messages(session, mailbox).await
            })
            .await;
        log_outcome("list_messages", Some(mailbox), None, &result, |m| m.len());
        result
    }

    /// Fetches and renders one message.
    ///
    /// # Errors
    ///
    /// See [`body::get_message_body`].
    pub async fn get_message_body(
        &self,
        cancel: &CancellationToken,
        mailbox: &str,
        id: MessageId,
    ) -> Result<MessageBody> {
        let result = self
            .with_session(cancel, async |session| {
                body::get_message_body(session, mailbox, id).await
            })
            .await;
        log_outcome("get_message_body", Some(mailbox), Some(id), &result, |b| {
            b.text.len()
        });
        result
    }

    /// Deletes one message.
    ///
    /// # Errors
    ///
    /// See [`delete::delete_message`].
    pub async fn delete_message(
        &self,
        cancel: &CancellationToken,
        mailbox: &str,
        id: MessageId,
    ) -> Result<()> {
        let result = self
            .with_session(cancel, async |session| {
                delete::delete_message(session, mailbox, id).await
            })
            .await;
        log_outcome("delete_message", Some(mailbox), Some(id), &result, |_| 1);
        result
    }
}

fn log_outcome<T>(
    operation: &'static str,
    mailbox: Option<&str>,
    id: Option<MessageId>,
    result: &Result<T>,
    size: impl FnOnce(&T) -> usize,
) {
    match result {
        Ok(value) => tracing::info!(
            operation,
            mailbox,
            id = id.map(MessageId::get),
            size = size(value),
            "operation completed"
        ),
        Err(error) => tracing::info!(
            operation,
            mailbox,
            id = id.map(MessageId::get),
            kind = %error.kind(),
            %error,
            "operation failed"
        ),
    }
}
