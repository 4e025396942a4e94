//! Opening connections to the mail store.

use std::future::Future;

use mailgate_imap::{Client, ImapStream, NotAuthenticated};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::ImapSettings;

/// Produces a greeted, not yet authenticated connection.
///
/// The session manager calls this once per operation. Implementations do
/// not retry.
pub trait Connector: Send + Sync {
    /// Transport the client runs over.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Connects and reads the server greeting.
    fn connect(
        &self,
    ) -> impl Future<Output = mailgate_imap::Result<Client<Self::Stream, NotAuthenticated>>> + Send;
}

/// Connects over TCP with the configured transport security.
#[derive(Debug, Clone)]
pub struct ImapConnector {
    config: mailgate_imap::Config,
}

impl ImapConnector {
    /// Creates a connector for the configured server.
    #[must_use]
    pub fn new(settings: &ImapSettings) -> Self {
        Self {
            config: settings.client_config(),
        }
    }
}

impl Connector for ImapConnector {
    type Stream = ImapStream;

    fn connect(
        &self,
    ) -> impl Future<Output = mailgate_imap::Result<Client<ImapStream, NotAuthenticated>>> + Send
    {
        tracing::debug!(
            host = %self.config.host,
            port = self.config.port,
            security = ?self.config.security,
            "connecting"
        );
        Client::connect(&self.config)
    }
}
