//! Not-authenticated state: greeting, STARTTLS and LOGIN.

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Authenticated, Client, NotAuthenticated, Refused};
use crate::command::{Command, TagGenerator};
use crate::connection::stream;
use crate::connection::{Config, FramedStream, ImapStream, Security};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established transport and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bye`] if the server rejects the connection, or
    /// [`Error::Protocol`] if it greets with anything other than `OK`.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut stream = FramedStream::new(stream);
        let greeting = stream.read_response().await?;

        let greeting = match ResponseParser::parse(&greeting)? {
            Response::Untagged(UntaggedResponse::Condition(condition)) => condition,
            other => return Err(Error::Protocol(format!("unexpected greeting: {other:?}"))),
        };
        let capabilities = match greeting.status {
            Status::Ok => match greeting.code {
                Some(ResponseCode::Capability(caps)) => caps,
                _ => Vec::new(),
            },
            Status::Bye => return Err(Error::Bye(greeting.text)),
            Status::PreAuth => {
                return Err(Error::Protocol(
                    "server greeted with PREAUTH, credentials would be ignored".to_string(),
                ));
            }
            Status::No | Status::Bad => {
                return Err(Error::Protocol(format!(
                    "greeting was {:?}: {}",
                    greeting.status, greeting.text
                )));
            }
        };

        tracing::debug!(capabilities = capabilities.len(), "received greeting");

        Ok(Self {
            stream,
            tag_gen: TagGenerator::default(),
            capabilities,
            state: NotAuthenticated,
        })
    }

    /// Authenticates with LOGIN.
    ///
    /// On rejection the connection is still usable (for example to log out).
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> std::result::Result<Client<S, Authenticated>, Refused<Self>> {
        if self.has_capability(&Capability::LoginDisabled) {
            return Err(Refused {
                client: self,
                error: Error::InvalidState("server advertises LOGINDISABLED".to_string()),
            });
        }

        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };

        match self.execute_with_code(&command).await {
            Ok((_, code)) => {
                tracing::debug!("logged in");
                let mut client = self.into_state(Authenticated);
                // Pre-login capabilities are stale unless the server refreshed them.
                if !matches!(code, Some(ResponseCode::Capability(_))) {
                    if let Err(error) = client.capability().await {
                        tracing::debug!(%error, "capability refresh after login failed");
                    }
                }
                Ok(client)
            }
            Err(error) => Err(Refused {
                client: self,
                error,
            }),
        }
    }
}

impl Client<ImapStream, NotAuthenticated> {
    /// Opens a connection as described by `config`.
    ///
    /// Performs the TCP connect (and TLS handshake for [`Security::Tls`]), reads
    /// the greeting and, for [`Security::StartTls`], upgrades the transport.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = stream::connect(config).await?;
        let client = Self::from_stream(stream).await?;
        match config.security {
            Security::StartTls => client.starttls(&config.host).await,
            Security::Tls | Security::Plain => Ok(client),
        }
    }

    /// Upgrades a plain connection with STARTTLS.
    ///
    /// Capabilities are discarded and requested again over the secured
    /// transport.
    pub async fn starttls(mut self, host: &str) -> Result<Self> {
        if self.stream.get_ref().is_tls() {
            return Err(Error::InvalidState("connection is already TLS".to_string()));
        }

        self.execute(&Command::StartTls).await?;

        // Anything pipelined before the handshake would bypass TLS.
        if self.stream.has_buffered_data() {
            return Err(Error::Protocol(
                "unexpected data buffered before TLS handshake".to_string(),
            ));
        }

        let upgraded = self.stream.into_inner().secure(host).await?;
        tracing::debug!(host, "upgraded connection with STARTTLS");

        let mut client = Self {
            stream: FramedStream::new(upgraded),
            tag_gen: self.tag_gen,
            capabilities: Vec::new(),
            state: NotAuthenticated,
        };
        client.capability().await?;
        Ok(client)
    }
}
