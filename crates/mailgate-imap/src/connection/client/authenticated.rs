//! Authenticated state: LIST, STATUS and SELECT.
//!
//! LIST and STATUS stay available once a mailbox is selected.

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Authenticated, Authorized, Client, Refused, Selected};
use crate::command::{Command, StatusAttribute};
use crate::parser::{StatusItem, UntaggedResponse};
use crate::types::{ListResponse, Mailbox};
use crate::{Error, Result};

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
    State: Authorized,
{
    /// Lists mailboxes matching `pattern`, in the order the server sent them.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let command = Command::List {
            reference: reference.to_string(),
            pattern: pattern.to_string(),
        };
        let responses = self.execute(&command).await?;

        let mailboxes: Vec<_> = responses
            .into_iter()
            .filter_map(|r| match r {
                UntaggedResponse::List(list) => Some(list),
                _ => None,
            })
            .collect();

        tracing::debug!(count = mailboxes.len(), "listed mailboxes");
        Ok(mailboxes)
    }

    /// Requests STATUS items for a mailbox that is not selected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the server completes the command
    /// without sending a STATUS response for `mailbox`.
    pub async fn status(
        &mut self,
        mailbox: &Mailbox,
        items: &[StatusAttribute],
    ) -> Result<Vec<StatusItem>> {
        let command = Command::Status {
            mailbox: mailbox.clone(),
            items: items.to_vec(),
        };
        let responses = self.execute(&command).await?;

        responses
            .into_iter()
            .find_map(|r| match r {
                UntaggedResponse::Status {
                    mailbox: reported,
                    items,
                } if reported == *mailbox => Some(items),
                _ => None,
            })
            .ok_or_else(|| Error::Protocol(format!("no STATUS response for {mailbox}")))
    }
}

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Selects a mailbox.
    ///
    /// A refusal (for instance a mailbox that does not exist) hands the
    /// client back still authenticated.
    pub async fn select(
        mut self,
        mailbox: &Mailbox,
    ) -> std::result::Result<Client<S, Selected>, Refused<Self>> {
        match self.run_select(mailbox).await {
            Ok(status) => Ok(self.into_state(Selected::new(mailbox.clone(), status))),
            Err(error) => Err(Refused {
                client: self,
                error,
            }),
        }
    }
}
