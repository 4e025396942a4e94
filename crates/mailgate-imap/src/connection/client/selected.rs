//! Selected state: UID FETCH, UID STORE, EXPUNGE and mailbox switching.

use tokio::io::{AsyncRead, AsyncWrite};

use super::{Authenticated, Client, Refused, Selected};
use crate::command::{Command, FetchAttribute, StoreAction};
use crate::parser::{Envelope, FetchItem, UntaggedResponse};
use crate::types::{Flag, Flags, Mailbox, SeqNum, Uid, UidSet};
use crate::Result;

/// A message as returned by FETCH, with the items the server sent.
///
/// Every field except `seq` is optional: servers only send what was asked
/// for, and unsolicited FETCH responses may carry nothing but flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedMessage {
    /// Sequence number at the time of the response.
    pub seq: Option<SeqNum>,
    /// Persistent UID.
    pub uid: Option<Uid>,
    /// Message flags.
    pub flags: Option<Flags>,
    /// INTERNALDATE, as sent.
    pub internal_date: Option<String>,
    /// RFC822.SIZE.
    pub size: Option<u32>,
    /// Parsed envelope.
    pub envelope: Option<Envelope>,
    /// `BODY[]` content. `Some(empty)` is distinct from `None` (not sent).
    pub body: Option<Vec<u8>>,
    /// Whether the server sent `BODY[]` as `NIL`.
    pub body_nil: bool,
}

impl FetchedMessage {
    fn absorb(&mut self, items: Vec<FetchItem>) {
        for item in items {
            match item {
                FetchItem::Uid(uid) => self.uid = Some(uid),
                FetchItem::Flags(flags) => self.flags = Some(flags),
                FetchItem::InternalDate(date) => self.internal_date = Some(date),
                FetchItem::Rfc822Size(size) => self.size = Some(size),
                FetchItem::Envelope(envelope) => self.envelope = Some(*envelope),
                FetchItem::Body { section, data } if is_whole_message(section.as_deref()) => {
                    match data {
                        Some(data) => self.body = Some(data),
                        None => self.body_nil = true,
                    }
                }
                FetchItem::Body { .. } => {}
            }
        }
    }
}

/// `BODY[]` and `RFC822` both carry the full message.
fn is_whole_message(section: Option<&str>) -> bool {
    section.is_none_or(str::is_empty)
}

/// Drops the entry at `seq` and shifts the ones after it down by one.
fn apply_expunge(messages: &mut Vec<FetchedMessage>, seq: SeqNum) {
    messages.retain(|m| m.seq != Some(seq));
    for message in &mut *messages {
        if let Some(current) = message.seq.filter(|s| *s > seq) {
            message.seq = SeqNum::new(current.get() - 1);
        }
    }
}

impl<S> Client<S, Selected> {
    /// Returns the selected mailbox and its status.
    #[must_use]
    pub const fn selected(&self) -> &Selected {
        &self.state
    }
}

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Fetches items for the given UIDs.
    ///
    /// Responses the server splits across several FETCH lines for the same
    /// message are merged. Messages come back in server order.
    ///
    /// Responses are applied in arrival order: an `EXPUNGE` interleaved with
    /// the FETCH data removes that message from the result and renumbers the
    /// ones after it, so later FETCH lines land on the right entry.
    pub async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        items: &[FetchAttribute],
    ) -> Result<Vec<FetchedMessage>> {
        let command = Command::UidFetch {
            uids: uids.clone(),
            items: items.to_vec(),
        };
        let responses = self.execute(&command).await?;

        let mut messages: Vec<FetchedMessage> = Vec::new();
        for response in responses {
            match response {
                UntaggedResponse::Fetch { seq, items } => {
                    match messages.iter_mut().find(|m| m.seq == Some(seq)) {
                        Some(existing) => existing.absorb(items),
                        None => {
                            let mut message = FetchedMessage {
                                seq: Some(seq),
                                ..FetchedMessage::default()
                            };
                            message.absorb(items);
                            messages.push(message);
                        }
                    }
                }
                UntaggedResponse::Expunge(seq) => {
                    tracing::debug!(%seq, "message expunged during fetch");
                    apply_expunge(&mut messages, seq);
                    self.track(vec![UntaggedResponse::Expunge(seq)]);
                }
                other => {
                    self.track(vec![other]);
                }
            }
        }

        tracing::trace!(count = messages.len(), "fetched messages");
        Ok(messages)
    }

    /// Changes flags on the given UIDs.
    ///
    /// With `silent`, the server is asked not to echo the new flags.
    pub async fn uid_store(
        &mut self,
        uids: &UidSet,
        action: StoreAction,
        flags: &[Flag],
        silent: bool,
    ) -> Result<()> {
        let command = Command::UidStore {
            uids: uids.clone(),
            action,
            flags: flags.to_vec(),
            silent,
        };
        let responses = self.execute(&command).await?;
        self.track(responses);
        Ok(())
    }

    /// Permanently removes every message flagged `\Deleted`.
    ///
    /// Returns the sequence numbers the server reported as expunged.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let responses = self.execute(&Command::Expunge).await?;
        Ok(self.expunged(responses))
    }

    /// Permanently removes the given UIDs if flagged `\Deleted` (RFC 4315).
    pub async fn uid_expunge(&mut self, uids: &UidSet) -> Result<Vec<SeqNum>> {
        let command = Command::UidExpunge { uids: uids.clone() };
        let responses = self.execute(&command).await?;
        Ok(self.expunged(responses))
    }

    /// Switches to another mailbox.
    ///
    /// A refused SELECT leaves no mailbox selected (RFC 3501 section 6.3.1),
    /// so the client comes back authenticated.
    pub async fn select(
        mut self,
        mailbox: &Mailbox,
    ) -> std::result::Result<Self, Refused<Client<S, Authenticated>>> {
        match self.run_select(mailbox).await {
            Ok(status) => Ok(self.into_state(Selected::new(mailbox.clone(), status))),
            Err(error) => Err(Refused {
                client: self.into_state(Authenticated),
                error,
            }),
        }
    }

    fn expunged(&mut self, responses: Vec<UntaggedResponse>) -> Vec<SeqNum> {
        let expunged = responses
            .iter()
            .filter_map(|r| match r {
                UntaggedResponse::Expunge(seq) => Some(*seq),
                _ => None,
            })
            .collect();
        self.track(responses);
        expunged
    }

    /// Applies mailbox size updates and passes the remaining responses on.
    fn track(&mut self, responses: Vec<UntaggedResponse>) -> Vec<UntaggedResponse> {
        let status = &mut self.state.status;
        responses
            .into_iter()
            .filter(|r| match r {
                UntaggedResponse::Exists(n) => {
                    status.exists = *n;
                    false
                }
                UntaggedResponse::Expunge(_) => {
                    status.exists = status.exists.saturating_sub(1);
                    false
                }
                _ => true,
            })
            .collect()
    }
}
