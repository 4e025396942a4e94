//! Message index: listing summaries and mapping ids back to UIDs.
//!
//! Callers only ever see [`MessageId`]s, which are derived from the
//! mailbox's UIDVALIDITY and each message's UID. Sequence numbers stay
//! inside the protocol client.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use mailgate_imap::parser::Address;
use mailgate_imap::{FetchAttribute, FetchedMessage, SeqNum, Uid, UidSet, UidValidity};
use mailgate_mime::{decode_header_value, format_mailbox};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Exchange, Result};
use crate::model::{MessageFlags, MessageId, MessageSummary};
use crate::session::Session;

const SUMMARY_ITEMS: [FetchAttribute; 5] = [
    FetchAttribute::Uid,
    FetchAttribute::Flags,
    FetchAttribute::InternalDate,
    FetchAttribute::Rfc822Size,
    FetchAttribute::Envelope,
];

/// INTERNALDATE layout (RFC 3501 `date-time`).
const INTERNALDATE_FORMAT: &str = "%d-%b-%Y %H:%M:%S %z";

/// Lists the messages of `mailbox`, newest first.
///
/// Messages are ordered by INTERNALDATE, newest first; messages without a
/// usable date follow in arrival (UID) order.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the mailbox cannot be selected and
/// [`Error::Protocol`] if the store omits UIDVALIDITY or a UID.
pub async fn list_messages<S>(session: &mut Session<S>, mailbox: &str) -> Result<Vec<MessageSummary>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let status = session.select(mailbox).await?;
    if status.exists == 0 {
        return Ok(Vec::new());
    }
    let validity = require_validity(mailbox, status.uid_validity)?;

    let fetched = session.uid_fetch(&UidSet::all(), &SUMMARY_ITEMS).await?;
    let mut entries = fetched
        .into_iter()
        .map(|message| summarize(validity, message))
        .collect::<Result<Vec<_>>>()?;

    entries.sort_by(newest_first);
    Ok(entries.into_iter().map(|(_, summary)| summary).collect())
}

/// Selects `mailbox` and maps `id` back to a UID that is present now.
///
/// Performs no mutation.
pub(crate) async fn resolve<S>(session: &mut Session<S>, mailbox: &str, id: MessageId) -> Result<Uid>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let status = session.select(mailbox).await?;
    let validity = require_validity(mailbox, status.uid_validity)?;

    let Some(uid) = id.resolve(validity) else {
        tracing::debug!(mailbox, %id, %validity, "id from another UIDVALIDITY epoch");
        return Err(Error::message_not_found(mailbox, id));
    };
    if status.exists == 0 {
        return Err(Error::message_not_found(mailbox, id));
    }

    let present = session.uid_fetch(&uid.into(), &[FetchAttribute::Uid]).await?;
    if present.iter().any(|m| m.uid == Some(uid)) {
        Ok(uid)
    } else {
        Err(Error::message_not_found(mailbox, id))
    }
}

fn require_validity(mailbox: &str, validity: Option<UidValidity>) -> Result<UidValidity> {
    validity.ok_or_else(|| {
        Error::protocol(Exchange::Select, format!("SELECT {mailbox} reported no UIDVALIDITY"))
    })
}

fn summarize(validity: UidValidity, message: FetchedMessage) -> Result<(Uid, MessageSummary)> {
    let Some(uid) = message.uid else {
        return Err(Error::protocol(
            Exchange::Fetch,
            format!(
                "FETCH response for message {} carries no UID",
                message.seq.map_or(0, SeqNum::get)
            ),
        ));
    };

    let envelope = message.envelope.unwrap_or_default();
    let summary = MessageSummary {
        id: MessageId::new(validity, uid),
        from: envelope.from.iter().find_map(sender),
        subject: envelope.subject.as_deref().map(decode_header_value),
        date: envelope.date,
        received: message.internal_date.as_deref().and_then(parse_internal_date),
        flags: message.flags.as_ref().map(MessageFlags::from).unwrap_or_default(),
        size: message.size,
    };
    Ok((uid, summary))
}

fn sender(address: &Address) -> Option<String> {
    let email = address.email()?;
    let name = address.name.as_deref().map(decode_header_value);
    Some(format_mailbox(name.as_deref(), &email))
}

fn parse_internal_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    match DateTime::parse_from_str(raw.trim(), INTERNALDATE_FORMAT) {
        Ok(date) => Some(date),
        Err(error) => {
            tracing::debug!(raw, %error, "unparseable INTERNALDATE");
            None
        }
    }
}

/// Dated messages newest first (ties: higher UID first), then undated ones
/// in UID order.
fn newest_first(a: &(Uid, MessageSummary), b: &(Uid, MessageSummary)) -> Ordering {
    match (a.1.received, b.1.received) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| b.0.cmp(&a.0)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    }
}
