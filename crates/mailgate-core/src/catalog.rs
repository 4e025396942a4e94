//! Mailbox catalog.

use mailgate_imap::parser::StatusItem;
use mailgate_imap::StatusAttribute;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Exchange, Result};
use crate::model::{Mailbox, SpecialUse};
use crate::session::Session;

const COUNTS: [StatusAttribute; 2] = [StatusAttribute::Messages, StatusAttribute::Unseen];

/// Lists every mailbox in the order the store reports them.
///
/// Selectable mailboxes get their counts from STATUS; `\Noselect` and
/// `\NonExistent` ones are reported with zero counts. Any malformed or
/// missing response aborts the whole listing.
///
/// # Errors
///
/// Returns [`Error::Protocol`] on malformed LIST/STATUS data or a refused
/// STATUS, and [`Error::Connection`] if the transport fails.
pub async fn list_mailboxes<S>(session: &mut Session<S>) -> Result<Vec<Mailbox>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let listed = session.list().await?;
    let mut mailboxes = Vec::with_capacity(listed.len());

    for entry in listed {
        let selectable = entry.is_selectable();
        let (messages, unseen) = if selectable {
            let items = session.status(&entry.mailbox, &COUNTS).await?;
            counts(entry.mailbox.as_str(), &items)?
        } else {
            (0, 0)
        };

        mailboxes.push(Mailbox {
            name: entry.mailbox.as_str().to_string(),
            delimiter: entry.delimiter,
            messages,
            unseen,
            selectable,
            role: SpecialUse::detect(&entry.mailbox, &entry.attributes),
        });
    }

    Ok(mailboxes)
}

fn counts(mailbox: &str, items: &[StatusItem]) -> Result<(u32, u32)> {
    let mut messages = None;
    let mut unseen = None;
    for item in items {
        match item {
            StatusItem::Messages(n) => messages = Some(*n),
            StatusItem::Unseen(n) => unseen = Some(*n),
            _ => {}
        }
    }
    match (messages, unseen) {
        (Some(messages), Some(unseen)) => Ok((messages, unseen)),
        _ => Err(Error::protocol(
            Exchange::Status,
            format!("STATUS for {mailbox} lacks MESSAGES or UNSEEN"),
        )),
    }
}
