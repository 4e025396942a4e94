//! Body resolver.

use mailgate_imap::{FetchAttribute, FetchedMessage};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Exchange, Result};
use crate::index::resolve;
use crate::model::{MessageBody, MessageId};
use crate::session::Session;

/// Fetches and renders one message.
///
/// The body is fetched with `BODY.PEEK[]`, so `\Seen` is left alone.
///
/// # Errors
///
/// Returns [`Error::NotFound`] if the mailbox or id does not resolve,
/// [`Error::Decode`] if the MIME structure cannot be rendered, and
/// [`Error::Protocol`] if the store lists the message but returns no body.
pub async fn get_message_body<S>(
    session: &mut Session<S>,
    mailbox: &str,
    id: MessageId,
) -> Result<MessageBody>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let uid = resolve(session, mailbox, id).await?;

    let fetched = session
        .uid_fetch(&uid.into(), &[FetchAttribute::BodyPeek { section: None }])
        .await?;
    let raw = match fetched.into_iter().find(|m| m.uid == Some(uid)) {
        Some(FetchedMessage {
            body: Some(raw), ..
        }) if !raw.is_empty() => raw,
        _ => {
            return Err(Error::protocol(
                Exchange::Fetch,
                format!("message {id} in {mailbox} is present but its body came back empty"),
            ));
        }
    };

    tracing::debug!(mailbox, %id, bytes = raw.len(), "decoding message");
    mailgate_mime::render_message(&raw).map_err(|source| Error::Decode {
        mailbox: mailbox.to_string(),
        id,
        source,
    })
}
