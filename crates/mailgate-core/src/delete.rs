//! Deletion coordinator.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Result};
use crate::index::resolve;
use crate::model::MessageId;
use crate::session::Session;

/// Marks a message `\Deleted` and purges it in the same session.
///
/// # Errors
///
/// Returns [`Error::NotFound`] (nothing changed) if the id does not
/// resolve, the store's error if marking fails (nothing changed), and
/// [`Error::PartialDeletion`] if the mark succeeded but the purge did not.
pub async fn delete_message<S>(session: &mut Session<S>, mailbox: &str, id: MessageId) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let uid = resolve(session, mailbox, id).await?;

    session.mark_deleted(uid).await?;
    session
        .purge(uid)
        .await
        .map_err(|source| {
            tracing::warn!(mailbox, %id, error = %source, "message marked deleted but not purged");
            Error::PartialDeletion {
                mailbox: mailbox.to_string(),
                id,
                source: Box::new(source),
            }
        })
}
