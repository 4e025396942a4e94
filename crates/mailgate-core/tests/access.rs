//! End-to-end behaviour of `MailAccess` against an in-process IMAP server.

#![allow(clippy::unwrap_used)]

mod support;

use std::io;
use std::sync::{Arc, Mutex};

use mailgate_core::{
    Credentials, Error, ErrorKind, Exchange, MailAccess, MessageId, SessionState, SpecialUse,
    Timeouts, body, index,
};
use support::{FakeServer, Fault, PASS, USER, plain_message, server};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::MakeWriter;

const VALIDITY: u64 = 1700;

fn id(uid: u64) -> MessageId {
    MessageId::from_raw((VALIDITY << 32) | uid)
}

/// INBOX holding `first` (uid 1, older) and `second` (uid 2, newer).
fn inbox() -> FakeServer {
    server()
        .with_folder("INBOX", &["\\HasNoChildren"], 1700)
        .with_message(
            "INBOX",
            Some("01-Mar-2024 09:00:00 +0000"),
            "first",
            &plain_message("first", "one"),
        )
        .with_message(
            "INBOX",
            Some("02-Mar-2024 09:00:00 +0000"),
            "second",
            &plain_message("second", "two"),
        )
}

fn ids(summaries: &[mailgate_core::MessageSummary]) -> Vec<MessageId> {
    summaries.iter().map(|s| s.id).collect()
}

// --- catalog ---

#[tokio::test]
async fn mailboxes_keep_server_order_and_counts() {
    let server = inbox()
        .with_folder("Archive", &["\\Noselect"], 1)
        .with_folder("Sent", &["\\Sent"], 9)
        .with_message("Sent", None, "out", &plain_message("out", "x"));
    let cancel = CancellationToken::new();

    let mailboxes = server.access().list_mailboxes(&cancel).await.unwrap();

    let names: Vec<_> = mailboxes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["INBOX", "Archive", "Sent"]);
    assert_eq!((mailboxes[0].messages, mailboxes[0].unseen), (2, 2));
    assert_eq!(mailboxes[0].role, Some(SpecialUse::Inbox));
    assert!(!mailboxes[1].selectable);
    assert_eq!(mailboxes[1].messages, 0);
    assert_eq!(mailboxes[2].role, Some(SpecialUse::Sent));
    assert_eq!(mailboxes[2].messages, 1);
    assert_eq!(mailboxes[0].delimiter, Some('/'));

    // No STATUS for the \Noselect container.
    assert_eq!(server.count("STATUS"), 2);
    assert_eq!(server.count("LOGOUT"), 1);
}

#[tokio::test]
async fn empty_store_lists_no_mailboxes() {
    let server = server();
    let mailboxes = server
        .access()
        .list_mailboxes(&CancellationToken::new())
        .await
        .unwrap();
    assert!(mailboxes.is_empty());
}

#[tokio::test]
async fn malformed_list_is_a_protocol_error() {
    let server = inbox();
    server.fault("LIST", Fault::Garbage("* LIST (\\Noselect\r\n"));

    let err = server
        .access()
        .list_mailboxes(&CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(server.count("STATUS"), 0);
}

#[tokio::test]
async fn refused_status_aborts_the_listing() {
    let server = inbox();
    server.fault("STATUS", Fault::No);

    let err = server
        .access()
        .list_mailboxes(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { exchange: Exchange::Status, .. }));
}

// --- index ---

#[tokio::test]
async fn messages_are_listed_newest_first_with_uid_based_ids() {
    let server = inbox();
    let listed = server
        .access()
        .list_messages(&CancellationToken::new(), "INBOX")
        .await
        .unwrap();

    assert_eq!(ids(&listed), [id(2), id(1)]);
    assert_eq!(listed[0].subject.as_deref(), Some("second"));
    assert_eq!(listed[0].from.as_deref(), Some("Ada <ada@example.org>"));
    assert!(!listed[0].flags.seen);
    assert_eq!(
        listed[1].size,
        Some(u32::try_from(plain_message("first", "one").len()).unwrap())
    );
    assert!(listed[0].received > listed[1].received);
}

#[tokio::test]
async fn listing_an_unchanged_mailbox_is_idempotent() {
    let server = inbox().with_message("INBOX", None, "third", &plain_message("third", "3"));
    let access = server.access();
    let cancel = CancellationToken::new();

    let first = access.list_messages(&cancel, "INBOX").await.unwrap();
    let second = access.list_messages(&cancel, "INBOX").await.unwrap();

    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first, second);
}

#[tokio::test]
async fn undated_messages_follow_in_arrival_order() {
    let server = server()
        .with_folder("INBOX", &[], 1700)
        .with_message("INBOX", None, "a", &plain_message("a", "a"))
        .with_message("INBOX", Some("05-Jan-2024 10:00:00 +0100"), "b", &plain_message("b", "b"))
        .with_message("INBOX", None, "c", &plain_message("c", "c"));

    let listed = server
        .access()
        .list_messages(&CancellationToken::new(), "INBOX")
        .await
        .unwrap();

    assert_eq!(ids(&listed), [id(2), id(1), id(3)]);
}

#[tokio::test]
async fn expunge_during_listing_drops_only_the_removed_message() {
    let server = server()
        .with_folder("INBOX", &[], 1700)
        .with_message("INBOX", None, "a", &plain_message("a", "1"))
        .with_message("INBOX", None, "b", &plain_message("b", "2"))
        .with_message("INBOX", None, "c", &plain_message("c", "3"));
    server.fault("UID FETCH", Fault::ExpungeFirstAfter(2));

    let listed = server
        .access()
        .list_messages(&CancellationToken::new(), "INBOX")
        .await
        .unwrap();

    assert_eq!(ids(&listed), vec![id(2), id(3)]);
    assert_eq!(server.uids("INBOX"), vec![2, 3]);
}

#[tokio::test]
async fn empty_mailbox_lists_nothing_without_fetching() {
    let server = server().with_folder("INBOX", &[], 1700);

    let listed = server
        .access()
        .list_messages(&CancellationToken::new(), "INBOX")
        .await
        .unwrap();

    assert!(listed.is_empty());
    assert_eq!(server.count("UID FETCH"), 0);
}

#[tokio::test]
async fn listing_a_missing_mailbox_is_not_found() {
    let server = inbox();

    let err = server
        .access()
        .list_messages(&CancellationToken::new(), "Nope")
        .await
        .unwrap_err();

    assert!(matches!(&err, Error::NotFound { mailbox, id: None } if mailbox == "Nope"));
    assert_eq!(server.count("LOGOUT"), 1);
}

#[tokio::test]
async fn missing_uidvalidity_is_a_protocol_error() {
    let server = inbox();
    server.set_validity("INBOX", 0);

    let err = server
        .access()
        .list_messages(&CancellationToken::new(), "INBOX")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn concurrent_operations_use_separate_connections() {
    let server = inbox();
    let access = server.access();
    let cancel = CancellationToken::new();

    let (a, b) = tokio::join!(
        access.list_messages(&cancel, "INBOX"),
        access.list_mailboxes(&cancel)
    );

    assert_eq!(a.unwrap().len(), 2);
    assert_eq!(b.unwrap().len(), 1);
    assert_eq!(server.connections(), 2);
    server.all_closed().await;
}

// --- body ---

#[tokio::test]
async fn body_is_fetched_with_peek_and_rendered() {
    let server = inbox();

    let body = server
        .access()
        .get_message_body(&CancellationToken::new(), "INBOX", id(2))
        .await
        .unwrap();

    assert_eq!(body.subject.as_deref(), Some("second"));
    assert_eq!(body.text, "two");
    assert!(server.commands().iter().any(|c| c == "UID FETCH 2 (BODY.PEEK[])"));
}

#[tokio::test]
async fn body_in_a_missing_mailbox_is_not_found() {
    let server = inbox();

    let err = server
        .access()
        .get_message_body(&CancellationToken::new(), "nonexistent-mailbox", MessageId::from_raw(1))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn ids_survive_removal_of_other_messages() {
    let server = inbox();
    let access = server.access();
    let cancel = CancellationToken::new();

    let listed = access.list_messages(&cancel, "INBOX").await.unwrap();
    let older = listed[1].id;
    // Another client removes the newer message; sequence numbers shift.
    server.remove("INBOX", 2);

    let body = access.get_message_body(&cancel, "INBOX", older).await.unwrap();
    assert_eq!(body.text, "one");

    access.delete_message(&cancel, "INBOX", older).await.unwrap();
    assert!(server.uids("INBOX").is_empty());
}

#[tokio::test]
async fn ids_from_an_earlier_uidvalidity_do_not_resolve() {
    let server = inbox();
    let access = server.access();
    let cancel = CancellationToken::new();

    let listed = access.list_messages(&cancel, "INBOX").await.unwrap();
    server.set_validity("INBOX", 1701);

    let err = access
        .get_message_body(&cancel, "INBOX", listed[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { id: Some(_), .. }));
}

#[tokio::test]
async fn listed_message_without_body_is_a_protocol_error() {
    let server = inbox();
    server.fault("UID FETCH", Fault::NilBody);

    let err = server
        .access()
        .get_message_body(&CancellationToken::new(), "INBOX", id(1))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { exchange: Exchange::Fetch, .. }));
}

#[tokio::test]
async fn decode_failure_leaves_the_session_usable() {
    let broken = b"Content-Type: text/plain\r\n\
                   Content-Transfer-Encoding: base64\r\n\
                   \r\n\
                   !!!not base64!!!\r\n";
    let server = inbox().with_message("INBOX", None, "broken", broken);
    let cancel = CancellationToken::new();

    let listed = server
        .access()
        .with_session(&cancel, async |session| {
            let err = body::get_message_body(session, "INBOX", id(3)).await.unwrap_err();
            assert!(matches!(err, Error::Decode { id, .. } if id == self::id(3)));
            index::list_messages(session, "INBOX").await
        })
        .await
        .unwrap();

    assert_eq!(listed.len(), 3);
    assert_eq!(server.connections(), 1);
}

// --- deletion ---

#[tokio::test]
async fn deleted_message_disappears_and_no_longer_resolves() {
    let server = inbox();
    let access = server.access();
    let cancel = CancellationToken::new();

    let listed = access.list_messages(&cancel, "INBOX").await.unwrap();
    let (n2, n1) = (listed[0].id, listed[1].id);

    access.delete_message(&cancel, "INBOX", n1).await.unwrap();

    let after = access.list_messages(&cancel, "INBOX").await.unwrap();
    assert_eq!(ids(&after), [n2]);
    let err = access.get_message_body(&cancel, "INBOX", n1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let commands = server.commands();
    assert!(commands.iter().any(|c| c == "UID STORE 1 +FLAGS.SILENT (\\Deleted)"));
    assert!(commands.iter().any(|c| c == "UID EXPUNGE 1"));
}

#[tokio::test]
async fn deleting_an_unknown_id_changes_nothing() {
    let server = inbox();

    let err = server
        .access()
        .delete_message(&CancellationToken::new(), "INBOX", id(42))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(server.count("UID STORE"), 0);
    assert_eq!(server.uids("INBOX"), [1, 2]);
}

#[tokio::test]
async fn plain_expunge_is_used_without_uidplus() {
    let server = inbox().without_uidplus();

    server
        .access()
        .delete_message(&CancellationToken::new(), "INBOX", id(2))
        .await
        .unwrap();

    assert_eq!(server.count("EXPUNGE"), 1);
    assert_eq!(server.count("UID EXPUNGE"), 0);
    assert_eq!(server.uids("INBOX"), [1]);
}

#[tokio::test]
async fn failed_purge_is_a_partial_deletion() {
    let server = inbox();
    server.fault("UID EXPUNGE", Fault::No);

    let err = server
        .access()
        .delete_message(&CancellationToken::new(), "INBOX", id(1))
        .await
        .unwrap_err();

    let Error::PartialDeletion { mailbox, id: failed, source } = err else {
        panic!("expected a partial deletion, got {err:?}");
    };
    assert_eq!((mailbox.as_str(), failed), ("INBOX", id(1)));
    assert_eq!(source.kind(), ErrorKind::Protocol);
    assert!(server.is_flagged_deleted("INBOX", 1));
    assert_eq!(server.uids("INBOX"), [1, 2]);
}

#[tokio::test]
async fn failed_mark_skips_the_purge() {
    let server = inbox();
    server.fault("UID STORE", Fault::No);

    let err = server
        .access()
        .delete_message(&CancellationToken::new(), "INBOX", id(1))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { exchange: Exchange::Store, .. }));
    assert_eq!(server.count("UID EXPUNGE"), 0);
    assert!(!server.is_flagged_deleted("INBOX", 1));
}

#[tokio::test(start_paused = true)]
async fn purge_timeout_is_a_partial_deletion() {
    let server = inbox();
    server.fault("UID EXPUNGE", Fault::Stall);

    let err = server
        .access()
        .delete_message(&CancellationToken::new(), "INBOX", id(1))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PartialDeletion);
    assert!(matches!(
        err,
        Error::PartialDeletion { ref source, .. } if source.kind() == ErrorKind::Timeout
    ));
    server.all_closed().await;
}

#[tokio::test]
async fn cancellation_after_marking_still_purges() {
    let server = inbox();
    let cancel = CancellationToken::new();
    server.fault("UID STORE", Fault::Cancel(cancel.clone()));

    server
        .access()
        .delete_message(&cancel, "INBOX", id(1))
        .await
        .unwrap();

    assert!(cancel.is_cancelled());
    assert_eq!(server.uids("INBOX"), [2]);
}

// --- session lifecycle ---

#[tokio::test]
async fn rejected_credentials_are_a_connection_error_and_still_log_out() {
    let server = inbox();
    let access = MailAccess::new(
        server.clone(),
        Credentials {
            user: "alice".into(),
            pass: "wrong".into(),
        },
        Timeouts::default(),
    );

    let err = access.list_mailboxes(&CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, Error::Connection { exchange: Exchange::Authenticate, .. }));
    assert_eq!(server.count("LIST"), 0);
    assert_eq!(server.count("LOGOUT"), 1);
    server.all_closed().await;
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn credentials_never_reach_the_logs() {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(captured.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    inbox()
        .access()
        .list_messages(&CancellationToken::new(), "INBOX")
        .await
        .unwrap();

    let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(logs.contains("session authenticated"), "{logs}");
    assert!(!logs.contains(USER), "{logs}");
    assert!(!logs.contains(PASS), "{logs}");
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let server = inbox().refusing_connections();

    let err = server
        .access()
        .list_messages(&CancellationToken::new(), "INBOX")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connection { exchange: Exchange::Connect, .. }));
    assert_eq!(server.connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_fetch_times_out_and_drops_the_connection() {
    let server = inbox();
    server.fault("UID FETCH", Fault::Stall);

    let err = server
        .access()
        .list_messages(&CancellationToken::new(), "INBOX")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { exchange: Exchange::Fetch, .. }));
    server.all_closed().await;
    // The stream is out of sync, so no LOGOUT is attempted.
    assert_eq!(server.count("LOGOUT"), 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_login_times_out() {
    let server = inbox();
    server.fault("LOGIN", Fault::Stall);

    let err = server
        .access()
        .list_mailboxes(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { exchange: Exchange::Authenticate, .. }));
    server.all_closed().await;
}

#[tokio::test]
async fn cancelled_operations_never_connect() {
    let server = inbox();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = server.access().list_mailboxes(&cancel).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(server.connections(), 0);
}

#[tokio::test]
async fn cancellation_is_checked_between_exchanges() {
    let server = inbox();
    let cancel = CancellationToken::new();

    let err = server
        .access()
        .with_session(&cancel, async |session| {
            let listed = index::list_messages(session, "INBOX").await?;
            cancel.cancel();
            body::get_message_body(session, "INBOX", listed[0].id).await
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(server.count("UID FETCH"), 1);
    assert_eq!(server.count("LOGOUT"), 1);
    server.all_closed().await;
}

#[tokio::test]
async fn session_tracks_mailbox_switches() {
    let server = inbox().with_folder("Work", &[], 5);

    server
        .access()
        .with_session(&CancellationToken::new(), async |session| {
            assert_eq!(session.state(), SessionState::Authenticated);
            assert_eq!(session.selected_mailbox(), None);

            index::list_messages(session, "INBOX").await?;
            assert_eq!(session.state(), SessionState::SelectedMailbox);
            assert_eq!(session.selected_mailbox(), Some("INBOX"));

            index::list_messages(session, "Work").await?;
            assert_eq!(session.selected_mailbox(), Some("Work"));

            let err = index::list_messages(session, "Nope").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(session.state(), SessionState::Authenticated);
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(server.count("SELECT"), 3);
    assert_eq!(server.count("LOGOUT"), 1);
    server.all_closed().await;
}
