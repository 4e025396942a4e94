//! In-process IMAP server used to drive `MailAccess` end to end.
//!
//! Each connection runs on a `tokio::io::duplex` pipe served by a spawned
//! task. The server understands exactly the commands the access layer
//! sends and records every command line (without its tag).

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use mailgate_core::{Connector, Credentials, MailAccess, Timeouts};
use mailgate_imap::{Client, NotAuthenticated};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio_util::sync::CancellationToken;

/// Injected misbehaviour, keyed by command (`"SELECT"`, `"UID FETCH"`, ...).
#[derive(Debug, Clone)]
pub enum Fault {
    /// Tagged `NO`.
    No,
    /// Tagged `BAD`.
    Bad,
    /// Never answer.
    Stall,
    /// Send these raw lines, then a tagged `OK`.
    Garbage(&'static str),
    /// Answer `BODY[] NIL` to body fetches.
    NilBody,
    /// Cancel the token, then answer normally.
    Cancel(CancellationToken),
    /// While answering a UID FETCH, remove the first message of the mailbox
    /// after this many FETCH lines and report it with `* 1 EXPUNGE`.
    ExpungeFirstAfter(usize),
}

#[derive(Debug, Clone)]
pub struct Message {
    pub uid: u32,
    pub flags: Vec<String>,
    pub internal_date: Option<String>,
    pub subject: String,
    pub raw: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Folder {
    pub name: String,
    pub attributes: Vec<String>,
    /// Zero means the server omits UIDVALIDITY.
    pub validity: u32,
    pub next_uid: u32,
    pub messages: Vec<Message>,
}

#[derive(Debug, Default)]
struct Store {
    folders: Vec<Folder>,
    uidplus: bool,
    refuse: bool,
    faults: HashMap<String, Fault>,
    commands: Vec<String>,
    connections: usize,
    open: usize,
}

#[derive(Debug, Clone)]
pub struct FakeServer(Arc<Mutex<Store>>);

pub const USER: &str = "alice";
pub const PASS: &str = "secret";

pub fn server() -> FakeServer {
    FakeServer(Arc::new(Mutex::new(Store {
        uidplus: true,
        ..Store::default()
    })))
}

/// A small RFC 5322 message.
pub fn plain_message(subject: &str, body: &str) -> Vec<u8> {
    format!(
        "From: Ada <ada@example.org>\r\nTo: bob@example.org\r\nSubject: {subject}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\r\n{body}\r\n"
    )
    .into_bytes()
}

impl FakeServer {
    fn store(&self) -> MutexGuard<'_, Store> {
        self.0.lock().unwrap()
    }

    pub fn with_folder(self, name: &str, attributes: &[&str], validity: u32) -> Self {
        self.store().folders.push(Folder {
            name: name.to_string(),
            attributes: attributes.iter().map(|a| (*a).to_string()).collect(),
            validity,
            next_uid: 1,
            messages: Vec::new(),
        });
        self
    }

    /// Appends a message and returns the server for chaining; UIDs count up from 1.
    pub fn with_message(self, folder: &str, date: Option<&str>, subject: &str, raw: &[u8]) -> Self {
        {
            let mut store = self.store();
            let folder = store.folders.iter_mut().find(|f| f.name == folder).unwrap();
            let uid = folder.next_uid;
            folder.next_uid += 1;
            folder.messages.push(Message {
                uid,
                flags: Vec::new(),
                internal_date: date.map(str::to_string),
                subject: subject.to_string(),
                raw: raw.to_vec(),
            });
        }
        self
    }

    pub fn without_uidplus(self) -> Self {
        self.store().uidplus = false;
        self
    }

    pub fn refusing_connections(self) -> Self {
        self.store().refuse = true;
        self
    }

    pub fn fault(&self, command: &str, fault: Fault) {
        self.store().faults.insert(command.to_string(), fault);
    }

    pub fn clear_faults(&self) {
        self.store().faults.clear();
    }

    pub fn set_validity(&self, folder: &str, validity: u32) {
        let mut store = self.store();
        store.folders.iter_mut().find(|f| f.name == folder).unwrap().validity = validity;
    }

    /// Removes a message behind the client's back, as another client would.
    pub fn remove(&self, folder: &str, uid: u32) {
        let mut store = self.store();
        let folder = store.folders.iter_mut().find(|f| f.name == folder).unwrap();
        folder.messages.retain(|m| m.uid != uid);
    }

    pub fn uids(&self, folder: &str) -> Vec<u32> {
        let store = self.store();
        let folder = store.folders.iter().find(|f| f.name == folder).unwrap();
        folder.messages.iter().map(|m| m.uid).collect()
    }

    pub fn is_flagged_deleted(&self, folder: &str, uid: u32) -> bool {
        let store = self.store();
        let folder = store.folders.iter().find(|f| f.name == folder).unwrap();
        folder
            .messages
            .iter()
            .any(|m| m.uid == uid && m.flags.iter().any(|f| f == "\\Deleted"))
    }

    pub fn commands(&self) -> Vec<String> {
        self.store().commands.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.store()
            .commands
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn connections(&self) -> usize {
        self.store().connections
    }

    /// Waits until every server-side connection has ended.
    pub async fn all_closed(&self) {
        for _ in 0..1000 {
            if self.store().open == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("connections still open");
    }

    pub fn access(&self) -> MailAccess<Self> {
        self.access_with(Timeouts {
            connect_secs: 5,
            command_secs: 5,
            logout_secs: 2,
        })
    }

    pub fn access_with(&self, timeouts: Timeouts) -> MailAccess<Self> {
        MailAccess::new(
            self.clone(),
            Credentials {
                user: USER.to_string(),
                pass: PASS.to_string(),
            },
            timeouts,
        )
    }

    fn capabilities(&self) -> &'static str {
        if self.store().uidplus {
            "IMAP4rev1 UIDPLUS"
        } else {
            "IMAP4rev1"
        }
    }

    async fn serve(self, stream: DuplexStream) {
        {
            let mut store = self.store();
            store.connections += 1;
            store.open += 1;
        }

        let (read, mut write) = tokio::io::split(stream);
        let mut lines = BufReader::new(read).lines();
        let greeting = format!("* OK [CAPABILITY {}] fake ready\r\n", self.capabilities());
        let mut selected: Option<String> = None;

        if write.write_all(greeting.as_bytes()).await.is_ok() {
            while let Ok(Some(line)) = lines.next_line().await {
                match self.handle(&line, &mut selected) {
                    Reply::Send(bytes) => {
                        if write.write_all(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Reply::Stall => {}
                    Reply::Close(bytes) => {
                        let _ = write.write_all(&bytes).await;
                        let _ = write.shutdown().await;
                        break;
                    }
                }
            }
        }

        self.store().open -= 1;
    }

    fn handle(&self, line: &str, selected: &mut Option<String>) -> Reply {
        let args = tokenize(line);
        let tag = args[0].clone();
        let verb = args[1].to_ascii_uppercase();
        let key = if verb == "UID" {
            format!("UID {}", args[2].to_ascii_uppercase())
        } else {
            verb.clone()
        };

        let fault = {
            let mut store = self.store();
            store.commands.push(line[tag.len() + 1..].to_string());
            store.faults.get(&key).cloned()
        };

        let mut out = String::new();
        let mut body_fault = false;
        let mut expunge_after = None;
        match fault {
            Some(Fault::No) => return Reply::text(format!("{tag} NO [UNAVAILABLE] injected\r\n")),
            Some(Fault::Bad) => return Reply::text(format!("{tag} BAD injected\r\n")),
            Some(Fault::Stall) => return Reply::Stall,
            Some(Fault::Garbage(raw)) => {
                return Reply::text(format!("{raw}{tag} OK done\r\n"));
            }
            Some(Fault::NilBody) => body_fault = true,
            Some(Fault::Cancel(token)) => token.cancel(),
            Some(Fault::ExpungeFirstAfter(n)) => expunge_after = Some(n),
            None => {}
        }

        let mut store = self.store();
        let uidplus = store.uidplus;
        match key.as_str() {
            "CAPABILITY" => {
                out.push_str(&format!("* CAPABILITY {}\r\n", if uidplus { "IMAP4rev1 UIDPLUS" } else { "IMAP4rev1" }));
            }
            "LOGIN" => {
                if args[2] != USER || args[3] != PASS {
                    return Reply::text(format!("{tag} NO [AUTHENTICATIONFAILED] bad credentials\r\n"));
                }
            }
            "LIST" => {
                for folder in &store.folders {
                    out.push_str(&format!(
                        "* LIST ({}) \"/\" {}\r\n",
                        folder.attributes.join(" "),
                        quote(&folder.name)
                    ));
                }
            }
            "STATUS" => {
                let Some(folder) = store.folders.iter().find(|f| f.name == args[2]) else {
                    return Reply::text(format!("{tag} NO [NONEXISTENT] no such mailbox\r\n"));
                };
                let unseen = folder
                    .messages
                    .iter()
                    .filter(|m| !m.flags.iter().any(|f| f == "\\Seen"))
                    .count();
                out.push_str(&format!(
                    "* STATUS {} (MESSAGES {} UNSEEN {unseen})\r\n",
                    quote(&folder.name),
                    folder.messages.len()
                ));
            }
            "SELECT" => {
                let Some(folder) = store.folders.iter().find(|f| f.name == args[2]) else {
                    *selected = None;
                    return Reply::text(format!("{tag} NO [NONEXISTENT] no such mailbox\r\n"));
                };
                if folder.attributes.iter().any(|a| a == "\\Noselect") {
                    *selected = None;
                    return Reply::text(format!("{tag} NO not selectable\r\n"));
                }
                out.push_str("* FLAGS (\\Seen \\Answered \\Flagged \\Deleted \\Draft)\r\n");
                out.push_str(&format!("* {} EXISTS\r\n* 0 RECENT\r\n", folder.messages.len()));
                if folder.validity != 0 {
                    out.push_str(&format!("* OK [UIDVALIDITY {}] ok\r\n", folder.validity));
                }
                out.push_str(&format!("* OK [UIDNEXT {}] ok\r\n", folder.next_uid));
                *selected = Some(folder.name.clone());
                return Reply::text(format!("{out}{tag} OK [READ-WRITE] selected\r\n"));
            }
            "UID FETCH" => {
                let folder = selected_folder(&mut store, selected.as_deref());
                let set = args[3].clone();
                let items = line.split_once(&format!(" {set} ")).map_or("", |(_, items)| items);
                let mut bytes = out.into_bytes();
                let mut sent = 0;
                let mut removed = 0;
                for (index, message) in folder.messages.iter().enumerate() {
                    if !in_set(&set, message.uid) {
                        continue;
                    }
                    if removed == 0 && expunge_after == Some(sent) {
                        bytes.extend_from_slice(b"* 1 EXPUNGE\r\n");
                        removed = 1;
                    }
                    let seq = index + 1 - removed;
                    bytes.extend_from_slice(&fetch_response(seq, message, items, body_fault));
                    sent += 1;
                }
                if removed == 1 {
                    folder.messages.remove(0);
                }
                bytes.extend_from_slice(format!("{tag} OK fetched\r\n").as_bytes());
                return Reply::Send(bytes);
            }
            "UID STORE" => {
                let folder = selected_folder(&mut store, selected.as_deref());
                let uid: u32 = args[3].parse().unwrap();
                if let Some(message) = folder.messages.iter_mut().find(|m| m.uid == uid) {
                    if !message.flags.iter().any(|f| f == "\\Deleted") {
                        message.flags.push("\\Deleted".to_string());
                    }
                }
            }
            "UID EXPUNGE" => {
                let folder = selected_folder(&mut store, selected.as_deref());
                let set = args[3].clone();
                out.push_str(&expunge(folder, |m| in_set(&set, m.uid)));
            }
            "EXPUNGE" => {
                let folder = selected_folder(&mut store, selected.as_deref());
                out.push_str(&expunge(folder, |_| true));
            }
            "LOGOUT" => {
                return Reply::Close(format!("* BYE fake closing\r\n{tag} OK logout\r\n").into_bytes());
            }
            _ => return Reply::text(format!("{tag} BAD unknown command\r\n")),
        }

        Reply::text(format!("{out}{tag} OK done\r\n"))
    }
}

enum Reply {
    Send(Vec<u8>),
    Stall,
    Close(Vec<u8>),
}

impl Reply {
    fn text(text: String) -> Self {
        Self::Send(text.into_bytes())
    }
}

impl Connector for FakeServer {
    type Stream = DuplexStream;

    fn connect(
        &self,
    ) -> impl Future<Output = mailgate_imap::Result<Client<DuplexStream, NotAuthenticated>>> + Send
    {
        let server = self.clone();
        async move {
            if server.store().refuse {
                return Err(mailgate_imap::Error::Io(io::Error::from(
                    io::ErrorKind::ConnectionRefused,
                )));
            }
            let (client_end, server_end) = tokio::io::duplex(1 << 16);
            tokio::spawn(server.serve(server_end));
            Client::from_stream(client_end).await
        }
    }
}

fn selected_folder<'a>(store: &'a mut Store, selected: Option<&str>) -> &'a mut Folder {
    let name = selected.expect("command requires a selected mailbox");
    store.folders.iter_mut().find(|f| f.name == name).unwrap()
}

fn in_set(set: &str, uid: u32) -> bool {
    match set.split_once(':') {
        Some((start, "*")) => uid >= start.parse().unwrap(),
        Some((start, end)) => (start.parse().unwrap()..=end.parse().unwrap()).contains(&uid),
        None => set.split(',').any(|n| n.parse() == Ok(uid)),
    }
}

/// Removes messages flagged `\Deleted` that match, answering EXPUNGE lines.
fn expunge(folder: &mut Folder, matches: impl Fn(&Message) -> bool) -> String {
    let mut out = String::new();
    let mut seq = 1;
    folder.messages.retain(|m| {
        let remove = matches(m) && m.flags.iter().any(|f| f == "\\Deleted");
        if remove {
            out.push_str(&format!("* {seq} EXPUNGE\r\n"));
        } else {
            seq += 1;
        }
        !remove
    });
    out
}

fn fetch_response(seq: usize, message: &Message, items: &str, nil_body: bool) -> Vec<u8> {
    let mut parts = vec![format!("UID {}", message.uid)];
    if items.contains("FLAGS") {
        parts.push(format!("FLAGS ({})", message.flags.join(" ")));
    }
    if items.contains("INTERNALDATE") {
        if let Some(date) = &message.internal_date {
            parts.push(format!("INTERNALDATE \"{date}\""));
        }
    }
    if items.contains("RFC822.SIZE") {
        parts.push(format!("RFC822.SIZE {}", message.raw.len()));
    }
    if items.contains("ENVELOPE") {
        parts.push(format!(
            "ENVELOPE (NIL {} ((\"Ada\" NIL \"ada\" \"example.org\")) NIL NIL NIL NIL NIL NIL NIL)",
            quote(&message.subject)
        ));
    }

    let mut out = format!("* {seq} FETCH ({}", parts.join(" ")).into_bytes();
    if items.contains("BODY.PEEK[]") {
        if nil_body {
            out.extend_from_slice(b" BODY[] NIL");
        } else {
            out.extend_from_slice(format!(" BODY[] {{{}}}\r\n", message.raw.len()).as_bytes());
            out.extend_from_slice(&message.raw);
        }
    }
    out.extend_from_slice(b")\r\n");
    out
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Splits a command line on spaces, keeping quoted strings whole (unquoted).
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    let mut quoted = false;
    while let Some(c) = chars.next() {
        match c {
            '"' => quoted = !quoted,
            '\\' if quoted => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ' ' if !quoted => tokens.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    tokens.push(current);
    tokens
}
