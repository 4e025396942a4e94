use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mailgate_core::MessageId;

#[derive(Parser, Debug)]
#[command(name = "mailgate", version, about = "Browse and prune an IMAP mailbox")]
pub struct Cli {
    /// Server configuration file (defaults to the user config directory).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List mailboxes with message and unseen counts.
    Mailboxes,
    /// List the messages in a mailbox, newest first.
    Messages { mailbox: String },
    /// Print one message as text.
    Show { mailbox: String, id: MessageId },
    /// Delete and purge one message.
    Delete { mailbox: String, id: MessageId },
}
