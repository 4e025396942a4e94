//! `mailgate` - command-line front end for the mailbox access layer.
//!
//! Stands in for the HTTP façade: each subcommand maps to one access
//! operation and opens its own IMAP session.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mailgate_core::{MailAccess, ServerConfig};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailgate=info,mailgate_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = err
                .downcast_ref::<mailgate_core::Error>()
                .map_or("error", |e| e.kind().as_str());
            eprintln!("{kind}: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = match cli.config {
        Some(path) => path,
        None => ServerConfig::default_path()?,
    };
    let config = ServerConfig::load(&path)
        .with_context(|| format!("loading {}", path.display()))?;
    config.validate()?;
    info!(host = %config.imap.host, "using {}", path.display());

    let access = MailAccess::from_config(&config);
    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    match cli.command {
        Command::Mailboxes => print_json(&access.list_mailboxes(&cancel).await?),
        Command::Messages { mailbox } => {
            print_json(&access.list_messages(&cancel, &mailbox).await?)
        }
        Command::Show { mailbox, id } => {
            let body = access.get_message_body(&cancel, &mailbox, id).await?;
            println!("{body}");
            Ok(())
        }
        Command::Delete { mailbox, id } => {
            access.delete_message(&cancel, &mailbox, id).await?;
            println!("deleted {id} from {mailbox}");
            Ok(())
        }
    }
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("interrupted, cancelling");
        cancel.cancel();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
