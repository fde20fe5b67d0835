//! `mailtap` - read and send mail from the terminal.
//!
//! Each invocation loads the credential record, opens at most one IMAP
//! session, runs one command and logs out.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod render;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use mailtap_core::{MailboxSession, ReadOutcome, credentials, ops, run_scoped, send};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let record = credentials::load(cli.credentials.as_deref())?;
    debug!(account = %record.address, command = ?cli.command, "starting");

    match cli.command {
        Command::Inbox { limit, unread } => {
            let filter = cli::status_filter(unread);
            let session = MailboxSession::connect(&record).await?;
            let listing = run_scoped(session, async |s| {
                ops::list_recent(s, filter, limit.get()).await
            })
            .await?;
            render::inbox(&mut io::stdout().lock(), &listing, filter)?;
        }
        Command::Read { id } => {
            let session = MailboxSession::connect(&record).await?;
            let outcome = run_scoped(session, async |s| ops::read_one(s, id).await).await?;
            let mut out = io::stdout().lock();
            match outcome {
                ReadOutcome::Found(message) => render::message(&mut out, &message)?,
                ReadOutcome::NotFound => render::not_found(&mut out, id)?,
            }
        }
        Command::Send(args) => {
            let message = args.message();
            send::send(&record, &message).await?;
            render::sent(&mut io::stdout().lock(), &message)?;
        }
        Command::Search(args) => {
            let query = args.query();
            let session = MailboxSession::connect(&record).await?;
            let listing = run_scoped(session, async |s| {
                ops::search(s, &query, args.limit.get()).await
            })
            .await?;
            render::search(&mut io::stdout().lock(), &listing)?;
        }
        Command::Folders => {
            let session = MailboxSession::connect(&record).await?;
            let folders = run_scoped(session, async |s| ops::folders(s).await).await?;
            render::folders(&mut io::stdout().lock(), &folders)?;
        }
        Command::Count => {
            let session = MailboxSession::connect(&record).await?;
            let count = run_scoped(session, async |s| ops::count(s).await).await?;
            render::count(&mut io::stdout().lock(), count)?;
        }
    }
    Ok(())
}

