//! Command-line arguments.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use mailtap_core::{OutgoingMessage, SearchQuery, StatusFilter, parse_since};

/// Read and send mail from the terminal.
#[derive(Parser, Debug)]
#[command(name = "mailtap", version, about)]
pub struct Cli {
    /// Credential file to use instead of the default search path.
    #[arg(long, global = true, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Log protocol steps to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the newest inbox messages.
    Inbox {
        /// Number of messages.
        #[arg(short = 'n', long, default_value = "20")]
        limit: NonZeroUsize,
        /// Unread only.
        #[arg(short, long)]
        unread: bool,
    },
    /// Print one message.
    Read {
        /// Sequence number shown by `inbox` or `search`.
        id: u32,
    },
    /// Send a plain-text message.
    Send(SendArgs),
    /// Search the inbox.
    Search(SearchArgs),
    /// List mailbox folders.
    Folders,
    /// Count total and unread messages.
    Count,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Recipient.
    #[arg(long)]
    pub to: String,
    /// Cc recipients, comma-separated.
    #[arg(long)]
    pub cc: Option<String>,
    /// Subject line.
    #[arg(long)]
    pub subject: String,
    /// Message body.
    #[arg(long)]
    pub body: String,
}

impl SendArgs {
    pub fn message(&self) -> OutgoingMessage {
        OutgoingMessage {
            to: self.to.clone(),
            cc: self.cc.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// From address contains.
    #[arg(long)]
    pub from: Option<String>,
    /// Subject contains.
    #[arg(long)]
    pub subject: Option<String>,
    /// Message text contains.
    #[arg(long)]
    pub text: Option<String>,
    /// Received on or after (DD-Mon-YYYY).
    #[arg(long, value_parser = parse_since)]
    pub since: Option<NaiveDate>,
    /// Max results.
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: NonZeroUsize,
}

impl SearchArgs {
    pub fn query(&self) -> SearchQuery {
        SearchQuery {
            from: self.from.clone(),
            subject: self.subject.clone(),
            since: self.since,
            text: self.text.clone(),
        }
    }
}

pub const fn status_filter(unread: bool) -> StatusFilter {
    if unread {
        StatusFilter::Unread
    } else {
        StatusFilter::All
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_inbox_defaults() {
        let cli = Cli::try_parse_from(["mailtap", "inbox"]).unwrap();
        let Command::Inbox { limit, unread } = cli.command else {
            panic!("expected inbox");
        };
        assert_eq!(limit.get(), 20);
        assert!(!unread);
        assert!(cli.credentials.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mailtap",
            "inbox",
            "-n",
            "5",
            "-u",
            "-v",
            "--credentials",
            "/tmp/creds.json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.credentials, Some(PathBuf::from("/tmp/creds.json")));
        assert!(matches!(cli.command, Command::Inbox { unread: true, .. }));
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(Cli::try_parse_from(["mailtap", "inbox", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["mailtap", "search", "--limit", "0"]).is_err());
    }

    #[test]
    fn test_search_since() {
        let cli = Cli::try_parse_from(["mailtap", "search", "--from", "alice", "--since", "05-Mar-2024"])
            .unwrap();
        let Command::Search(args) = cli.command else {
            panic!("expected search");
        };
        let query = args.query();
        assert_eq!(query.from.as_deref(), Some("alice"));
        assert_eq!(query.since, NaiveDate::from_ymd_opt(2024, 3, 5));

        assert!(Cli::try_parse_from(["mailtap", "search", "--since", "2024-03-05"]).is_err());
    }

    #[test]
    fn test_send_requires_fields() {
        assert!(Cli::try_parse_from(["mailtap", "send", "--to", "a@x.org"]).is_err());

        let cli = Cli::try_parse_from([
            "mailtap", "send", "--to", "a@x.org", "--cc", "b@x.org", "--subject", "s", "--body", "b",
        ])
        .unwrap();
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.message().recipients(), vec!["a@x.org", "b@x.org"]);
    }

    #[test]
    fn test_read_id() {
        let cli = Cli::try_parse_from(["mailtap", "read", "42"]).unwrap();
        assert!(matches!(cli.command, Command::Read { id: 42 }));
        assert!(Cli::try_parse_from(["mailtap", "read", "abc"]).is_err());
    }
}
