//! Command operations over an open session.
//!
//! Each operation takes `&mut MailboxSession` so it can run inside
//! [`crate::run_scoped`]. Read-only operations work on INBOX.

use mailtap_imap::SearchCriteria;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::error::Result;
use crate::model::{FullMessage, MessageEnvelope, parse_envelope, parse_full};
use crate::query::{SearchQuery, StatusFilter};
use crate::session::MailboxSession;

/// Folder every read operation selects.
pub const INBOX: &str = "INBOX";

/// Result of a listing or search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Nothing matched.
    Empty,
    /// Matching envelopes, newest first.
    Messages(Vec<MessageEnvelope>),
}

/// Result of reading one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The message, parsed.
    Found(Box<FullMessage>),
    /// No message has that id.
    NotFound,
}

/// Message totals for INBOX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageCount {
    /// All messages.
    pub total: usize,
    /// Messages without `\Seen`.
    pub unread: usize,
}

/// The last `limit` ids, reversed so the newest comes first.
#[must_use]
pub fn newest_first(ids: &[u32], limit: usize) -> Vec<u32> {
    ids.iter().rev().take(limit).copied().collect()
}

/// Lists the newest `limit` messages matching `filter`.
///
/// # Errors
///
/// Fails if INBOX cannot be selected or the session breaks.
pub async fn list_recent<S>(
    session: &mut MailboxSession<S>,
    filter: StatusFilter,
    limit: usize,
) -> Result<Listing>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.select_folder(INBOX).await?;
    let ids = session.search(&filter.criteria()).await?;
    envelopes(session, &ids, limit).await
}

/// Runs a structured search and lists the newest `limit` matches.
///
/// # Errors
///
/// Fails if INBOX cannot be selected or the session breaks.
pub async fn search<S>(
    session: &mut MailboxSession<S>,
    query: &SearchQuery,
    limit: usize,
) -> Result<Listing>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.select_folder(INBOX).await?;
    let ids = session.search(&query.criteria()).await?;
    envelopes(session, &ids, limit).await
}

/// Fetches and parses message `id`.
///
/// # Errors
///
/// Fails if INBOX cannot be selected or the session breaks; a missing
/// message is [`ReadOutcome::NotFound`].
pub async fn read_one<S>(session: &mut MailboxSession<S>, id: u32) -> Result<ReadOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.select_folder(INBOX).await?;
    Ok(match session.fetch_full(id).await? {
        Some(raw) => ReadOutcome::Found(Box::new(parse_full(&raw))),
        None => ReadOutcome::NotFound,
    })
}

/// Counts all and unread messages.
///
/// # Errors
///
/// Fails if INBOX cannot be selected or the session breaks.
pub async fn count<S>(session: &mut MailboxSession<S>) -> Result<MessageCount>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.select_folder(INBOX).await?;
    let total = session.search(&SearchCriteria::All).await?.len();
    let unread = session.search(&SearchCriteria::Unseen).await?.len();
    Ok(MessageCount { total, unread })
}

/// Lists every folder; nothing is selected.
///
/// # Errors
///
/// Fails if LIST fails.
pub async fn folders<S>(session: &mut MailboxSession<S>) -> Result<Vec<String>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.list_folders().await
}

async fn envelopes<S>(
    session: &mut MailboxSession<S>,
    ids: &[u32],
    limit: usize,
) -> Result<Listing>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut rows = Vec::new();
    for id in newest_first(ids, limit) {
        match session.fetch_headers(id).await? {
            Some(fetched) => rows.push(parse_envelope(id, &fetched.raw, &fetched.flags)),
            None => debug!(id, "message vanished before its headers were fetched"),
        }
    }

    // Every match may have been expunged between SEARCH and FETCH
    Ok(if rows.is_empty() {
        Listing::Empty
    } else {
        Listing::Messages(rows)
    })
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
    use super::*;

    #[test]
    fn test_newest_first() {
        assert_eq!(newest_first(&[1, 2, 3, 4, 5], 3), vec![5, 4, 3]);
        assert_eq!(newest_first(&[1, 2], 20), vec![2, 1]);
        assert!(newest_first(&[], 5).is_empty());
    }
}
