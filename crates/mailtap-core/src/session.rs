//! Authenticated mailbox session.
//!
//! [`MailboxSession`] wraps the type-state IMAP client in a single value
//! that tracks whether a folder is selected, so command code can hold one
//! `&mut` handle instead of threading client states through every call.
//! [`run_scoped`] is the only way commands use a session: it logs out after
//! the work finishes, whether the work succeeded or not.

use mailtap_imap::{
    Authenticated, Client, FetchAttribute, FetchItem, FetchItems, Flags, ImapStream,
    SearchCriteria, SelectOutcome, Selected, SequenceSet,
};
use secrecy::ExposeSecret;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::credentials::CredentialRecord;
use crate::error::{Error, Result};

/// Header fields fetched for listings.
pub const ENVELOPE_FIELDS: [&str; 4] = ["FROM", "TO", "SUBJECT", "DATE"];

enum State<S> {
    Authenticated(Client<S, Authenticated>),
    Selected(Client<S, Selected>, String),
    /// The connection failed mid-command; nothing more can be sent.
    Broken,
}

/// A logged-in connection with at most one selected folder.
pub struct MailboxSession<S = ImapStream> {
    state: State<S>,
}

impl<S> std::fmt::Debug for MailboxSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxSession")
            .field("selected", &self.selected_folder())
            .finish_non_exhaustive()
    }
}

/// Raw header block and flags of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFetch {
    /// Header bytes as returned by the server.
    pub raw: Vec<u8>,
    /// Flags at fetch time.
    pub flags: Flags,
}

impl MailboxSession<ImapStream> {
    /// Connects over implicit TLS and logs in with the record's address.
    ///
    /// # Errors
    ///
    /// [`Error::Connect`] for network, TLS or greeting failures and
    /// [`Error::Auth`] when the login is refused.
    pub async fn connect(record: &CredentialRecord) -> Result<Self> {
        debug!(server = %record.imap, "connecting");
        let stream = mailtap_imap::connect_tls(&record.imap.host, record.imap.port)
            .await
            .map_err(|e| Error::Connect(format!("{}: {e}", record.imap)))?;
        Self::open(stream, &record.address, record.password.expose_secret()).await
    }
}

impl<S> MailboxSession<S> {
    /// The selected folder, if any.
    #[must_use]
    pub fn selected_folder(&self) -> Option<&str> {
        match &self.state {
            State::Selected(_, name) => Some(name),
            State::Authenticated(_) | State::Broken => None,
        }
    }
}

impl<S> MailboxSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the greeting from an established stream and logs in.
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] when the server rejects the credentials, otherwise
    /// [`Error::Connect`].
    pub async fn open(stream: S, address: &str, password: &str) -> Result<Self> {
        let client = Client::from_stream(stream)
            .await
            .map_err(|e| Error::Connect(e.to_string()))?;

        let client = client.login(address, password).await.map_err(|e| match e {
            mailtap_imap::Error::No(text)
            | mailtap_imap::Error::Bad(text)
            | mailtap_imap::Error::Auth(text) => Error::Auth(text),
            other => Error::Connect(other.to_string()),
        })?;
        debug!(user = %address, "logged in");

        Ok(Self {
            state: State::Authenticated(client),
        })
    }

    /// Selects `folder`, replacing any current selection.
    ///
    /// # Errors
    ///
    /// [`Error::FolderNotFound`] when the server refuses; the session is
    /// then unselected but still usable. [`Error::Protocol`] when the
    /// connection fails.
    pub async fn select_folder(&mut self, folder: &str) -> Result<()> {
        let outcome = match std::mem::replace(&mut self.state, State::Broken) {
            State::Authenticated(client) => client.select(folder).await,
            State::Selected(client, _) => client.select(folder).await,
            State::Broken => return Err(broken()),
        }?;

        match outcome {
            SelectOutcome::Selected(client, status) => {
                debug!(folder = %folder, exists = status.exists, "folder selected");
                self.state = State::Selected(client, folder.to_string());
                Ok(())
            }
            SelectOutcome::Rejected(client, reason) => {
                self.state = State::Authenticated(client);
                Err(Error::FolderNotFound {
                    folder: folder.to_string(),
                    reason,
                })
            }
        }
    }

    /// Runs SEARCH in the selected folder; ids come back ascending and
    /// without duplicates.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] without a selected folder or when SEARCH fails.
    pub async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<u32>> {
        let client = self.selected()?;
        let mut ids: Vec<u32> = client
            .search(criteria)
            .await
            .map_err(Error::from)?
            .into_iter()
            .map(|seq| seq.get())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        debug!(matches = ids.len(), "search done");
        Ok(ids)
    }

    /// Fetches the envelope header fields and flags without marking the
    /// message seen. `None` when the server returns nothing for `id`.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] without a selected folder or when FETCH fails.
    pub async fn fetch_headers(&mut self, id: u32) -> Result<Option<HeaderFetch>> {
        let Some(sequence) = SequenceSet::single(id) else {
            return Ok(None);
        };
        let items = FetchItems::Items(vec![
            FetchAttribute::Flags,
            FetchAttribute::header_fields(&ENVELOPE_FIELDS),
        ]);

        let client = self.selected()?;
        let fetched = client.fetch(&sequence, items).await?;

        let mut found: Option<HeaderFetch> = None;
        for item in fetched
            .into_iter()
            .filter(|(seq, _)| seq.get() == id)
            .flat_map(|(_, items)| items)
        {
            let entry = found.get_or_insert_with(|| HeaderFetch {
                raw: Vec::new(),
                flags: Flags::new(),
            });
            match item {
                FetchItem::Flags(flags) => entry.flags = flags,
                FetchItem::Body {
                    data: Some(data), ..
                } => entry.raw = data,
                _ => {}
            }
        }
        Ok(found)
    }

    /// Fetches the whole message with `RFC822`, which marks it seen.
    ///
    /// `None` for id 0, when the server returns no data, or when it answers
    /// NO or BAD.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] without a selected folder or when the connection
    /// fails.
    pub async fn fetch_full(&mut self, id: u32) -> Result<Option<Vec<u8>>> {
        let Some(sequence) = SequenceSet::single(id) else {
            return Ok(None);
        };

        let client = self.selected()?;
        let fetched = match client.fetch(&sequence, FetchAttribute::Rfc822.into()).await {
            Ok(fetched) => fetched,
            Err(e) if e.is_rejection() => {
                debug!(id, error = %e, "fetch refused");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(fetched
            .into_iter()
            .filter(|(seq, _)| seq.get() == id)
            .flat_map(|(_, items)| items)
            .find_map(|item| match item {
                FetchItem::Body {
                    section: None,
                    data: Some(data),
                    ..
                } => Some(data),
                _ => None,
            }))
    }

    /// Lists every folder as `(attributes) "delimiter" name`.
    ///
    /// Works with or without a selected folder.
    ///
    /// # Errors
    ///
    /// [`Error::Protocol`] when LIST fails.
    pub async fn list_folders(&mut self) -> Result<Vec<String>> {
        let folders = match &mut self.state {
            State::Authenticated(client) => client.list("", "*").await?,
            State::Selected(client, _) => client.list("", "*").await?,
            State::Broken => return Err(broken()),
        };
        Ok(folders.iter().map(ToString::to_string).collect())
    }

    /// Sends LOGOUT. Failures are logged and otherwise ignored.
    pub async fn logout(self) {
        let result = match self.state {
            State::Authenticated(client) => client.logout().await,
            State::Selected(client, _) => client.logout().await,
            State::Broken => {
                debug!("connection already broken, skipping logout");
                return;
            }
        };
        match result {
            Ok(()) => debug!("logged out"),
            Err(e) => warn!(error = %e, "logout failed"),
        }
    }

    fn selected(&mut self) -> Result<&mut Client<S, Selected>> {
        match &mut self.state {
            State::Selected(client, _) => Ok(client),
            State::Authenticated(_) => Err(Error::Protocol("no folder selected".to_string())),
            State::Broken => Err(broken()),
        }
    }
}

fn broken() -> Error {
    Error::Protocol("connection lost".to_string())
}

/// Runs `work` against `session`, then logs out exactly once.
///
/// The result of `work` is returned unchanged; logout failures never
/// replace it.
///
/// # Errors
///
/// Whatever `work` returns.
pub async fn run_scoped<S, T, F>(mut session: MailboxSession<S>, work: F) -> Result<T>
where
    S: AsyncRead + AsyncWrite + Unpin,
    F: AsyncFnOnce(&mut MailboxSession<S>) -> Result<T>,
{
    let result = work(&mut session).await;
    session.logout().await;
    result
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
    use tokio_test::io::Builder;

    use super::*;

    const GREETING: &[u8] = b"* OK IMAP4rev1 ready\r\n";

    #[tokio::test]
    async fn test_open_maps_login_refusal_to_auth() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN me@example.com wrong\r\n")
            .read(b"A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .build();

        let err = MailboxSession::open(mock, "me@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Auth(ref text) if text == "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_open_maps_bad_greeting_to_connect() {
        let mock = Builder::new().read(b"* BYE overloaded\r\n").build();
        let err = MailboxSession::open(mock, "u", "p").await.unwrap_err();
        assert!(matches!(err, Error::Connect(_)));
    }

    #[tokio::test]
    async fn test_search_requires_selection() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN u p\r\n")
            .read(b"A0000 OK done\r\n")
            .build();

        let mut session = MailboxSession::open(mock, "u", "p").await.unwrap();
        assert_eq!(session.selected_folder(), None);
        let err = session.search(&SearchCriteria::All).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_fetch_zero_sends_nothing() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN u p\r\n")
            .read(b"A0000 OK done\r\n")
            .build();

        let mut session = MailboxSession::open(mock, "u", "p").await.unwrap();
        assert_eq!(session.fetch_full(0).await.unwrap(), None);
        assert_eq!(session.fetch_headers(0).await.unwrap(), None);
    }
}
