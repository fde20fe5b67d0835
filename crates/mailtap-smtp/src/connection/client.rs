//! Type-state SMTP client.
//!
//! Each state only exposes the commands that are legal in it, and every
//! transition consumes the client, so a sequence such as DATA before
//! RCPT TO does not compile.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

use base64::Engine;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::stream::{self, SmtpTlsStream};
use super::ServerInfo;
use crate::command::{Command, frame_data};
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};

/// Longest accepted reply line.
pub const MAX_REPLY_LINE: u64 = 64 * 1024;

/// Greeting read, EHLO possibly sent, not yet authenticated.
#[derive(Debug)]
pub struct Connected;

/// AUTH accepted; a mail transaction may start.
#[derive(Debug)]
pub struct Authenticated;

/// MAIL FROM accepted.
#[derive(Debug)]
pub struct MailTransaction;

/// At least one RCPT TO accepted.
#[derive(Debug)]
pub struct RecipientAdded;

/// DATA accepted with 354; the message body comes next.
#[derive(Debug)]
pub struct Data;

/// SMTP client over stream `S` in protocol state `State`.
pub struct Client<S, State> {
    stream: BufReader<S>,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

impl<S, State> fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("server_info", &self.server_info)
            .field("state", &std::any::type_name::<State>())
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State> {
    /// What the server told us about itself.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn into_state<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn send_command(&mut self, command: &Command) -> Result<Reply> {
        if command.is_sensitive() {
            tracing::debug!("smtp > AUTH [redacted]");
        } else {
            let wire = command.serialize();
            tracing::debug!(command = %String::from_utf8_lossy(&wire).trim_end(), "smtp >");
        }
        self.write_all(&command.serialize()).await?;
        self.read_reply().await
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines = Vec::new();
        loop {
            let mut raw = Vec::new();
            let n = (&mut self.stream)
                .take(MAX_REPLY_LINE)
                .read_until(b'\n', &mut raw)
                .await?;
            if n == 0 {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            if !raw.ends_with(b"\n") {
                return Err(Error::Protocol("reply line too long".into()));
            }

            let line = String::from_utf8_lossy(&raw).trim_end().to_string();
            if line.is_empty() {
                continue;
            }
            let last = is_last_reply_line(&line);
            lines.push(line);
            if last {
                break;
            }
        }

        let reply = parse_reply(&lines)?;
        tracing::debug!(code = reply.code.as_u16(), "smtp <");
        Ok(reply)
    }

    async fn expect(&mut self, command: &Command, code: ReplyCode) -> Result<Reply> {
        let reply = self.send_command(command).await?;
        if reply.code == code || (code == ReplyCode::OK && reply.is_success()) {
            Ok(reply)
        } else {
            Err(Error::rejected(&reply))
        }
    }

    /// Sends QUIT and drops the connection. Available in every state.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects QUIT or the exchange fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(&Command::Quit).await?;
        if reply.is_success() {
            Ok(())
        } else {
            Err(Error::rejected(&reply))
        }
    }
}

impl<S> Client<S, Connected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream and reads the 220 greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is missing or not 220.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut client = Self {
            stream: BufReader::new(stream),
            server_info: ServerInfo::default(),
            _state: PhantomData,
        };

        let greeting = client.read_reply().await?;
        if greeting.code != ReplyCode::SERVICE_READY {
            return Err(Error::rejected(&greeting));
        }

        client.server_info.hostname = greeting
            .message
            .first()
            .and_then(|text| text.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();
        Ok(client)
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects EHLO.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let command = Command::Ehlo {
            hostname: client_hostname.to_string(),
        };
        let reply = self.expect(&command, ReplyCode::OK).await?;

        self.server_info.extensions = reply
            .message
            .iter()
            .skip(1)
            .map(String::as_str)
            .map(Extension::parse)
            .collect::<HashSet<_>>();
        tracing::debug!(extensions = self.server_info.extensions.len(), "ehlo done");
        Ok(self)
    }

    /// Authenticates with AUTH PLAIN and an initial response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server advertises AUTH without
    /// PLAIN, or [`Error::Rejected`] if the credentials are refused.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let mechanisms = self.server_info.auth_mechanisms();
        if self.server_info.advertises_auth() && !mechanisms.contains(&AuthMechanism::Plain) {
            return Err(Error::NotSupported("AUTH PLAIN".into()));
        }

        let token = format!("\0{username}\0{password}");
        let command = Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(base64::engine::general_purpose::STANDARD.encode(token)),
        };
        self.expect(&command, ReplyCode::AUTH_SUCCEEDED).await?;
        tracing::debug!(user = %username, "authenticated");
        Ok(self.into_state())
    }
}

impl Client<TcpStream, Connected> {
    /// Upgrades a plain connection with STARTTLS and repeats EHLO.
    ///
    /// Extensions learned before the upgrade are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not advertised or refused, if the
    /// server sent data past its reply, or if the handshake fails.
    pub async fn starttls(
        mut self,
        server_hostname: &str,
        client_hostname: &str,
    ) -> Result<Client<SmtpTlsStream, Connected>> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }
        self.expect(&Command::StartTls, ReplyCode::SERVICE_READY).await?;
        if !self.stream.buffer().is_empty() {
            return Err(Error::Protocol("data received after STARTTLS reply".into()));
        }

        let tls = stream::upgrade(self.stream.into_inner(), server_hostname).await?;
        let client = Client {
            stream: BufReader::new(tls),
            server_info: ServerInfo {
                hostname: self.server_info.hostname,
                extensions: HashSet::new(),
            },
            _state: PhantomData,
        };
        client.ehlo(client_hostname).await
    }
}

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Starts a transaction with MAIL FROM.
    ///
    /// When the server advertises SIZE, `message_size` is announced and
    /// checked against the limit before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageTooLarge`] when over the limit, or an error if
    /// the server rejects the sender.
    pub async fn mail_from(
        mut self,
        from: &Address,
        message_size: Option<usize>,
    ) -> Result<Client<S, MailTransaction>> {
        if let (Some(size), Some(limit)) = (message_size, self.server_info.max_message_size()) {
            if size > limit {
                return Err(Error::MessageTooLarge { size, limit });
            }
        }

        let command = Command::MailFrom {
            from: from.clone(),
            size: message_size.filter(|_| self.server_info.supports_size()),
        };
        self.expect(&command, ReplyCode::OK).await?;
        Ok(self.into_state())
    }
}

impl<S> Client<S, MailTransaction>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Adds the first recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the recipient.
    pub async fn rcpt_to(mut self, to: &Address) -> Result<Client<S, RecipientAdded>> {
        self.expect(&Command::RcptTo { to: to.clone() }, ReplyCode::OK)
            .await?;
        Ok(self.into_state())
    }
}

impl<S> Client<S, RecipientAdded>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Adds another recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the recipient.
    pub async fn rcpt_to(mut self, to: &Address) -> Result<Self> {
        self.expect(&Command::RcptTo { to: to.clone() }, ReplyCode::OK)
            .await?;
        Ok(self)
    }

    /// Sends DATA and waits for 354.
    ///
    /// # Errors
    ///
    /// Returns an error on any reply other than 354.
    pub async fn data(mut self) -> Result<Client<S, Data>> {
        self.expect(&Command::Data, ReplyCode::START_DATA).await?;
        Ok(self.into_state())
    }
}

impl<S> Client<S, Data>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Transmits the message and the terminating dot.
    ///
    /// The session returns to [`Authenticated`] so another transaction can
    /// follow.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not accept the message.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<S, Authenticated>> {
        tracing::debug!(bytes = message.len(), "smtp > message");
        self.write_all(&frame_data(message)).await?;

        let reply = self.read_reply().await?;
        if !reply.is_success() {
            return Err(Error::rejected(&reply));
        }
        Ok(self.into_state())
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
    use tokio_test::io::Builder;

    use super::*;

    #[tokio::test]
    async fn test_greeting_sets_hostname() {
        let mock = Builder::new().read(b"220 mx.example.com ESMTP ready\r\n").build();
        let client = Client::from_stream(mock).await.unwrap();
        assert_eq!(client.server_info().hostname, "mx.example.com");
    }

    #[tokio::test]
    async fn test_bad_greeting() {
        let mock = Builder::new().read(b"554 go away\r\n").build();
        let err = Client::from_stream(mock).await.unwrap_err();
        assert!(matches!(err, Error::Rejected { code: 554, .. }));
    }

    #[tokio::test]
    async fn test_eof_during_greeting() {
        let mock = Builder::new().build();
        let err = Client::from_stream(mock).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_ehlo_collects_extensions() {
        let mock = Builder::new()
            .read(b"220 mx ready\r\n")
            .write(b"EHLO me\r\n")
            .read(b"250-mx greets me\r\n250-STARTTLS\r\n250-SIZE 100\r\n250 AUTH PLAIN LOGIN\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        let client = client.ehlo("me").await.unwrap();

        let info = client.server_info();
        assert!(info.supports_starttls());
        assert_eq!(info.max_message_size(), Some(100));
        assert_eq!(
            info.auth_mechanisms(),
            vec![AuthMechanism::Plain, AuthMechanism::Login]
        );
    }

    #[tokio::test]
    async fn test_auth_plain_not_offered() {
        let mock = Builder::new()
            .read(b"220 mx ready\r\n")
            .write(b"EHLO me\r\n")
            .read(b"250-mx\r\n250 AUTH CRAM-MD5\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        let client = client.ehlo("me").await.unwrap();

        let err = client.auth_plain("u", "p").await.unwrap_err();
        assert!(matches!(err, Error::NotSupported(_)));
    }

    #[tokio::test]
    async fn test_auth_rejected() {
        let mock = Builder::new()
            .read(b"220 mx ready\r\n")
            .write(b"AUTH PLAIN AHUAcA==\r\n")
            .read(b"535 5.7.8 bad credentials\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();

        let err = client.auth_plain("u", "p").await.unwrap_err();
        assert!(matches!(err, Error::Rejected { code: 535, ref message } if message.contains("bad credentials")));
    }

    #[tokio::test]
    async fn test_size_limit_checked_before_sending() {
        let mock = Builder::new()
            .read(b"220 mx ready\r\n")
            .write(b"EHLO me\r\n")
            .read(b"250-mx\r\n250 SIZE 10\r\n")
            .write(b"AUTH PLAIN AHUAcA==\r\n")
            .read(b"235 ok\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        let client = client.ehlo("me").await.unwrap();
        let client = client.auth_plain("u", "p").await.unwrap();

        let from = Address::new("u@example.com").unwrap();
        let err = client.mail_from(&from, Some(11)).await.unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { size: 11, limit: 10 }));
    }

    #[tokio::test]
    async fn test_data_requires_354() {
        let mock = Builder::new()
            .read(b"220 mx ready\r\n")
            .write(b"AUTH PLAIN AHUAcA==\r\n")
            .read(b"235 ok\r\n")
            .write(b"MAIL FROM:<u@example.com>\r\n")
            .read(b"250 ok\r\n")
            .write(b"RCPT TO:<v@example.com>\r\n")
            .read(b"250 ok\r\n")
            .write(b"DATA\r\n")
            .read(b"554 no valid recipients\r\n")
            .build();
        let client = Client::from_stream(mock).await.unwrap();
        let client = client.auth_plain("u", "p").await.unwrap();
        let client = client
            .mail_from(&Address::new("u@example.com").unwrap(), None)
            .await
            .unwrap();
        let client = client
            .rcpt_to(&Address::new("v@example.com").unwrap())
            .await
            .unwrap();

        let err = client.data().await.unwrap_err();
        assert!(matches!(err, Error::Rejected { code: 554, .. }));
    }
}
