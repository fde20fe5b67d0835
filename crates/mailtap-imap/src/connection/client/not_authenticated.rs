//! Greeting and login.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, NotAuthenticated};
use super::{Client, check_tagged_ok};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting from a freshly connected stream.
    ///
    /// A `BYE` greeting is an error. Capabilities carried in the greeting's
    /// response code are remembered.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_response().await?;
        let capabilities = match ResponseParser::parse(&greeting)? {
            Response::Untagged(
                UntaggedResponse::Ok { code, .. } | UntaggedResponse::PreAuth { code, .. },
            ) => match code {
                Some(ResponseCode::Capability(caps)) => caps,
                _ => Vec::new(),
            },
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        };
        tracing::debug!(?capabilities, "greeting received");

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            _state: std::marker::PhantomData,
        })
    }

    /// Logs in with LOGIN.
    ///
    /// Fails with [`Error::Auth`] without sending anything if the server
    /// advertised `LOGINDISABLED`, and with [`Error::No`] / [`Error::Bad`]
    /// if the server rejects the credentials.
    pub async fn login(mut self, username: &str, password: &str) -> Result<Client<S, Authenticated>> {
        if self.has_capability(&Capability::LoginDisabled) {
            return Err(Error::Auth("server has disabled LOGIN".to_string()));
        }

        let (responses, tag) = self
            .execute(&Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        check_tagged_ok(&responses, &tag)?;

        self.absorb_capabilities(&responses);
        Ok(self.into_state())
    }
}
