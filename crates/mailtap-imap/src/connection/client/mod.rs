//! Type-state client.
//!
//! ```text
//! NotAuthenticated --login--> Authenticated --select--> Selected
//!                                   ^                     |
//!                                   +-- SELECT rejected --+
//! ```
//!
//! Every state can log out. A rejected SELECT hands back an
//! `Authenticated` client so the caller can still end the session cleanly.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::authenticated::SelectOutcome;
pub use self::states::{Authed, Authenticated, NotAuthenticated, Selected};
use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// IMAP connection in protocol state `State`.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    _state: PhantomData<State>,
}

impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Capabilities last advertised by the server.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns true if `cap` was advertised.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Sends NOOP.
    pub async fn noop(&mut self) -> Result<()> {
        let (responses, tag) = self.execute(&Command::Noop).await?;
        check_tagged_ok(&responses, &tag)
    }

    /// Asks for and stores the capability list.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        let (responses, tag) = self.execute(&Command::Capability).await?;
        check_tagged_ok(&responses, &tag)?;
        self.absorb_capabilities(&responses);
        Ok(self.capabilities.clone())
    }

    /// Sends LOGOUT and waits for the completion.
    ///
    /// The server may drop the connection right after its BYE, so failures
    /// while reading the completion are not reported.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tag_gen.next();
        self.stream
            .write_command(&Command::Logout.serialize(&tag))
            .await?;
        tracing::debug!(tag = %tag, "LOGOUT");

        if let Err(e) = self.stream.read_until_tagged(&tag).await {
            tracing::debug!(?e, "connection ended before LOGOUT completed");
        }
        Ok(())
    }

    /// Sends `command` under a fresh tag and collects every response up to
    /// and including the tagged completion.
    ///
    /// Literal arguments are held back until the server sends `+`. A tagged
    /// completion instead of `+` ends the command early.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<(Vec<Vec<u8>>, String)> {
        let tag = self.tag_gen.next();
        if command.is_sensitive() {
            tracing::debug!(tag = %tag, "sending credentials");
        } else {
            tracing::debug!(tag = %tag, ?command, "sending command");
        }

        let wire = command.encode(&tag);
        let mut responses = Vec::new();
        for (i, chunk) in wire.chunks().enumerate() {
            if i > 0 && !self.await_continuation(&tag, &mut responses).await? {
                return Ok((responses, tag));
            }
            self.stream.write_command(chunk).await?;
        }

        responses.extend(self.stream.read_until_tagged(&tag).await?);
        Ok((responses, tag))
    }

    /// Reads until a continuation request (`true`) or the completion for
    /// `tag` (`false`). Anything else is kept in `responses`.
    async fn await_continuation(
        &mut self,
        tag: &str,
        responses: &mut Vec<Vec<u8>>,
    ) -> Result<bool> {
        loop {
            let response = self.stream.read_response().await?;
            match ResponseParser::parse(&response) {
                Ok(Response::Continuation { .. }) => return Ok(true),
                Ok(Response::Tagged { tag: done, .. }) if done.as_str() == tag => {
                    responses.push(response);
                    return Ok(false);
                }
                _ => responses.push(response),
            }
        }
    }

    /// Picks up capabilities from `* CAPABILITY` or a `[CAPABILITY ...]` code.
    pub(crate) fn absorb_capabilities(&mut self, responses: &[Vec<u8>]) {
        for bytes in responses {
            match ResponseParser::parse(bytes) {
                Ok(
                    Response::Untagged(UntaggedResponse::Capability(caps))
                    | Response::Untagged(UntaggedResponse::Ok {
                        code: Some(ResponseCode::Capability(caps)),
                        ..
                    })
                    | Response::Tagged {
                        code: Some(ResponseCode::Capability(caps)),
                        ..
                    },
                ) => self.capabilities = caps,
                _ => {}
            }
        }
    }

    /// Moves the connection into another protocol state.
    pub(crate) fn into_state<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            _state: PhantomData,
        }
    }
}

/// Finds the completion for `tag` and returns its status and text.
pub(crate) fn tagged_status(responses: &[Vec<u8>], tag: &str) -> Result<(Status, String)> {
    responses
        .iter()
        .rev()
        .find_map(|bytes| match ResponseParser::parse(bytes) {
            Ok(Response::Tagged {
                tag: resp_tag,
                status,
                text,
                ..
            }) if resp_tag.as_str() == tag => Some((status, text)),
            _ => None,
        })
        .ok_or_else(|| Error::Protocol("missing tagged response".to_string()))
}

/// Maps a non-OK completion to the matching error.
pub(crate) fn check_tagged_ok(responses: &[Vec<u8>], tag: &str) -> Result<()> {
    match tagged_status(responses, tag)? {
        (Status::Ok | Status::PreAuth, _) => Ok(()),
        (Status::No, text) => Err(Error::No(text)),
        (Status::Bad, text) => Err(Error::Bad(text)),
        (Status::Bye, text) => Err(Error::Bye(text)),
    }
}

/// Collects the untagged responses that parse; the rest are skipped.
pub(crate) fn untagged(responses: &[Vec<u8>]) -> impl Iterator<Item = UntaggedResponse> + '_ {
    responses.iter().filter_map(|bytes| match ResponseParser::parse(bytes) {
        Ok(Response::Untagged(u)) => Some(u),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(?e, "skipping unparseable response");
            None
        }
    })
}
