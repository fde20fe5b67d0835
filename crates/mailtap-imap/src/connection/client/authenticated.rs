//! Mailbox commands shared by the logged-in states.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authed, Authenticated, Selected};
use super::{Client, check_tagged_ok, tagged_status, untagged};
use crate::command::Command;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{ListResponse, Mailbox, MailboxStatus, ResponseCode, Status};
use crate::{Error, Result};

/// Result of SELECT.
#[derive(Debug)]
pub enum SelectOutcome<S> {
    /// The mailbox is open.
    Selected(Client<S, Selected>, MailboxStatus),
    /// The server answered NO or BAD; no mailbox is selected any more.
    Rejected(Client<S, Authenticated>, String),
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
    State: Authed,
{
    /// Opens `mailbox`. The server may still grant read-only access.
    pub async fn select(mut self, mailbox: &str) -> Result<SelectOutcome<S>> {
        let command = Command::Select {
            mailbox: Mailbox::new(mailbox),
        };
        let (responses, tag) = self.execute(&command).await?;

        match tagged_status(&responses, &tag)? {
            (Status::Ok, _) => {
                let status = parse_mailbox_status(&responses);
                tracing::debug!(exists = status.exists, "mailbox opened");
                Ok(SelectOutcome::Selected(self.into_state(), status))
            }
            (Status::No | Status::Bad, text) => {
                tracing::debug!(text = %text, "mailbox rejected");
                Ok(SelectOutcome::Rejected(self.into_state(), text))
            }
            (_, text) => Err(Error::Bye(text)),
        }
    }

    /// Lists mailboxes under `reference` matching `pattern`.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let (responses, tag) = self
            .execute(&Command::List {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;
        check_tagged_ok(&responses, &tag)?;

        Ok(untagged(&responses)
            .filter_map(|u| match u {
                UntaggedResponse::List(item) => Some(item),
                _ => None,
            })
            .collect())
    }
}

/// Folds the untagged data of a SELECT into a status snapshot.
pub(crate) fn parse_mailbox_status(responses: &[Vec<u8>]) -> MailboxStatus {
    let mut status = MailboxStatus::default();

    for response in untagged(responses) {
        match response {
            UntaggedResponse::Exists(n) => status.exists = n,
            UntaggedResponse::Recent(n) => status.recent = n,
            UntaggedResponse::Flags(flags) => status.flags = flags,
            UntaggedResponse::Ok {
                code: Some(code), ..
            } => match code {
                ResponseCode::UidValidity(v) => status.uid_validity = Some(v),
                ResponseCode::UidNext(uid) => status.uid_next = Some(uid),
                ResponseCode::Unseen(seq) => status.unseen = Some(seq),
                ResponseCode::ReadOnly => status.read_only = true,
                _ => {}
            },
            _ => {}
        }
    }

    // Servers usually report read-only access on the completion line
    status.read_only |= responses.iter().any(|bytes| {
        matches!(
            ResponseParser::parse(bytes),
            Ok(Response::Tagged {
                code: Some(ResponseCode::ReadOnly),
                ..
            })
        )
    });
    status
}
