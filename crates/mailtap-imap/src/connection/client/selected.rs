//! Commands that need a selected mailbox.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::Selected;
use super::{Client, check_tagged_ok, untagged};
use crate::Result;
use crate::command::{Command, FetchItems, SearchCriteria};
use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{SeqNum, SequenceSet};

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs SEARCH and returns matching sequence numbers in server order.
    pub async fn search(&mut self, criteria: &SearchCriteria) -> Result<Vec<SeqNum>> {
        let (responses, tag) = self
            .execute(&Command::Search {
                criteria: criteria.clone(),
            })
            .await?;
        check_tagged_ok(&responses, &tag)?;

        let mut ids = Vec::new();
        for response in untagged(&responses) {
            if let UntaggedResponse::Search(found) = response {
                ids.extend(found);
            }
        }
        Ok(ids)
    }

    /// Runs FETCH and returns one entry per FETCH response received.
    ///
    /// Unsolicited FETCH responses for other messages (flag updates, for
    /// example) are included; callers filter by sequence number.
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: FetchItems,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        let (responses, tag) = self
            .execute(&Command::Fetch {
                sequence: sequence.clone(),
                items,
            })
            .await?;
        check_tagged_ok(&responses, &tag)?;

        Ok(untagged(&responses)
            .filter_map(|u| match u {
                UntaggedResponse::Fetch { seq, items } => Some((seq, items)),
                _ => None,
            })
            .collect())
    }
}
