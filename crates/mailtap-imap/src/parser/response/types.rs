//! Parsed response data.

use crate::types::{Capability, Flags, ListResponse, ResponseCode, SeqNum, Uid};

/// Server data sent outside of a tagged completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK`
    Ok {
        /// Bracketed response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* NO`
    No {
        /// Bracketed response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* BAD`
    Bad {
        /// Bracketed response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* PREAUTH` greeting.
    PreAuth {
        /// Bracketed response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* BYE`, the server is closing the connection.
    Bye {
        /// Bracketed response code.
        code: Option<ResponseCode>,
        /// Trailing text.
        text: String,
    },
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* FLAGS (...)` for the selected mailbox.
    Flags(Flags),
    /// One `* LIST` line.
    List(ListResponse),
    /// `* SEARCH` result, in server order.
    Search(Vec<SeqNum>),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`
    Expunge(SeqNum),
    /// `* n FETCH (...)`
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Data items in the order the server sent them.
        items: Vec<FetchItem>,
    },
}

/// A single data item from a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// `FLAGS (...)`
    Flags(Flags),
    /// `UID n`
    Uid(Uid),
    /// `RFC822.SIZE n`
    Rfc822Size(u32),
    /// `INTERNALDATE "..."`, unparsed.
    InternalDate(String),
    /// `BODY[section]<origin>` or one of the `RFC822*` forms.
    Body {
        /// Section text between the brackets, if any.
        section: Option<String>,
        /// Partial fetch origin.
        origin: Option<u32>,
        /// Payload; `None` when the server sent `NIL`.
        data: Option<Vec<u8>>,
    },
}

impl FetchItem {
    /// Returns the payload of a body item.
    #[must_use]
    pub fn body_data(&self) -> Option<&[u8]> {
        match self {
            Self::Body { data, .. } => data.as_deref(),
            _ => None,
        }
    }
}
