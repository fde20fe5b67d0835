//! Core IMAP types.
//!
//! Flags, identifiers, mailbox data and response codes as they appear on
//! the wire in RFC 3501 (`IMAP4rev1`).

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod sequence;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{SeqNum, Tag, Uid, UidValidity};
pub use mailbox::{ListResponse, Mailbox, MailboxAttribute, MailboxStatus};
pub use response_code::ResponseCode;
pub use sequence::SequenceSet;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_num_new() {
        assert!(SeqNum::new(0).is_none());
        assert!(SeqNum::new(1).is_some());
        assert_eq!(SeqNum::new(42).unwrap().get(), 42);
    }

    #[test]
    fn test_capability_parse() {
        assert_eq!(Capability::parse("IMAP4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("starttls"), Capability::StartTls);
        assert_eq!(
            Capability::parse("AUTH=PLAIN"),
            Capability::Auth("PLAIN".to_string())
        );
        assert_eq!(
            Capability::parse("UNKNOWN"),
            Capability::Unknown("UNKNOWN".to_string())
        );
    }

    #[test]
    fn test_flag_parse() {
        assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
        assert_eq!(Flag::parse("\\FLAGGED"), Flag::Flagged);
        assert_eq!(Flag::parse("custom"), Flag::Keyword("custom".to_string()));
    }

    #[test]
    fn test_sequence_set_display() {
        assert_eq!(SequenceSet::single(1).unwrap().to_string(), "1");
        assert_eq!(SequenceSet::single(4_294_967_295).unwrap().to_string(), "4294967295");
        assert!(SequenceSet::single(0).is_none());
    }

    #[test]
    fn test_mailbox_attribute_round_trip() {
        for raw in ["\\Noselect", "\\HasChildren", "\\Trash", "\\X-Custom"] {
            let attr = MailboxAttribute::parse(raw);
            assert!(attr.as_str().eq_ignore_ascii_case(raw));
        }
    }
}
