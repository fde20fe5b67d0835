//! Property tests for the response parser.

#![allow(clippy::unwrap_used)]

use mailtap_imap::{Response, ResponseParser, UntaggedResponse};
use proptest::prelude::*;

proptest! {
    #[test]
    fn parser_never_panics(input in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = ResponseParser::parse(&input);
    }

    #[test]
    fn search_ids_survive(ids in proptest::collection::vec(1u32..100_000, 0..50)) {
        let line = format!(
            "* SEARCH {}\r\n",
            ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
        );
        let parsed = ResponseParser::parse(line.as_bytes()).unwrap();
        let Response::Untagged(UntaggedResponse::Search(found)) = parsed else {
            panic!("expected SEARCH");
        };
        prop_assert_eq!(found.iter().map(|s| s.get()).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn literal_bodies_are_preserved(body in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut line = format!("* 1 FETCH (RFC822 {{{}}}\r\n", body.len()).into_bytes();
        line.extend_from_slice(&body);
        line.extend_from_slice(b")\r\n");

        let parsed = ResponseParser::parse(&line).unwrap();
        let Response::Untagged(UntaggedResponse::Fetch { items, .. }) = parsed else {
            panic!("expected FETCH");
        };
        prop_assert_eq!(items[0].body_data(), Some(body.as_slice()));
    }
}
