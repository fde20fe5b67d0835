//! Property tests for listing order and lenient parsing.

#![allow(clippy::unwrap_used)]

use mailtap_core::ops::newest_first;
use mailtap_core::{DateField, send::OutgoingMessage};
use proptest::prelude::*;

proptest! {
    #[test]
    fn newest_first_takes_the_tail(
        ids in proptest::collection::btree_set(1u32..10_000, 0..80),
        limit in 1usize..40,
    ) {
        let ids: Vec<u32> = ids.into_iter().collect();
        let picked = newest_first(&ids, limit);

        prop_assert_eq!(picked.len(), ids.len().min(limit));
        prop_assert!(picked.windows(2).all(|w| w[0] > w[1]));
        if let Some(first) = picked.first() {
            prop_assert_eq!(Some(first), ids.last());
        }
    }

    #[test]
    fn date_parsing_never_panics(raw in ".{0,60}") {
        let date = DateField::parse(&raw);
        prop_assert_eq!(date.raw(), raw.as_str());
        prop_assert!(date.display().chars().count() <= 20);
    }

    #[test]
    fn recipients_are_never_blank(to in "[a-z@., ]{0,40}", cc in proptest::option::of("[a-z@., ]{0,40}")) {
        let message = OutgoingMessage { to, cc, subject: String::new(), body: String::new() };
        for recipient in message.recipients() {
            prop_assert!(!recipient.is_empty());
            prop_assert_eq!(recipient.trim(), recipient.as_str());
            prop_assert!(!recipient.contains(','));
        }
    }
}
