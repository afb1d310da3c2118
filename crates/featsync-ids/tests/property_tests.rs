//! Property tests for featsync-ids
//!
//! Tag extraction must keep every issue key tag and drop everything else.

use featsync_ids::{IssueKey, is_issue_key_tag, issue_keys_in};
use proptest::prelude::*;

fn key_tag() -> impl Strategy<Value = String> {
    ("[A-Z]{3,6}", 0u32..100_000).prop_map(|(p, n)| format!("{p}-{n}"))
}

fn plain_tag() -> impl Strategy<Value = String> {
    "[a-z][a-z_]{0,12}"
}

proptest! {
    /// Every generated key tag survives extraction, in order.
    #[test]
    fn prop_keys_are_kept_in_order(keys in proptest::collection::vec(key_tag(), 0..6),
                                   plain in proptest::collection::vec(plain_tag(), 0..6)) {
        let mut tags = Vec::new();
        for (i, k) in keys.iter().enumerate() {
            tags.push(k.clone());
            if let Some(p) = plain.get(i) {
                tags.push(p.clone());
            }
        }
        let extracted = issue_keys_in(&tags);
        let expected: Vec<IssueKey> = keys.iter().map(IssueKey::new).collect();
        prop_assert_eq!(extracted, expected);
    }

    /// Lowercase label tags are never mistaken for keys.
    #[test]
    fn prop_plain_tags_are_dropped(plain in proptest::collection::vec(plain_tag(), 0..10)) {
        prop_assert!(issue_keys_in(&plain).is_empty());
    }

    /// Strict parsing agrees with the tag pattern on well-formed keys.
    #[test]
    fn prop_strict_parse_accepts_key_tags(tag in key_tag()) {
        prop_assert!(is_issue_key_tag(&tag));
        let parsed: IssueKey = tag.parse().unwrap();
        prop_assert_eq!(parsed.to_string(), tag);
    }
}
