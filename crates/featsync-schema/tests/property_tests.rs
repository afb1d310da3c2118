//! Property tests for featsync-schema
//!
//! Label deltas must be symmetric and reproduce the local set when applied.

use featsync_schema::LabelDelta;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn labels() -> impl Strategy<Value = BTreeSet<String>> {
    proptest::collection::btree_set("[a-z]{1,6}", 0..8)
}

proptest! {
    /// add then remove on the remote set gives back the local set.
    #[test]
    fn prop_delta_reproduces_local(local in labels(), remote in labels()) {
        let delta = LabelDelta::between(&local, &remote);
        prop_assert_eq!(delta.apply_to(&remote), local);
    }

    /// Swapping sides swaps add and remove.
    #[test]
    fn prop_delta_is_symmetric(local in labels(), remote in labels()) {
        let forward = LabelDelta::between(&local, &remote);
        let backward = LabelDelta::between(&remote, &local);
        prop_assert_eq!(&forward.add, &backward.remove);
        prop_assert_eq!(&forward.remove, &backward.add);
    }

    /// Equal sets never produce a delta.
    #[test]
    fn prop_equal_sets_are_empty(local in labels()) {
        prop_assert!(LabelDelta::between(&local, &local).is_empty());
    }
}
