#![allow(dead_code)]

use proptest::prelude::*;

/// Strategy for generating identifiers usable on either side of a key
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,11}"
}

/// Strategy for generating (owner_id, target_id) pairs
pub fn key_parts_strategy() -> impl Strategy<Value = (String, String)> {
    (identifier_strategy(), identifier_strategy())
}

/// Strategy for a cache layout: distinct keys, each assigned to one of a few
/// shared handler instances by index
pub fn shared_layout_strategy() -> impl Strategy<Value = (usize, Vec<((String, String), usize)>)> {
    (1usize..=6).prop_flat_map(|instances| {
        (
            Just(instances),
            prop::collection::btree_map(key_parts_strategy(), 0..instances, 1..24)
                .prop_map(|layout| layout.into_iter().collect::<Vec<_>>()),
        )
    })
}
