//! Property-based test generators using proptest.
//!
//! Provides strategies for generating keys and records that every backend
//! must accept.

use crate::fixtures::Deployment;
use blobstore_codec::MAX_PROPERTY_BYTES;
use proptest::prelude::*;

/// Strategy for generating keys valid on both backends.
///
/// Keys start with an alphanumeric character, so `.`/`..` and reserved
/// `__*__` names never come up.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9_.-]{0,31}").expect("Invalid regex")
}

/// Strategy for generating sets of distinct keys.
pub fn distinct_keys_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(key_strategy(), 1..=max.max(1))
        .prop_map(|keys| keys.into_iter().collect())
}

/// Strategy for generating non-empty field text, biased towards lengths
/// around the property split threshold.
///
/// Empty strings are left out: the Datastore backend stores them as null,
/// so an empty `Some` comes back as `None`.
pub fn field_text_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "\\PC{1,64}",
        (MAX_PROPERTY_BYTES - 2..MAX_PROPERTY_BYTES + 3).prop_map(|len| "a".repeat(len)),
        (1..4usize).prop_map(|parts| "é".repeat(parts * MAX_PROPERTY_BYTES / 2 + 1)),
        "\\PC{1,4000}",
    ]
}

/// Strategy for generating deployments.
pub fn deployment_strategy() -> impl Strategy<Value = Deployment> {
    (
        "[a-z][a-z0-9-]{0,20}",
        prop_oneof![Just("GCP".to_string()), Just("AWS".to_string()), "\\PC{0,8}"],
        prop::option::of(field_text_strategy()),
    )
        .prop_map(|(name, kind, notes)| Deployment { name, kind, notes })
}
