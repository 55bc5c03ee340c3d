//! Property tests for `Bytes` sharing, encodings and search.

mod common;

use common::{init_test_logging, test_proptest_config};
use iocore::bytes::{Base64Options, ByteMatcher, Bytes};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=512)
}

fn arb_base64_options() -> impl Strategy<Value = Base64Options> {
    prop_oneof![
        Just(Base64Options::STANDARD),
        Just(Base64Options::URL_SAFE),
        Just(Base64Options::OMIT_TRAILING_EQUALS),
        Just(Base64Options::URL_SAFE | Base64Options::OMIT_TRAILING_EQUALS),
    ]
}

#[derive(Debug, Clone)]
enum Mutation {
    Append(Vec<u8>),
    Prepend(Vec<u8>),
    Insert(usize, Vec<u8>),
    Remove(usize, usize),
    SetByte(usize, u8),
    Truncate(usize),
}

fn arb_mutation() -> impl Strategy<Value = Mutation> {
    let small = prop::collection::vec(any::<u8>(), 1..=16);
    prop_oneof![
        small.clone().prop_map(Mutation::Append),
        small.clone().prop_map(Mutation::Prepend),
        (0usize..64, small).prop_map(|(i, d)| Mutation::Insert(i, d)),
        (0usize..64, 1usize..16).prop_map(|(p, n)| Mutation::Remove(p, n)),
        (0usize..64, any::<u8>()).prop_map(|(i, b)| Mutation::SetByte(i, b)),
        (0usize..64).prop_map(Mutation::Truncate),
    ]
}

fn apply(bytes: &mut Bytes, mutation: &Mutation) {
    match mutation {
        Mutation::Append(data) => {
            bytes.append(data);
        }
        Mutation::Prepend(data) => {
            bytes.prepend(data);
        }
        Mutation::Insert(index, data) => {
            bytes.insert(*index, data);
        }
        Mutation::Remove(pos, len) => {
            bytes.remove(*pos, *len);
        }
        Mutation::SetByte(index, byte) => {
            if *index < bytes.len() {
                bytes.at_mut(*index).set(*byte);
            } else {
                bytes.push(*byte);
            }
        }
        Mutation::Truncate(len) => bytes.truncate(*len),
    }
}

/// Mutations that store bytes; narrowing a view may keep sharing.
fn writes_bytes(mutation: &Mutation) -> bool {
    matches!(
        mutation,
        Mutation::Append(_) | Mutation::Prepend(_) | Mutation::Insert(..) | Mutation::SetByte(..)
    )
}

fn naive_index_of(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ============================================================================
// Sharing Invariant
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(256))]

    /// Mutating a clone never changes the original.
    #[test]
    fn clone_mutation_leaves_original(data in arb_payload(), mutation in arb_mutation()) {
        init_test_logging();
        let original = Bytes::from(data.clone());
        let mut copy = original.clone();
        prop_assert!(copy.is_shared_with(&original) || original.is_empty());

        apply(&mut copy, &mutation);
        prop_assert_eq!(&original[..], &data[..]);
        if writes_bytes(&mutation) {
            prop_assert!(!copy.is_shared_with(&original));
        }
    }

    /// Views keep sharing until written.
    #[test]
    fn views_detach_on_write(data in prop::collection::vec(any::<u8>(), 8..=256), at in 1usize..8) {
        init_test_logging();
        let whole = Bytes::from(data.clone());
        let mut tail = whole.mid(at, None);
        prop_assert!(tail.is_shared_with(&whole));
        tail.push(0);
        prop_assert_eq!(&whole[..], &data[..]);
        prop_assert_eq!(&tail[..tail.len() - 1], &data[at..]);
    }
}

// ============================================================================
// Encoding Round-Trips
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(500))]

    #[test]
    fn hex_round_trip(data in arb_payload()) {
        init_test_logging();
        let bytes = Bytes::from(data);
        let encoded = bytes.to_hex();
        prop_assert_eq!(encoded.len(), bytes.len() * 2);
        let decoded = Bytes::from_hex(&encoded).expect("valid hex");
        prop_assert_eq!(decoded, bytes);
    }

    #[test]
    fn base64_round_trip(data in arb_payload(), options in arb_base64_options()) {
        init_test_logging();
        let bytes = Bytes::from(data);
        let encoded = bytes.to_base64(options);
        let decoded = Bytes::from_base64(&encoded, options).expect("valid base64");
        prop_assert_eq!(decoded, bytes);
    }

    #[test]
    fn percent_round_trip(data in arb_payload()) {
        init_test_logging();
        let bytes = Bytes::from(data);
        let encoded = bytes.to_percent_encoding(b"", b"", b'%');
        prop_assert!(encoded.iter().all(u8::is_ascii));
        prop_assert_eq!(Bytes::from_percent_encoding(&encoded, b'%'), bytes);
    }
}

// ============================================================================
// Search
// ============================================================================

proptest! {
    #![proptest_config(test_proptest_config(500))]

    #[test]
    fn matcher_agrees_with_naive_search(
        haystack in prop::collection::vec(0u8..4, 0..=300),
        needle in prop::collection::vec(0u8..4, 1..=6),
    ) {
        init_test_logging();
        let matcher = ByteMatcher::new(&needle);
        prop_assert_eq!(matcher.index_in(&haystack, 0), naive_index_of(&haystack, &needle));
        let bytes = Bytes::from(haystack.clone());
        prop_assert_eq!(bytes.contains(&needle), naive_index_of(&haystack, &needle).is_some());
    }
}
