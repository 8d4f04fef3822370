//! Property-based tests for tuple encoding, key arithmetic and batching.
//!
//! These tests verify the invariants callers rely on when using packed tuples
//! as keys in an ordered store:
//!
//! 1. **Roundtrip**: unpack(pack(x)) == x for all valid tuples
//! 2. **Ordering**: pack(a) < pack(b) iff a < b (lexicographic preservation)
//! 3. **Prefix stability**: pack(a) is a prefix of pack(a ++ b) for any b
//! 4. **Value equality**: integers equal by value hash equally, whatever their width
//! 5. **Coverage**: batches tile their range exactly once
//!
//! # References
//!
//! - [FoundationDB Tuple Layer](https://github.com/apple/foundationdb/blob/main/design/tuple.md)
//! - [Proptest Guide](https://proptest-rs.github.io/proptest/proptest/index.html)

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use proptest::prelude::*;

use crate::Element;
use crate::Tuple;
use crate::batch::batched;
use crate::batch::batched_workers;
use crate::keyspace::strinc;
use crate::keyspace::successor;

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Strategy for generating non-nested Element values.
fn arb_leaf() -> impl Strategy<Value = Element> {
    prop_oneof![
        Just(Element::Null),
        // Small strings (most common case)
        "[a-zA-Z0-9_]{0,20}".prop_map(Element::String),
        // Arbitrary text, including embedded nulls and multi-byte characters
        ".*".prop_map(Element::String),
        prop::collection::vec(any::<u8>(), 0..50).prop_map(Element::Bytes),
        // Integers across the full range
        any::<i64>().prop_map(Element::Int),
        any::<u64>().prop_map(Element::UInt),
        // Small integers (common case)
        (-1000i64..1000i64).prop_map(Element::Int),
        any::<bool>().prop_map(Element::Bool),
        any::<f32>().prop_map(Element::Float),
        any::<f64>().prop_map(Element::Double),
    ]
}

/// Strategy for generating elements, including nested tuples a few levels deep.
fn arb_element() -> impl Strategy<Value = Element> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(|items| Element::from(Tuple::from_elements(items)))
    })
}

/// Strategy for generating tuples with 0-5 elements.
fn arb_tuple() -> impl Strategy<Value = Tuple> {
    prop::collection::vec(arb_element(), 0..5).prop_map(Tuple::from_elements)
}

/// Strategy for generating simple string tuples (for ordering tests).
fn arb_string_tuple() -> impl Strategy<Value = Tuple> {
    prop::collection::vec("[a-z]{1,5}", 1..4)
        .prop_map(|strings| strings.into_iter().map(Element::String).collect::<Tuple>())
}

/// Strategy for integer elements of either signedness.
fn arb_int_element() -> impl Strategy<Value = Element> {
    prop_oneof![any::<i64>().prop_map(Element::Int), any::<u64>().prop_map(Element::UInt),]
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// Property: pack followed by unpack is identity (roundtrip).
    #[test]
    fn prop_roundtrip(tuple in arb_tuple()) {
        let packed = tuple.pack();
        let unpacked = Tuple::unpack(&packed).expect("unpack should succeed");
        prop_assert_eq!(&tuple, &unpacked, "roundtrip failed");
        prop_assert_eq!(unpacked.pack(), packed, "repacking changed the bytes");
    }

    /// Property: Integer encoding preserves numeric ordering across signedness.
    #[test]
    fn prop_int_ordering(a in arb_int_element(), b in arb_int_element()) {
        let packed_a = Tuple::from_elements(vec![a.clone()]).pack();
        let packed_b = Tuple::from_elements(vec![b.clone()]).pack();

        match a.as_i128().cmp(&b.as_i128()) {
            Ordering::Less => prop_assert!(packed_a < packed_b, "ordering failed: {} < {} but {:?} >= {:?}", a, b, packed_a, packed_b),
            Ordering::Greater => prop_assert!(packed_a > packed_b, "ordering failed: {} > {} but {:?} <= {:?}", a, b, packed_a, packed_b),
            Ordering::Equal => prop_assert_eq!(packed_a, packed_b),
        }
    }

    /// Property: Double encoding preserves numeric ordering for non-NaN values.
    #[test]
    fn prop_double_ordering(a in any::<f64>(), b in any::<f64>()) {
        prop_assume!(!a.is_nan() && !b.is_nan());
        let packed_a = Tuple::new().push(a).pack();
        let packed_b = Tuple::new().push(b).pack();

        match a.total_cmp(&b) {
            Ordering::Less => prop_assert!(packed_a < packed_b),
            Ordering::Greater => prop_assert!(packed_a > packed_b),
            Ordering::Equal => prop_assert_eq!(packed_a, packed_b),
        }
    }

    /// Property: String encoding preserves ordering.
    #[test]
    fn prop_string_ordering(a in "[a-z\\x00]{0,10}", b in "[a-z\\x00]{0,10}") {
        let packed_a = Tuple::new().push(&a as &str).pack();
        let packed_b = Tuple::new().push(&b as &str).pack();

        match a.cmp(&b) {
            Ordering::Less => prop_assert!(packed_a < packed_b, "ordering failed: {:?} < {:?} but packed {:?} >= {:?}", a, b, packed_a, packed_b),
            Ordering::Greater => prop_assert!(packed_a > packed_b),
            Ordering::Equal => prop_assert_eq!(packed_a, packed_b),
        }
    }

    /// Property: Tuple ordering is lexicographic by element.
    #[test]
    fn prop_tuple_ordering(a in arb_string_tuple(), b in arb_string_tuple()) {
        let packed_a = a.pack();
        let packed_b = b.pack();

        // Compare tuples element by element
        let mut expected = Ordering::Equal;
        for (elem_a, elem_b) in a.iter().zip(b.iter()) {
            match elem_a.cmp(elem_b) {
                Ordering::Equal => continue,
                ord => {
                    expected = ord;
                    break;
                }
            }
        }

        // If all compared elements are equal, shorter tuple comes first
        if expected == Ordering::Equal {
            expected = a.len().cmp(&b.len());
        }

        match expected {
            Ordering::Less => prop_assert!(packed_a < packed_b, "tuple ordering failed"),
            Ordering::Greater => prop_assert!(packed_a > packed_b),
            Ordering::Equal => prop_assert_eq!(packed_a, packed_b),
        }
    }

    /// Property: Element ordering agrees with the ordering of packed bytes.
    #[test]
    fn prop_element_order_matches_bytes(a in arb_element(), b in arb_element()) {
        prop_assert_eq!(a.cmp(&b), a.pack().cmp(&b.pack()));
    }

    /// Property: Prefix stability and prefix-first ordering.
    ///
    /// If tuple A is a prefix of tuple B (A ++ C = B), then pack(A) is a
    /// prefix of pack(B) and A sorts strictly before B.
    #[test]
    fn prop_prefix_stability(prefix in arb_tuple(), suffix in arb_tuple()) {
        prop_assume!(!suffix.is_empty());
        let packed_prefix = prefix.pack();
        let combined = prefix.concat(&suffix);
        let packed_combined = combined.pack();

        prop_assert!(
            packed_combined.starts_with(&packed_prefix),
            "prefix stability violated: packed prefix {:?} is not a prefix of packed combined {:?}",
            packed_prefix,
            packed_combined
        );
        prop_assert!(prefix < combined);
    }

    /// Property: Range queries capture all strict extensions of a prefix.
    #[test]
    fn prop_range_captures_prefix(prefix in arb_string_tuple(), suffix in arb_tuple()) {
        prop_assume!(!suffix.is_empty());
        let (start, end) = prefix.range();
        let key = prefix.concat(&suffix).pack();

        prop_assert!(
            key >= start && key < end,
            "range query failed: key {:?} not in range [{:?}, {:?})",
            key,
            start,
            end
        );
        prop_assert!(prefix.pack() < start, "range must exclude the prefix itself");
    }

    /// Property: prefix_end bounds every key that starts with the packed tuple.
    #[test]
    fn prop_prefix_end_bounds_extensions(prefix in arb_string_tuple(), suffix in arb_tuple()) {
        let end = prefix.prefix_end().expect("non-empty string tuple has a prefix end");
        let key = prefix.concat(&suffix).pack();
        prop_assert!(key < end);
    }

    /// Property: Integers equal by value are equal and hash equally,
    /// whatever Rust type produced them.
    #[test]
    fn prop_cross_width_equality(n in 0i64..=i64::MAX, m in any::<i32>()) {
        let signed = Tuple::of((n, m));
        let unsigned = Tuple::of((n.unsigned_abs(), i64::from(m)));
        prop_assert_eq!(&signed, &unsigned);
        prop_assert_eq!(hash_of(&signed), hash_of(&unsigned));

        let decoded = Tuple::unpack(&unsigned.pack()).expect("unpack should succeed");
        prop_assert_eq!(hash_of(&decoded), hash_of(&signed));
    }

    /// Property: A negative index addresses the same element as `len + index`.
    #[test]
    fn prop_negative_index(tuple in arb_tuple(), i in 0usize..5) {
        prop_assume!(i < tuple.len());
        let len = tuple.len() as isize;
        let i = i as isize;
        prop_assert_eq!(tuple.get(i).ok(), tuple.get(i - len).ok());
        prop_assert!(tuple.get(len).is_err());
        prop_assert!(tuple.get(-len - 1).is_err());
    }

    /// Property: Slicing then concatenating the halves rebuilds the tuple.
    #[test]
    fn prop_slice_split(tuple in arb_tuple(), at in -6isize..6) {
        let left = tuple.slice(None, Some(at));
        let right = tuple.slice(Some(at), None);
        prop_assert_eq!(left.concat(&right), tuple);
    }

    /// Property: The successor keeps the length and sorts strictly after the key.
    #[test]
    fn prop_successor_is_next(key in prop::collection::vec(any::<u8>(), 0..16)) {
        prop_assume!(key.is_empty() || key.iter().any(|&b| b != 0xFF));
        let next = successor(Some(key.as_slice())).expect("key has a successor");
        prop_assert!(next > key);
        if !key.is_empty() {
            prop_assert_eq!(next.len(), key.len());
        }
    }

    /// Property: strinc bounds every extension of its input.
    #[test]
    fn prop_strinc_bounds_extensions(
        prefix in prop::collection::vec(any::<u8>(), 1..8),
        tail in prop::collection::vec(any::<u8>(), 0..8)
    ) {
        prop_assume!(prefix.iter().any(|&b| b != 0xFF));
        let end = strinc(&prefix).expect("prefix has a non-FF byte");
        let mut key = prefix.clone();
        key.extend_from_slice(&tail);
        prop_assert!(key < end);
        prop_assert!(end > prefix);
    }

    /// Property: Batches tile the range in order with bounded sizes.
    #[test]
    fn prop_batches_cover_range(offset in -1000i64..1000, count in 0i64..500, size in 1i64..64) {
        let batches: Vec<_> = batched(offset, count, size).into_iter().collect();
        let mut next = offset;
        for batch in &batches {
            prop_assert_eq!(batch.start, next);
            prop_assert!(batch.end > batch.start && batch.end - batch.start <= size);
            next = batch.end;
        }
        prop_assert_eq!(next, offset + count);
        prop_assert_eq!(batches.len(), batched(offset, count, size).batch_count());
    }

    /// Property: Workers together claim every index exactly once.
    #[test]
    fn prop_workers_cover_range(count in 0i64..500, workers in 1usize..6, size in 1i64..64) {
        let mut sequences = batched_workers(0, count, workers, size);
        prop_assert_eq!(sequences.len(), workers);

        // Interleave the workers round-robin until all are exhausted.
        let mut claimed = Vec::new();
        let mut active = true;
        while active {
            active = false;
            for sequence in sequences.iter_mut() {
                if let Some(batch) = sequence.next() {
                    claimed.push(batch);
                    active = true;
                }
            }
        }

        claimed.sort_by_key(|batch| batch.start);
        let mut next = 0;
        for batch in claimed {
            prop_assert_eq!(batch.start, next);
            next = batch.end;
        }
        prop_assert_eq!(next, count);
    }

    /// Property: Arbitrary input never panics the decoder.
    #[test]
    fn prop_unpack_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..64)) {
        if let Err(error) = Tuple::unpack(&data) {
            prop_assert!(error.is_malformed());
            prop_assert!(error.offset().is_some());
        }
    }

    /// Property: Integer special cases.
    #[test]
    fn prop_int_boundaries(n in prop::sample::select(vec![
        i64::MIN,
        i64::MIN + 1,
        -1_000_000_000_000i64,
        -256i64,
        -255i64,
        -1i64,
        0i64,
        1i64,
        255i64,
        256i64,
        1_000_000_000_000i64,
        i64::MAX - 1,
        i64::MAX,
    ])) {
        let tuple = Tuple::new().push(n);
        let unpacked = Tuple::unpack(&tuple.pack()).expect("unpack should succeed");
        prop_assert_eq!(tuple, unpacked, "boundary roundtrip failed for {}", n);
    }

    /// Property: Empty string and null byte handling.
    #[test]
    fn prop_special_strings(s in prop::sample::select(vec![
        String::new(),
        String::from("\x00"),
        String::from("\x00\x00"),
        String::from("a\x00b"),
        String::from("\x00a\x00"),
        String::from("test"),
    ])) {
        let tuple = Tuple::new().push(&s as &str);
        let unpacked = Tuple::unpack(&tuple.pack()).expect("unpack should succeed");
        prop_assert_eq!(tuple, unpacked, "special string roundtrip failed for {:?}", s);
    }
}

// =============================================================================
// Additional Non-Proptest Tests
// =============================================================================

#[test]
fn test_negative_integer_ordering() {
    let values: Vec<i64> = vec![
        i64::MIN,
        i64::MIN + 1,
        -1_000_000_000_000,
        -1000,
        -256,
        -255,
        -128,
        -127,
        -2,
        -1,
        0,
        1,
        2,
        127,
        128,
        255,
        256,
        1000,
        1_000_000_000_000,
        i64::MAX - 1,
        i64::MAX,
    ];

    let packed: Vec<Vec<u8>> = values.iter().map(|&n| Tuple::new().push(n).pack()).collect();

    for i in 1..packed.len() {
        assert!(
            packed[i - 1] < packed[i],
            "ordering failed: {} < {} but {:?} >= {:?}",
            values[i - 1],
            values[i],
            packed[i - 1],
            packed[i]
        );
    }
}
