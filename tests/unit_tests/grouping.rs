use crate::{assert_valid_grouping, group_sets};
use fenris_scatter::error::ScatterIndexError;
use fenris_scatter::grouping::{sort_and_group, sort_and_group_par, GroupedIndex};
use fenris_scatter::NestedVec;
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[test]
fn sort_and_group_distinct_keys() {
    let keys = [3u32, 1, 2, 0];
    let index = sort_and_group(&keys).unwrap();

    assert_eq!(index.permutation(), &[3, 1, 2, 0]);
    assert_eq!(index.offsets(), &[0, 1, 2, 3, 4]);
    assert_eq!(index.num_groups(), 4);
    assert_eq!(index.distinct_keys(&keys).unwrap(), vec![0, 1, 2, 3]);
    assert_valid_grouping(&keys, &index);
}

#[test]
fn sort_and_group_repeated_keys() {
    let keys = [1u32, 2, 2, 3];
    let index = sort_and_group(&keys).unwrap();

    assert_eq!(index.offsets(), &[0, 1, 3, 4]);
    assert_eq!(index.group(0).unwrap(), &[0]);
    assert_eq!(group_sets(&index)[1], vec![1, 2]);
    assert_eq!(index.group(2).unwrap(), &[3]);
    assert!(index.group(3).is_none());
    assert_eq!(index.group_sizes().collect::<Vec<_>>(), vec![1, 2, 1]);
}

#[test]
fn sort_and_group_single_key() {
    let index = sort_and_group(&[7u32]).unwrap();
    assert_eq!(index.permutation(), &[0]);
    assert_eq!(index.offsets(), &[0, 1]);

    // All keys equal collapse into one group
    let index = sort_and_group(&[5i64, 5, 5]).unwrap();
    assert_eq!(index.offsets(), &[0, 3]);
    assert_eq!(group_sets(&index), vec![vec![0, 1, 2]]);
}

#[test]
fn sort_and_group_tuple_keys_are_lexicographic() {
    let keys = [(1u32, 0u32), (0, 6), (0, 5), (1, 0), (0, 6)];
    let index = sort_and_group(&keys).unwrap();

    assert_eq!(index.offsets(), &[0, 1, 3, 5]);
    assert_eq!(
        index.distinct_keys(&keys).unwrap(),
        vec![(0, 5), (0, 6), (1, 0)]
    );
    assert_eq!(group_sets(&index), vec![vec![2], vec![1, 4], vec![0, 3]]);
}

#[test]
fn sort_and_group_rejects_empty_input() {
    assert_eq!(sort_and_group::<u32>(&[]), Err(ScatterIndexError::EmptyInput));
    assert_eq!(sort_and_group_par::<u32>(&[]), Err(ScatterIndexError::EmptyInput));
}

#[test]
fn accumulate_sums_each_group() {
    let keys = [4u32, 2, 4, 4, 2, 9];
    let contributions = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let index = sort_and_group(&keys).unwrap();

    let mut output = [f64::NAN; 3];
    index.accumulate_into(&contributions, &mut output).unwrap();
    assert_eq!(output, [7.0, 8.0, 6.0]);
}

#[test]
fn accumulate_checks_lengths() {
    let index = sort_and_group(&[0u32, 0, 1]).unwrap();

    let mut output = [0i32; 2];
    assert_eq!(
        index.accumulate_into(&[1, 2], &mut output),
        Err(ScatterIndexError::LengthMismatch { expected: 3, actual: 2 })
    );

    let mut output = [0i32; 3];
    assert_eq!(
        index.accumulate_into(&[1, 2, 3], &mut output),
        Err(ScatterIndexError::LengthMismatch { expected: 2, actual: 3 })
    );

    assert_eq!(
        index.distinct_keys(&[0u32]),
        Err(ScatterIndexError::LengthMismatch { expected: 3, actual: 1 })
    );
}

#[test]
fn grouped_index_converts_to_nested_vec() {
    let index = sort_and_group(&[2u32, 0, 2]).unwrap();
    let nested = NestedVec::from(&index);

    assert_eq!(nested.len(), 2);
    assert_eq!(nested.offsets(), &[0, 1, 3]);
    assert_eq!(nested.get(0).unwrap(), &[1]);
    assert_eq!(nested.data(), index.permutation());
}

#[test]
fn grouped_index_serde_json() {
    let index = sort_and_group(&[1u32, 0]).unwrap();
    let json = serde_json::to_string(&index).unwrap();
    assert_eq!(json, r#"{"permutation":[1,0],"offsets":[0,1,2]}"#);
}

#[test]
fn grouped_index_deserialize_rejects_malformed_parts() {
    let index = sort_and_group(&[3u32, 1, 3]).unwrap();
    let json = serde_json::to_string(&index).unwrap();
    assert_eq!(serde_json::from_str::<GroupedIndex>(&json).unwrap(), index);

    let malformed = [
        r#"{"permutation":[0,1],"offsets":[]}"#,
        r#"{"permutation":[0],"offsets":[0,5]}"#,
        r#"{"permutation":[0,1],"offsets":[1,2]}"#,
        r#"{"permutation":[0,1],"offsets":[0,1,1,2]}"#,
        r#"{"permutation":[0,2],"offsets":[0,2]}"#,
        r#"{"permutation":[1,1],"offsets":[0,2]}"#,
        r#"{"permutation":[],"offsets":[0]}"#,
    ];
    for json in malformed {
        assert!(serde_json::from_str::<GroupedIndex>(json).is_err(), "accepted {json}");
    }
}

#[test]
fn grouped_index_try_from_parts() {
    let index = GroupedIndex::try_from_parts(vec![2, 0, 1], vec![0, 1, 3]).unwrap();
    assert_eq!(index.num_groups(), 2);
    assert_eq!(index.group(1).unwrap(), &[0, 1]);

    assert_eq!(
        GroupedIndex::try_from_parts(vec![0, 1], vec![]),
        Err(ScatterIndexError::InvalidGroupedIndex {
            reason: "offsets must start with zero"
        })
    );
    assert_eq!(
        GroupedIndex::try_from_parts(vec![0], vec![0, 5]),
        Err(ScatterIndexError::InvalidGroupedIndex {
            reason: "last offset must equal the permutation length"
        })
    );
    assert_eq!(
        GroupedIndex::try_from_parts(vec![0, 0], vec![0, 2]),
        Err(ScatterIndexError::InvalidGroupedIndex {
            reason: "permutation must contain every position exactly once"
        })
    );
    assert_eq!(
        GroupedIndex::try_from_parts(vec![], vec![0]),
        Err(ScatterIndexError::EmptyInput)
    );
}

proptest! {
    #[test]
    fn sort_and_group_produces_valid_grouping(keys in vec(0u32 .. 20, 1 .. 200)) {
        let index = sort_and_group(&keys).unwrap();
        assert_valid_grouping(&keys, &index);
    }

    #[test]
    fn sort_and_group_pairs_produces_valid_grouping(keys in vec((0u32 .. 5, 0u32 .. 5), 1 .. 100)) {
        let index = sort_and_group(&keys).unwrap();
        assert_valid_grouping(&keys, &index);
    }

    #[test]
    fn sort_and_group_is_deterministic_up_to_ties(keys in vec(0u32 .. 10, 1 .. 100)) {
        let serial = sort_and_group(&keys).unwrap();
        let serial_again = sort_and_group(&keys).unwrap();
        let parallel = sort_and_group_par(&keys).unwrap();

        assert_valid_grouping(&keys, &parallel);
        prop_assert_eq!(serial.offsets(), parallel.offsets());
        prop_assert_eq!(group_sets(&serial), group_sets(&serial_again));
        prop_assert_eq!(group_sets(&serial), group_sets(&parallel));
    }

    #[test]
    fn accumulate_matches_naive_summation(
        (keys, values) in (1usize .. 100).prop_flat_map(|n| (vec(0u32 .. 15, n), vec(-100i64 .. 100, n)))
    ) {
        let index = sort_and_group(&keys).unwrap();
        let mut output = vec![0; index.num_groups()];
        index.accumulate_into(&values, &mut output).unwrap();

        let mut expected = BTreeMap::new();
        for (key, value) in keys.iter().zip(&values) {
            *expected.entry(*key).or_insert(0) += *value;
        }
        prop_assert_eq!(index.distinct_keys(&keys).unwrap(), expected.keys().copied().collect::<Vec<_>>());
        prop_assert_eq!(output, expected.values().copied().collect::<Vec<_>>());
    }
}
