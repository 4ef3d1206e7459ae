//! Sorting and grouping of assembly-order keys.
//!
//! Given a sequence of keys, one per *assembly position*, [`sort_and_group`] computes a
//! permutation of the positions that takes the keys into non-decreasing order, together with
//! offsets delimiting the runs of equal keys. The result is a [`GroupedIndex`]: a CSR-like
//! adjacency structure in which group `g` lists every assembly position contributing to the
//! `g`-th smallest distinct key.
use crate::error::ScatterIndexError;
use fenris_nested_vec::NestedVec;
use itertools::Itertools;
use log::debug;
use num::Zero;
use rayon::slice::ParallelSliceMut;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Assembly positions grouped by equal keys.
///
/// The permutation lists every assembly position exactly once, ordered by key. The offsets
/// have length `num_groups() + 1`, start at zero and end at `len()`, and group `g` is given by
/// `permutation[offsets[g] .. offsets[g + 1]]`. Groups appear in increasing key order.
/// The order of positions *within* a group is unspecified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGroupedIndex")]
pub struct GroupedIndex {
    permutation: Vec<u32>,
    offsets: Vec<u32>,
}

/// Unvalidated serialized form of a [`GroupedIndex`].
#[derive(Deserialize)]
struct RawGroupedIndex {
    permutation: Vec<u32>,
    offsets: Vec<u32>,
}

impl TryFrom<RawGroupedIndex> for GroupedIndex {
    type Error = ScatterIndexError;

    fn try_from(raw: RawGroupedIndex) -> Result<Self, Self::Error> {
        Self::try_from_parts(raw.permutation, raw.offsets)
    }
}

impl GroupedIndex {
    /// Constructs a grouped index from a permutation and group offsets.
    ///
    /// Checks that the permutation is a permutation of `0 .. permutation.len()`, and that the
    /// offsets start at zero, are strictly increasing and end at the permutation length.
    /// Whether the groups agree with some sequence of keys cannot be checked here.
    pub fn try_from_parts(permutation: Vec<u32>, offsets: Vec<u32>) -> Result<Self, ScatterIndexError> {
        let invalid = |reason| Err(ScatterIndexError::InvalidGroupedIndex { reason });
        if permutation.is_empty() {
            return Err(ScatterIndexError::EmptyInput);
        }
        if offsets.first() != Some(&0) {
            return invalid("offsets must start with zero");
        }
        if offsets.iter().tuple_windows().any(|(prev, next)| prev >= next) {
            return invalid("offsets must be strictly increasing");
        }
        if offsets.last().map(|&last| last as usize) != Some(permutation.len()) {
            return invalid("last offset must equal the permutation length");
        }

        let mut visited = vec![false; permutation.len()];
        for &position in &permutation {
            match visited.get_mut(position as usize) {
                Some(seen) if !*seen => *seen = true,
                _ => return invalid("permutation must contain every position exactly once"),
            }
        }
        Ok(Self { permutation, offsets })
    }

    /// Computes offsets for a permutation that has already been sorted by key.
    fn from_sorted_permutation<K: Ord>(keys: &[K], permutation: Vec<u32>) -> Self {
        let mut offsets = vec![0];
        for (i, (&prev, &next)) in permutation.iter().tuple_windows().enumerate() {
            if keys[prev as usize] != keys[next as usize] {
                offsets.push(i as u32 + 1);
            }
        }
        offsets.push(permutation.len() as u32);
        Self { permutation, offsets }
    }

    /// The number of assembly positions.
    pub fn len(&self) -> usize {
        self.permutation.len()
    }

    /// The number of distinct keys.
    pub fn num_groups(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn permutation(&self) -> &[u32] {
        &self.permutation
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// The assembly positions sharing the `g`-th smallest key.
    pub fn group(&self, g: usize) -> Option<&[u32]> {
        let begin = *self.offsets.get(g)? as usize;
        let end = *self.offsets.get(g + 1)? as usize;
        Some(&self.permutation[begin..end])
    }

    pub fn groups<'a>(&'a self) -> impl 'a + ExactSizeIterator<Item = &'a [u32]> {
        self.offsets
            .windows(2)
            .map(move |w| &self.permutation[w[0] as usize..w[1] as usize])
    }

    pub fn group_sizes<'a>(&'a self) -> impl 'a + ExactSizeIterator<Item = usize> {
        self.offsets.windows(2).map(|w| (w[1] - w[0]) as usize)
    }

    /// Returns the key of each group, in increasing order.
    ///
    /// `keys` must be the sequence the index was built from.
    pub fn distinct_keys<K: Clone>(&self, keys: &[K]) -> Result<Vec<K>, ScatterIndexError> {
        self.check_assembly_len(keys.len())?;
        Ok(self
            .groups()
            .map(|group| keys[group[0] as usize].clone())
            .collect())
    }

    /// Sums contributions given in assembly order into one value per group.
    ///
    /// On success, `output[g]` holds the sum of `contributions[p]` over all positions `p`
    /// in group `g`. Previous values in `output` are overwritten.
    pub fn accumulate_into<T>(&self, contributions: &[T], output: &mut [T]) -> Result<(), ScatterIndexError>
    where
        T: Clone + Zero + AddAssign,
    {
        self.check_assembly_len(contributions.len())?;
        if output.len() != self.num_groups() {
            return Err(ScatterIndexError::LengthMismatch {
                expected: self.num_groups(),
                actual: output.len(),
            });
        }

        for (group, out) in self.groups().zip(output.iter_mut()) {
            let mut sum = T::zero();
            for &position in group {
                sum += contributions[position as usize].clone();
            }
            *out = sum;
        }
        Ok(())
    }

    fn check_assembly_len(&self, actual: usize) -> Result<(), ScatterIndexError> {
        if actual == self.len() {
            Ok(())
        } else {
            Err(ScatterIndexError::LengthMismatch {
                expected: self.len(),
                actual,
            })
        }
    }
}

impl<'a> From<&'a GroupedIndex> for NestedVec<u32> {
    fn from(index: &'a GroupedIndex) -> Self {
        let offsets = index.offsets.iter().map(|&offset| offset as usize).collect();
        NestedVec::from_offsets_and_data(offsets, index.permutation.clone())
            .expect("Internal error: Grouped index offsets must always be valid.")
    }
}

/// Returns the identity permutation over all assembly positions, checking that positions fit
/// in 32 bits.
fn identity_permutation(len: usize) -> Result<Vec<u32>, ScatterIndexError> {
    if len == 0 {
        return Err(ScatterIndexError::EmptyInput);
    }
    let len = u32::try_from(len).map_err(|_| ScatterIndexError::IndexOverflow { len })?;
    Ok((0..len).collect())
}

/// Groups the positions of `keys` by equal key.
///
/// Keys are compared with their [`Ord`] implementation. Tuples and structs deriving `Ord`
/// are compared lexicographically.
///
/// Fails with [`ScatterIndexError::EmptyInput`] if `keys` is empty, and with
/// [`ScatterIndexError::IndexOverflow`] if there are more keys than a `u32` can address.
pub fn sort_and_group<K: Ord>(keys: &[K]) -> Result<GroupedIndex, ScatterIndexError> {
    let mut permutation = identity_permutation(keys.len())?;
    permutation.sort_unstable_by(|&a, &b| keys[a as usize].cmp(&keys[b as usize]));
    let index = GroupedIndex::from_sorted_permutation(keys, permutation);
    debug!(
        "Grouped {} assembly positions into {} groups",
        index.len(),
        index.num_groups()
    );
    Ok(index)
}

/// Same as [`sort_and_group`], but sorts in parallel on the rayon thread pool.
///
/// The group membership of the result is identical to that of [`sort_and_group`], but the
/// order of positions within a group may differ.
pub fn sort_and_group_par<K: Ord + Sync>(keys: &[K]) -> Result<GroupedIndex, ScatterIndexError> {
    let mut permutation = identity_permutation(keys.len())?;
    permutation.par_sort_unstable_by(|&a, &b| keys[a as usize].cmp(&keys[b as usize]));
    let index = GroupedIndex::from_sorted_permutation(keys, permutation);
    debug!(
        "Grouped {} assembly positions into {} groups (parallel)",
        index.len(),
        index.num_groups()
    );
    Ok(index)
}
