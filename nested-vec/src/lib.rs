//! Compact storage of a sequence of variable-length arrays.
//!
//! All arrays are stored back to back in a single buffer, delimited by an offset array of
//! length `len() + 1`. This is the same layout as the rows of a CSR matrix, and is the
//! layout typically used for cell-to-dof maps.
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::Debug;
use std::ops::Range;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNestedVec<T>")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct NestedVec<T> {
    data: Vec<T>,
    offsets: Vec<usize>,
}

/// Unvalidated serialized form of a [`NestedVec`].
#[derive(Deserialize)]
struct RawNestedVec<T> {
    data: Vec<T>,
    offsets: Vec<usize>,
}

impl<T> TryFrom<RawNestedVec<T>> for NestedVec<T> {
    type Error = InvalidOffsets;

    fn try_from(raw: RawNestedVec<T>) -> Result<Self, Self::Error> {
        Self::from_offsets_and_data(raw.offsets, raw.data)
    }
}

/// Error returned when offsets and data do not describe a valid [`NestedVec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidOffsets {
    /// The offset array was empty, or its first entry was not zero.
    MissingLeadingZero,
    /// Offsets `i` and `i + 1` were decreasing.
    Decreasing { index: usize },
    /// The last offset did not equal the length of the data.
    LengthMismatch { last_offset: usize, data_len: usize },
}

impl fmt::Display for InvalidOffsets {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingLeadingZero => write!(f, "offsets must start with zero"),
            Self::Decreasing { index } => write!(f, "offsets decrease after index {index}"),
            Self::LengthMismatch { last_offset, data_len } => write!(
                f,
                "last offset {last_offset} does not match data length {data_len}"
            ),
        }
    }
}

impl Error for InvalidOffsets {}

impl<T: Debug> Debug for NestedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for NestedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NestedVec<T> {
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            offsets: vec![0],
        }
    }

    /// Constructs a nested vec from raw offsets and data.
    ///
    /// Array `i` is given by `data[offsets[i] .. offsets[i + 1]]`.
    pub fn from_offsets_and_data(offsets: Vec<usize>, data: Vec<T>) -> Result<Self, InvalidOffsets> {
        if offsets.first() != Some(&0) {
            return Err(InvalidOffsets::MissingLeadingZero);
        }
        if let Some(index) = offsets.windows(2).position(|w| w[0] > w[1]) {
            return Err(InvalidOffsets::Decreasing { index });
        }
        let last_offset = *offsets.last().unwrap_or(&0);
        if last_offset != data.len() {
            return Err(InvalidOffsets::LengthMismatch {
                last_offset,
                data_len: data.len(),
            });
        }
        Ok(Self { data, offsets })
    }

    /// Constructs a nested vec in which every array has the same length.
    ///
    /// # Panics
    ///
    /// Panics if `array_len` is zero while `data` is non-empty, or if the length of `data`
    /// is not divisible by `array_len`.
    pub fn from_uniform_chunks(data: Vec<T>, array_len: usize) -> Self {
        if array_len == 0 {
            assert!(data.is_empty(), "Zero-length arrays cannot hold data.");
            return Self::new();
        }
        assert_eq!(data.len() % array_len, 0, "Data length must be a multiple of array length.");
        let offsets = (0..=data.len() / array_len).map(|i| i * array_len).collect();
        Self { data, offsets }
    }

    /// Return a data structure that can be used for appending single elements to the same array.
    /// When the returned data structure is dropped, the result is equivalent to
    /// adding the array at once with `NestedVec::push`.
    pub fn begin_array<'a>(&'a mut self) -> ArrayAppender<'a, T> {
        let initial_count = self.data.len();
        ArrayAppender {
            initial_count,
            data: &mut self.data,
            offsets: &mut self.offsets,
        }
    }

    pub fn iter<'a>(&'a self) -> impl 'a + ExactSizeIterator<Item = &'a [T]> {
        self.offsets
            .windows(2)
            .map(move |w| &self.data[w[0]..w[1]])
    }

    /// Number of arrays.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the array at the given index.
    pub fn array_len(&self, index: usize) -> Option<usize> {
        self.get_index_range(index).map(|range| range.len())
    }

    /// Returns an iterator over all elements inside all arrays.
    pub fn iter_array_elements<'a>(&'a self) -> impl 'a + Iterator<Item = &'a T> {
        self.data.iter()
    }

    pub fn total_num_elements(&self) -> usize {
        self.data.len()
    }

    /// All elements of all arrays, stored contiguously.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn into_offsets_and_data(self) -> (Vec<usize>, Vec<T>) {
        (self.offsets, self.data)
    }

    pub fn get(&self, index: usize) -> Option<&[T]> {
        let range = self.get_index_range(index)?;
        self.data.get(range)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut [T]> {
        let range = self.get_index_range(index)?;
        self.data.get_mut(range)
    }

    fn get_index_range(&self, index: usize) -> Option<Range<usize>> {
        let begin = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some(begin..end)
    }

    pub fn first(&self) -> Option<&[T]> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&[T]> {
        self.get(self.len().checked_sub(1)?)
    }

    pub fn clear(&mut self) {
        self.offsets.truncate(1);
        self.data.clear();
    }
}

#[derive(Debug)]
pub struct ArrayAppender<'a, T> {
    data: &'a mut Vec<T>,
    offsets: &'a mut Vec<usize>,
    initial_count: usize,
}

impl<'a, T> ArrayAppender<'a, T> {
    pub fn push_single(&mut self, element: T) -> &mut Self {
        self.data.push(element);
        self
    }

    pub fn count(&self) -> usize {
        self.data.len() - self.initial_count
    }
}

impl<'a, T> Drop for ArrayAppender<'a, T> {
    fn drop(&mut self) {
        self.offsets.push(self.data.len());
    }
}

impl<T: Clone> NestedVec<T> {
    pub fn push(&mut self, array: &[T]) {
        self.data.extend_from_slice(array);
        self.offsets.push(self.data.len());
    }
}

impl<'a, T: Clone> From<&'a [Vec<T>]> for NestedVec<T> {
    fn from(arrays: &'a [Vec<T>]) -> Self {
        let mut result = Self::new();
        for array in arrays {
            result.push(array);
        }
        result
    }
}

impl<'a, T: Clone> From<&'a Vec<Vec<T>>> for NestedVec<T> {
    fn from(nested_vec: &'a Vec<Vec<T>>) -> Self {
        Self::from(nested_vec.as_slice())
    }
}

impl<T: Clone> From<Vec<Vec<T>>> for NestedVec<T> {
    fn from(vec_vec: Vec<Vec<T>>) -> Self {
        Self::from(&vec_vec)
    }
}

impl<'a, T: Clone> From<&'a NestedVec<T>> for Vec<Vec<T>> {
    fn from(nested: &NestedVec<T>) -> Self {
        nested.iter().map(|slice| slice.to_vec()).collect()
    }
}

impl<T: Clone> From<NestedVec<T>> for Vec<Vec<T>> {
    fn from(nested: NestedVec<T>) -> Self {
        Self::from(&nested)
    }
}
