//! Scatter indices for vector and matrix assembly.
//!
//! Local contributions are produced in *assembly order*: cell by cell, and within each cell by
//! local dof (for vectors) or by local row, then local column (for matrices). The builders in
//! this module flatten a dofmap into one key per assembly position and group the positions by
//! destination, so that all contributions to the same global entry can be summed together.
use crate::dofmap::{max_dof, uniform_local_dof_count, DofMap};
use crate::error::ScatterIndexError;
use crate::grouping::{sort_and_group, GroupedIndex};
use itertools::Itertools;
use log::debug;
use nalgebra::{DVector, Scalar};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use num::Zero;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// A (global row, global column) pair identifying a single matrix entry.
///
/// Pairs are ordered lexicographically, row first, which coincides with the order of entries
/// in a CSR matrix.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DofPair {
    pub row: u32,
    pub col: u32,
}

impl DofPair {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl From<(u32, u32)> for DofPair {
    fn from((row, col): (u32, u32)) -> Self {
        Self::new(row, col)
    }
}

/// Number of assembly positions for `num_cells` cells with the given local sizes.
///
/// Computed from the sizes of the first cell, so that the 32-bit position limit is enforced
/// before any per-cell work or allocation takes place.
fn checked_assembly_len(num_cells: usize, local_sizes: &[usize]) -> Result<usize, ScatterIndexError> {
    let len = local_sizes
        .iter()
        .try_fold(num_cells, |len, &size| len.checked_mul(size))
        .ok_or(ScatterIndexError::IndexOverflow { len: usize::MAX })?;
    if len > u32::MAX as usize {
        return Err(ScatterIndexError::IndexOverflow { len });
    }
    Ok(len)
}

/// Flattens the dofmap into one global dof per (cell, local dof), in assembly order.
///
/// Fails with [`ScatterIndexError::IndexOverflow`] if the number of assembly positions does
/// not fit in 32 bits.
pub fn vector_assembly_keys(dofmap: &(impl DofMap + ?Sized)) -> Result<Vec<u32>, ScatterIndexError> {
    if dofmap.num_cells() == 0 {
        return Err(ScatterIndexError::EmptyInput);
    }
    let len = checked_assembly_len(dofmap.num_cells(), &[dofmap.cell_dofs(0).len()])?;
    uniform_local_dof_count(dofmap)?;

    let mut keys = Vec::with_capacity(len);
    for cell in 0..dofmap.num_cells() {
        keys.extend_from_slice(dofmap.cell_dofs(cell));
    }
    Ok(keys)
}

/// Flattens a pair of dofmaps into one [`DofPair`] per (cell, local row, local column),
/// in assembly order.
///
/// Fails with [`ScatterIndexError::CellCountMismatch`] before any other check if the dofmaps
/// do not have the same number of cells.
pub fn matrix_assembly_keys(
    row_dofmap: &(impl DofMap + ?Sized),
    col_dofmap: &(impl DofMap + ?Sized),
) -> Result<Vec<DofPair>, ScatterIndexError> {
    if row_dofmap.num_cells() != col_dofmap.num_cells() {
        return Err(ScatterIndexError::CellCountMismatch {
            rows: row_dofmap.num_cells(),
            cols: col_dofmap.num_cells(),
        });
    }
    if row_dofmap.num_cells() == 0 {
        return Err(ScatterIndexError::EmptyInput);
    }
    let len = checked_assembly_len(
        row_dofmap.num_cells(),
        &[row_dofmap.cell_dofs(0).len(), col_dofmap.cell_dofs(0).len()],
    )?;
    uniform_local_dof_count(row_dofmap)?;
    uniform_local_dof_count(col_dofmap)?;

    let mut keys = Vec::with_capacity(len);
    for cell in 0..row_dofmap.num_cells() {
        let col_dofs = col_dofmap.cell_dofs(cell);
        for &row in row_dofmap.cell_dofs(cell) {
            keys.extend(col_dofs.iter().map(|&col| DofPair::new(row, col)));
        }
    }
    Ok(keys)
}

/// Builds the grouped index that maps assembly-order vector contributions onto global dofs.
pub fn create_vector_scatter_index(dofmap: &(impl DofMap + ?Sized)) -> Result<GroupedIndex, ScatterIndexError> {
    sort_and_group(&vector_assembly_keys(dofmap)?)
}

/// Builds the grouped index that maps assembly-order matrix contributions onto
/// (row, column) entries.
///
/// Fails with [`ScatterIndexError::CellCountMismatch`] if the dofmaps do not have the same
/// number of cells.
pub fn create_matrix_scatter_index(
    row_dofmap: &(impl DofMap + ?Sized),
    col_dofmap: &(impl DofMap + ?Sized),
) -> Result<GroupedIndex, ScatterIndexError> {
    sort_and_group(&matrix_assembly_keys(row_dofmap, col_dofmap)?)
}

/// A vector scatter index together with the global dof of each group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVectorScatterLayout")]
pub struct VectorScatterLayout {
    index: GroupedIndex,
    dofs: Vec<u32>,
}

#[derive(Deserialize)]
struct RawVectorScatterLayout {
    index: GroupedIndex,
    dofs: Vec<u32>,
}

impl TryFrom<RawVectorScatterLayout> for VectorScatterLayout {
    type Error = ScatterIndexError;

    fn try_from(raw: RawVectorScatterLayout) -> Result<Self, Self::Error> {
        let RawVectorScatterLayout { index, dofs } = raw;
        if dofs.len() != index.num_groups() {
            return Err(ScatterIndexError::LengthMismatch {
                expected: index.num_groups(),
                actual: dofs.len(),
            });
        }
        if dofs.iter().tuple_windows().any(|(prev, next)| prev >= next) {
            return Err(ScatterIndexError::InvalidGroupedIndex {
                reason: "group dofs must be strictly increasing",
            });
        }
        Ok(Self { index, dofs })
    }
}

impl VectorScatterLayout {
    pub fn new(dofmap: &(impl DofMap + ?Sized)) -> Result<Self, ScatterIndexError> {
        let keys = vector_assembly_keys(dofmap)?;
        let index = sort_and_group(&keys)?;
        let dofs = index.distinct_keys(&keys)?;
        debug!("Created vector scatter layout with {} distinct dofs", dofs.len());
        Ok(Self { index, dofs })
    }

    pub fn index(&self) -> &GroupedIndex {
        &self.index
    }

    /// The global dof of each group, in increasing order.
    pub fn dofs(&self) -> &[u32] {
        &self.dofs
    }

    /// Sums assembly-order contributions into a dense global vector of dimension `dim`.
    ///
    /// Entries not referenced by any cell are zero.
    pub fn assemble<T>(&self, contributions: &[T], dim: usize) -> Result<DVector<T>, ScatterIndexError>
    where
        T: Scalar + Zero + AddAssign,
    {
        if let Some(&dof) = self.dofs.last() {
            if dof as usize >= dim {
                return Err(ScatterIndexError::DofOutOfBounds { dof, dim });
            }
        }
        let mut group_values = vec![T::zero(); self.dofs.len()];
        self.index.accumulate_into(contributions, &mut group_values)?;

        let mut vector = DVector::zeros(dim);
        for (&dof, value) in self.dofs.iter().zip(group_values) {
            vector[dof as usize] = value;
        }
        Ok(vector)
    }
}

/// A matrix scatter index together with the CSR sparsity pattern it scatters into.
///
/// Since groups are ordered lexicographically by (row, column), group `k` of the index is
/// exactly the `k`-th explicitly stored entry of the CSR pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrScatterLayout {
    index: GroupedIndex,
    pattern: SparsityPattern,
}

impl CsrScatterLayout {
    /// Creates a layout for a matrix with the given dimensions.
    ///
    /// Fails with [`ScatterIndexError::DofOutOfBounds`] if a row dof is not smaller than
    /// `nrows`, or a column dof is not smaller than `ncols`.
    pub fn new(
        row_dofmap: &(impl DofMap + ?Sized),
        col_dofmap: &(impl DofMap + ?Sized),
        nrows: usize,
        ncols: usize,
    ) -> Result<Self, ScatterIndexError> {
        let keys = matrix_assembly_keys(row_dofmap, col_dofmap)?;
        let index = sort_and_group(&keys)?;
        let entries = index.distinct_keys(&keys)?;

        let mut offsets = Vec::with_capacity(nrows + 1);
        let mut column_indices = Vec::with_capacity(entries.len());
        offsets.push(0);
        for DofPair { row, col } in entries {
            if row as usize >= nrows {
                return Err(ScatterIndexError::DofOutOfBounds { dof: row, dim: nrows });
            }
            if col as usize >= ncols {
                return Err(ScatterIndexError::DofOutOfBounds { dof: col, dim: ncols });
            }
            while row as usize + 1 > offsets.len() {
                // Reached a new row. Loop so that consecutive empty rows are handled correctly
                offsets.push(column_indices.len());
            }
            column_indices.push(col as usize);
        }

        // Fill out offsets for trailing empty rows
        while offsets.len() < nrows + 1 {
            offsets.push(column_indices.len());
        }

        let pattern = SparsityPattern::try_from_offsets_and_indices(nrows, ncols, offsets, column_indices)
            .expect("Internal error: Grouped matrix entries must form a valid sparsity pattern.");
        debug!(
            "Created {}x{} CSR scatter layout with {} nonzeros from {} assembly positions",
            nrows,
            ncols,
            pattern.nnz(),
            index.len()
        );
        Ok(Self { index, pattern })
    }

    /// Creates a layout whose dimensions are one larger than the largest row and column dofs.
    pub fn from_dofmaps(
        row_dofmap: &(impl DofMap + ?Sized),
        col_dofmap: &(impl DofMap + ?Sized),
    ) -> Result<Self, ScatterIndexError> {
        let nrows = max_dof(row_dofmap).ok_or(ScatterIndexError::EmptyInput)? as usize + 1;
        let ncols = max_dof(col_dofmap).ok_or(ScatterIndexError::EmptyInput)? as usize + 1;
        Self::new(row_dofmap, col_dofmap, nrows, ncols)
    }

    pub fn index(&self) -> &GroupedIndex {
        &self.index
    }

    pub fn pattern(&self) -> &SparsityPattern {
        &self.pattern
    }

    pub fn nrows(&self) -> usize {
        self.pattern.major_dim()
    }

    pub fn ncols(&self) -> usize {
        self.pattern.minor_dim()
    }

    /// Sums assembly-order contributions into the CSR value array, overwriting it.
    pub fn assemble_values_into<T>(&self, contributions: &[T], values: &mut [T]) -> Result<(), ScatterIndexError>
    where
        T: Clone + Zero + AddAssign,
    {
        self.index.accumulate_into(contributions, values)
    }

    /// Sums assembly-order contributions into a new CSR matrix with this layout's pattern.
    pub fn assemble<T>(&self, contributions: &[T]) -> Result<CsrMatrix<T>, ScatterIndexError>
    where
        T: Scalar + Zero + AddAssign,
    {
        let mut values = vec![T::zero(); self.pattern.nnz()];
        self.assemble_values_into(contributions, &mut values)?;
        Ok(CsrMatrix::try_from_pattern_and_values(self.pattern.clone(), values)
            .expect("Internal error: Pattern and values must have matching sizes."))
    }
}
