//! Proptest strategies for dofmaps.
use crate::NestedVec;
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use std::ops::RangeInclusive;

/// Generates dofmaps with a uniform number of local dofs per cell.
///
/// Global dofs are drawn from `0 .. num_dofs`, so small values of `num_dofs` produce many
/// shared dofs between cells.
pub fn uniform_dofmap(
    num_cells: RangeInclusive<usize>,
    local_dofs: RangeInclusive<usize>,
    num_dofs: u32,
) -> impl Strategy<Value = NestedVec<u32>> {
    assert!(num_dofs > 0, "Need at least one global dof to draw from");
    (num_cells, local_dofs).prop_flat_map(move |(num_cells, local_dofs)| {
        vec(0..num_dofs, num_cells * local_dofs)
            .prop_map(move |data| NestedVec::from_uniform_chunks(data, local_dofs))
    })
}

/// Generates pairs of uniform dofmaps over the same number of cells, e.g. for the row and
/// column spaces of a matrix.
pub fn uniform_dofmap_pair(
    num_cells: RangeInclusive<usize>,
    local_dofs: RangeInclusive<usize>,
    num_dofs: u32,
) -> impl Strategy<Value = (NestedVec<u32>, NestedVec<u32>)> {
    assert!(num_dofs > 0, "Need at least one global dof to draw from");
    (num_cells, local_dofs.clone(), local_dofs).prop_flat_map(move |(num_cells, rows, cols)| {
        let row_dofmap = vec(0..num_dofs, num_cells * rows)
            .prop_map(move |data| NestedVec::from_uniform_chunks(data, rows));
        let col_dofmap = vec(0..num_dofs, num_cells * cols)
            .prop_map(move |data| NestedVec::from_uniform_chunks(data, cols));
        (row_dofmap, col_dofmap)
    })
}
