//! Cell-to-dof maps consumed by the scatter index builders.
use crate::error::ScatterIndexError;
use fenris_nested_vec::NestedVec;

/// A map from cells to the ordered global degrees of freedom of their local basis functions.
///
/// Global dofs are identified by non-negative 32-bit integers. The map is treated as read-only
/// by every routine in this crate.
pub trait DofMap {
    fn num_cells(&self) -> usize;

    /// The global dofs of the given cell, ordered by local index.
    ///
    /// # Panics
    ///
    /// May panic if `cell` is out of bounds.
    fn cell_dofs(&self, cell: usize) -> &[u32];
}

impl<D: DofMap + ?Sized> DofMap for &D {
    fn num_cells(&self) -> usize {
        (**self).num_cells()
    }

    fn cell_dofs(&self, cell: usize) -> &[u32] {
        (**self).cell_dofs(cell)
    }
}

impl DofMap for NestedVec<u32> {
    fn num_cells(&self) -> usize {
        self.len()
    }

    fn cell_dofs(&self, cell: usize) -> &[u32] {
        self.get(cell).expect("Cell index must be in bounds")
    }
}

impl DofMap for [Vec<u32>] {
    fn num_cells(&self) -> usize {
        self.len()
    }

    fn cell_dofs(&self, cell: usize) -> &[u32] {
        &self[cell]
    }
}

impl DofMap for Vec<Vec<u32>> {
    fn num_cells(&self) -> usize {
        self.len()
    }

    fn cell_dofs(&self, cell: usize) -> &[u32] {
        &self[cell]
    }
}

/// Fixed-size connectivity, e.g. one `[u32; 4]` per linear tetrahedron.
impl<const N: usize> DofMap for [[u32; N]] {
    fn num_cells(&self) -> usize {
        self.len()
    }

    fn cell_dofs(&self, cell: usize) -> &[u32] {
        &self[cell]
    }
}

/// Returns the number of local dofs shared by all cells of the dofmap.
///
/// Fails with [`ScatterIndexError::EmptyInput`] if the dofmap has no cells, and with
/// [`ScatterIndexError::NonUniformDofCount`] for the first cell whose dof count differs from
/// that of cell 0.
pub fn uniform_local_dof_count(dofmap: &(impl DofMap + ?Sized)) -> Result<usize, ScatterIndexError> {
    if dofmap.num_cells() == 0 {
        return Err(ScatterIndexError::EmptyInput);
    }
    let expected = dofmap.cell_dofs(0).len();
    for cell in 1..dofmap.num_cells() {
        let actual = dofmap.cell_dofs(cell).len();
        if actual != expected {
            return Err(ScatterIndexError::NonUniformDofCount {
                cell,
                expected,
                actual,
            });
        }
    }
    Ok(expected)
}

/// The largest global dof referenced by any cell, if any.
pub fn max_dof(dofmap: &(impl DofMap + ?Sized)) -> Option<u32> {
    (0..dofmap.num_cells())
        .flat_map(|cell| dofmap.cell_dofs(cell).iter().copied())
        .max()
}
