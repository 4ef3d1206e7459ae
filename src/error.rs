//! Errors produced while building scatter indices.
use thiserror::Error;

/// Error type shared by all index builders in this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScatterIndexError {
    /// There was nothing to group: the key sequence (or dofmap) was empty.
    #[error("cannot build a grouped index from an empty key sequence")]
    EmptyInput,
    /// Row and column dofmaps disagree on the number of cells.
    #[error("row dofmap has {rows} cells, but column dofmap has {cols} cells")]
    CellCountMismatch { rows: usize, cols: usize },
    /// A cell has a different number of local dofs than the first cell.
    #[error("cell {cell} has {actual} local dofs, expected {expected} (the count of cell 0)")]
    NonUniformDofCount { cell: usize, expected: usize, actual: usize },
    /// The number of assembly positions cannot be represented by a 32-bit index.
    #[error("{len} assembly positions exceed the range of 32-bit indices")]
    IndexOverflow { len: usize },
    /// A buffer did not have the length required by the index.
    #[error("expected a buffer of length {expected}, got length {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// Permutation and offsets do not form a valid grouped index.
    #[error("invalid grouped index: {reason}")]
    InvalidGroupedIndex { reason: &'static str },
    /// A global dof does not fit inside the destination vector or matrix.
    #[error("global dof {dof} is out of bounds for dimension {dim}")]
    DofOutOfBounds { dof: u32, dim: usize },
}
