//! Scatter/gather index construction for finite element assembly.
//!
//! Finite element assembly produces local contributions cell by cell. To add these into a
//! globally ordered vector or sparse matrix, contributions that target the same global entry
//! have to be found and summed. This crate computes, once per dofmap, the permutation and
//! grouping that makes this a simple segmented sum:
//!
//! - [`grouping::sort_and_group`] groups an arbitrary sequence of ordered keys,
//! - [`scatter::create_vector_scatter_index`] and [`scatter::create_matrix_scatter_index`]
//!   build the keys from cell-to-dof maps,
//! - [`scatter::VectorScatterLayout`] and [`scatter::CsrScatterLayout`] pair an index with
//!   its destination storage.
//!
//! ```
//! use fenris_scatter::scatter::create_vector_scatter_index;
//!
//! let dofmap = vec![vec![1u32, 2], vec![2, 3]];
//! let index = create_vector_scatter_index(&dofmap).unwrap();
//! assert_eq!(index.offsets(), &[0, 1, 3, 4]);
//! ```
pub mod diagnostics;
pub mod dofmap;
pub mod error;
pub mod grouping;
pub mod scatter;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate fenris_nested_vec as nested_vec;
pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use nested_vec::NestedVec;
