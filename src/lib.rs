//! Blocklab is a library for structured block grids with ghost cells. A
//! domain is split into equally sized rectangular blocks, each owning a
//! field of cell values. Numerical operators do not read block fields
//! directly; instead a block is loaded into a field lab, a scratch buffer
//! holding a copy of the block padded with the ghost cells a stencil needs.
//! Ghosts are filled from neighbouring blocks (periodically wrapped at the
//! domain edge) and then overwritten on non-periodic domain faces by boundary
//! conditions: Dirichlet, reflecting symmetry, or zeroth-order absorbing.

pub mod aligned;
pub mod boundary;
pub mod config;
pub mod data;
pub mod error;
pub mod field;
pub mod grid;
pub mod index_space;
pub mod indexer;
pub mod lab;
pub mod num_vec;
pub mod stencil;

pub use boundary::{Boundary, Side};
pub use config::GridConfig;
pub use error::Error;
pub use field::Field;
pub use grid::Grid;
pub use index_space::{IndexSpace, MultiIndex};
pub use lab::FieldLab;
pub use stencil::Stencil;
