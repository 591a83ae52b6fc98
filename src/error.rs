use thiserror::Error;




/**
 * Error to represent invalid index spaces, stencils, allocations, or an
 * illegal sequence of operations on a field lab.
 */
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("index space has negative volume: start {start} end {end}")]
    InvalidIndexSpace { start: String, end: String },

    #[error("stencil start must be <= 0 and end must be >= 1: start {start} end {end}")]
    InvalidStencil { start: String, end: String },

    #[error("alignment must be a power of two: {0}")]
    InvalidAlignment(usize),

    #[error("block allocation of {0} elements overflows the address space")]
    AllocationOverflow(usize),

    #[error("number of block bytes are not identical: {expected} != {found}")]
    ByteCountMismatch { expected: usize, found: usize },

    #[error("field lab: illegal transition from {from} to {to}")]
    IllegalTransition { from: &'static str, to: &'static str },

    #[error("field lab: no field loaded")]
    NoFieldLoaded,

    #[error("classic (ix, iy, iz) access is not supported for dimension {0}")]
    UnsupportedAccess(usize),

    #[error("boundary direction {dir} out of range for dimension {dim}")]
    InvalidDirection { dir: usize, dim: usize },

    #[error("more than one boundary on face (dir {dir}, side {side})")]
    DuplicateBoundary { dir: usize, side: usize },

    #[error("block extent {extent} exceeds the lab allocation {capacity}")]
    BlockTooLarge { extent: String, capacity: String },

    #[error("neighbour block {block} can not supply halo region {region}")]
    NeighbourMismatch { block: String, region: String },

    #[error("field container holds {found} fields, block space requires {expected}")]
    ContainerSize { expected: usize, found: usize },

    #[error("component {component} out of range for {count} components")]
    InvalidComponent { component: usize, count: usize },

    #[error("block coordinate {0} is outside of the grid")]
    InvalidBlock(String),

    #[error("tensor rank {rank} in dimension {dim} has too many components")]
    InvalidRank { rank: usize, dim: usize },

    #[error("symmetry ghost depth {depth} along direction {dir} exceeds the {available} cells it reflects")]
    ReflectionDepth { dir: usize, depth: i64, available: i64 },

    #[error("configuration: {0}")]
    Config(String),
}
