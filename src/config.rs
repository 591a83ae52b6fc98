use std::io::{Read, Write};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::aligned::DEFAULT_ALIGNMENT;
use crate::boundary::{self, Boundary};
use crate::data::Element;
use crate::error::Error;
use crate::grid::Grid;
use crate::index_space::{IndexSpace, MultiIndex};
use crate::lab::FieldLab;
use crate::stencil::Stencil;




fn default_alignment() -> usize {
    DEFAULT_ALIGNMENT
}




/**
 * Persistent description of a block grid: the block layout, the stencil its
 * labs are allocated for, and the boundaries on the domain faces.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig<T, const DIM: usize> {
    pub num_blocks: MultiIndex<DIM>,
    pub block_extent: MultiIndex<DIM>,
    #[serde(default)]
    pub rank: usize,
    #[serde(default = "default_alignment")]
    pub alignment: usize,
    pub stencil: Stencil<DIM>,
    #[serde(default)]
    pub boundaries: Vec<Boundary<T>>,
}




// ============================================================================
impl<T: Element, const DIM: usize> GridConfig<T, DIM> {

    pub fn new(num_blocks: MultiIndex<DIM>, block_extent: MultiIndex<DIM>, stencil: Stencil<DIM>) -> Self {
        Self {
            num_blocks,
            block_extent,
            rank: 0,
            alignment: DEFAULT_ALIGNMENT,
            stencil,
            boundaries: Vec::new(),
        }
    }

    pub fn with_boundaries(mut self, boundaries: Vec<Boundary<T>>) -> Self {
        self.boundaries = boundaries;
        self
    }

    /**
     * Check the invariants which construction of the grid and its labs
     * relies on. The stencil validates itself when decoded.
     */
    pub fn validate(&self) -> Result<(), Error> {
        if !self.alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(self.alignment))
        }
        for extent in [self.num_blocks, self.block_extent] {
            if !MultiIndex::<DIM>::splat(1).all_le(&extent) {
                return Err(Error::InvalidIndexSpace {
                    start: MultiIndex::<DIM>::zero().to_string(),
                    end: extent.to_string(),
                })
            }
        }
        boundary::validate::<T, DIM>(&self.boundaries)
    }

    pub fn stencil(&self) -> Stencil<DIM> {
        self.stencil
    }

    /**
     * Create the grid described by this configuration and attach its domain
     * boundaries.
     */
    pub fn build_grid(&self) -> Result<Grid<T, DIM>, Error> {
        self.validate()?;
        let mut grid = Grid::with_alignment(self.num_blocks, self.block_extent, self.rank, self.alignment)?;
        grid.set_domain_boundaries(&self.boundaries)?;
        Ok(grid)
    }

    /**
     * Create a lab with the configured alignment, allocated for the
     * configured stencil and block extent.
     */
    pub fn lab(&self) -> Result<FieldLab<T, DIM>, Error> {
        let mut lab = FieldLab::with_alignment(self.alignment)?;
        lab.allocate(self.stencil, &IndexSpace::from_extent(self.block_extent)?, false)?;
        Ok(lab)
    }
}




/**
 * CBOR persistence, for element types serde can encode.
 */
impl<T, const DIM: usize> GridConfig<T, DIM>
where
    T: Element + Serialize + DeserializeOwned + Default,
{
    /**
     * Decode a configuration from CBOR and validate it.
     */
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let config: Self = ciborium::de::from_reader(reader).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /**
     * Encode the configuration as CBOR.
     */
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        ciborium::ser::into_writer(self, writer).map_err(|e| Error::Config(e.to_string()))
    }
}
