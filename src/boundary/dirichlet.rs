use serde::{Deserialize, Serialize};
use crate::data::Element;
use crate::error::Error;
use crate::lab::FieldLab;
use super::{ghost_slab, Side};




/**
 * Constant value boundary. Every ghost on the face is set to the boundary
 * value.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dirichlet<T> {
    dir: usize,
    side: Side,
    value: T,
}




// ============================================================================
impl<T: Element> Dirichlet<T> {

    pub fn new(dir: usize, side: Side, value: T) -> Self {
        Self { dir, side, value }
    }

    pub fn dir(&self) -> usize {
        self.dir
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn value(&self) -> T {
        self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub(super) fn apply<const DIM: usize>(&self, lab: &mut FieldLab<T, DIM>) -> Result<(), Error> {
        for q in ghost_slab(lab, self.dir, self.side)? {
            lab[q] = self.value;
        }
        Ok(())
    }
}
