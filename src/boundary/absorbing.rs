use serde::{Deserialize, Serialize};
use crate::data::Element;
use crate::error::Error;
use crate::index_space::{IndexSpace, MultiIndex};
use crate::lab::FieldLab;
use super::Side;




/**
 * Zeroth-order absorbing boundary: the inner cell adjacent to the face is
 * extrapolated as a constant through the whole ghost depth.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absorbing {
    dir: usize,
    side: Side,
}




// ============================================================================
impl Absorbing {

    pub fn new(dir: usize, side: Side) -> Self {
        Self { dir, side }
    }

    pub fn dir(&self) -> usize {
        self.dir
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub(super) fn apply<T: Element, const DIM: usize>(&self, lab: &mut FieldLab<T, DIM>) -> Result<(), Error> {
        let dir = self.dir;
        let stencil = lab.active_stencil();
        let n = lab.active_space().dim();
        let outward = self.side.outward();

        let (mut start, mut slice) = if stencil.is_tensorial() {
            (lab.active_lab_space().start(), lab.active_lab_space().dim())
        } else {
            (MultiIndex::zero(), n)
        };
        let depth = match self.side {
            Side::Low => {
                start[dir] = -1;
                -stencil.start()[dir]
            }
            Side::High => {
                start[dir] = n[dir];
                stencil.end()[dir] - 1
            }
        };
        slice[dir] = 1;

        let inward = MultiIndex::unit(dir) * -outward;

        for p in IndexSpace::from_extent(slice)? {
            let mut q = p + start;
            let value = lab[q + inward];

            for _ in 0..depth {
                lab[q] = value;
                q[dir] += outward;
            }
        }
        Ok(())
    }
}
