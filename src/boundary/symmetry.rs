use serde::{Deserialize, Serialize};
use crate::data::Element;
use crate::error::Error;
use crate::lab::FieldLab;
use super::{ghost_slab, Side};




/**
 * Reflecting boundary. A ghost at distance `k` outside the face takes the
 * value of the inner cell at distance `k - 1` inside it, times the sign.
 * With a sign of -1 the field is anti-symmetric about the face.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Symmetry<T> {
    dir: usize,
    side: Side,
    sign: T,
}




// ============================================================================
impl<T: Element> Symmetry<T> {

    pub fn new(dir: usize, side: Side) -> Self where T: num_traits::One {
        Self::with_sign(dir, side, T::one())
    }

    pub fn with_sign(dir: usize, side: Side, sign: T) -> Self {
        Self { dir, side, sign }
    }

    pub fn dir(&self) -> usize {
        self.dir
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn sign(&self) -> T {
        self.sign
    }

    /**
     * Mirror a lab coordinate along the boundary direction about the face.
     * For the low face the ghost at -1 maps to 0; for the high face the
     * ghost at `N` maps to `N - 1`.
     */
    pub fn reflect(&self, coordinate: i64, inner_extent: i64) -> i64 {
        match self.side {
            Side::Low => -1 - coordinate,
            Side::High => 2 * inner_extent - 1 - coordinate,
        }
    }

    /**
     * Every ghost must mirror onto a cell of the active lab space. This fails
     * when the ghost depth on this face exceeds the inner extent plus the
     * depth on the opposite face.
     */
    pub(super) fn apply<const DIM: usize>(&self, lab: &mut FieldLab<T, DIM>) -> Result<(), Error> {
        let dir = self.dir;
        let n = lab.active_space().dim()[dir];
        let stencil = lab.active_stencil();
        let region = lab.active_lab_space();

        let (depth, available) = match self.side {
            Side::Low => (-stencil.start()[dir], region.end()[dir]),
            Side::High => (stencil.end()[dir] - 1, n - region.start()[dir]),
        };
        if depth > available {
            return Err(Error::ReflectionDepth { dir, depth, available })
        }

        for q in ghost_slab(lab, self.dir, self.side)? {
            let mut r = q;
            r[self.dir] = self.reflect(q[self.dir], n);
            lab[q] = self.sign * lab[r];
        }
        Ok(())
    }
}
