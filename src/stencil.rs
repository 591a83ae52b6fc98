use serde::{Deserialize, Serialize};
use crate::boundary::Side;
use crate::error::Error;
use crate::index_space::MultiIndex;




/**
 * Describes the halo a numerical operator reads around each cell. The start
 * is inclusive and `<= 0` on every axis, the end is exclusive and `>= 1`. A
 * symmetric stencil from -1 to +1 is `Stencil::uniform(-1, 2, false)`.
 *
 * Tensorial stencils take into account edge and corner ghosts. A
 * non-tensorial stencil accounts for face ghosts only.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Stencil<const DIM: usize> {
    start: MultiIndex<DIM>,
    end: MultiIndex<DIM>,
    tensorial: bool,
}




// ============================================================================
impl<const DIM: usize> Stencil<DIM> {

    pub fn new(start: MultiIndex<DIM>, end: MultiIndex<DIM>, tensorial: bool) -> Result<Self, Error> {
        if !start.all_le(&MultiIndex::zero()) || !MultiIndex::splat(1).all_le(&end) {
            return Err(Error::InvalidStencil {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end, tensorial })
    }

    /**
     * Stencil with the same start and end on every axis.
     */
    pub fn uniform(start: i64, end: i64, tensorial: bool) -> Result<Self, Error> {
        Self::new(MultiIndex::splat(start), MultiIndex::splat(end), tensorial)
    }

    pub fn start(&self) -> MultiIndex<DIM> {
        self.start
    }

    pub fn end(&self) -> MultiIndex<DIM> {
        self.end
    }

    pub fn is_tensorial(&self) -> bool {
        self.tensorial
    }

    /**
     * Whether the stencil reaches past the inner region on the given face.
     */
    pub fn has_width(&self, dir: usize, side: Side) -> bool {
        match side {
            Side::Low => self.start[dir] < 0,
            Side::High => self.end[dir] > 1,
        }
    }
}

impl<const DIM: usize> Default for Stencil<DIM> {
    fn default() -> Self {
        Self {
            start: MultiIndex::zero(),
            end: MultiIndex::splat(1),
            tensorial: false,
        }
    }
}




#[derive(Serialize, Deserialize)]
struct RawStencil<const DIM: usize> {
    start: MultiIndex<DIM>,
    end: MultiIndex<DIM>,
    tensorial: bool,
}

impl<'de, const DIM: usize> Deserialize<'de> for Stencil<DIM> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawStencil::<DIM>::deserialize(deserializer)?;
        Self::new(raw.start, raw.end, raw.tensorial).map_err(serde::de::Error::custom)
    }
}
