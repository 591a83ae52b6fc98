//! Boundary conditions applied to the ghost regions of a loaded lab.
//!
//! A boundary binds to one face of the domain, given by a direction and a
//! side. Faces without a non-periodic boundary take their ghosts from the
//! (periodically wrapped) neighbour block while the lab is loaded. Faces with
//! one are skipped during the ghost fill and then overwritten by the boundary.

use serde::{Deserialize, Serialize};
use crate::data::Element;
use crate::error::Error;
use crate::index_space::{IndexSpace, MultiIndex};
use crate::lab::FieldLab;

mod absorbing;
mod dirichlet;
mod symmetry;

pub use absorbing::Absorbing;
pub use dirichlet::Dirichlet;
pub use symmetry::Symmetry;




/**
 * Identifies the lower or upper face along a direction.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Low,
    High,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::Low => 0,
            Side::High => 1,
        }
    }

    /**
     * The unit offset pointing out of the domain through this face.
     */
    pub fn outward(self) -> i64 {
        match self {
            Side::Low => -1,
            Side::High => 1,
        }
    }
}




/**
 * Face a boundary is bound to, and whether ghosts on that face are obtained
 * periodically from the neighbour block.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryInfo {
    pub dir: usize,
    pub side: Side,
    pub is_periodic: bool,
}




/**
 * A boundary condition. `Base` leaves the face periodic; the other variants
 * overwrite the ghost region on their face after the ghost fill.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Boundary<T> {
    Base { dir: usize, side: Side },
    Dirichlet(Dirichlet<T>),
    Symmetry(Symmetry<T>),
    Absorbing(Absorbing),
}




// ============================================================================
impl<T: Element> Boundary<T> {

    pub fn periodic(dir: usize, side: Side) -> Self {
        Self::Base { dir, side }
    }

    pub fn dirichlet(dir: usize, side: Side, value: T) -> Self {
        Self::Dirichlet(Dirichlet::new(dir, side, value))
    }

    /**
     * Reflecting boundary with unit sign.
     */
    pub fn symmetry(dir: usize, side: Side) -> Self where T: num_traits::One {
        Self::Symmetry(Symmetry::new(dir, side))
    }

    pub fn symmetry_with_sign(dir: usize, side: Side, sign: T) -> Self {
        Self::Symmetry(Symmetry::with_sign(dir, side, sign))
    }

    pub fn absorbing(dir: usize, side: Side) -> Self {
        Self::Absorbing(Absorbing::new(dir, side))
    }

    pub fn info(&self) -> BoundaryInfo {
        match self {
            Self::Base { dir, side } => BoundaryInfo { dir: *dir, side: *side, is_periodic: true },
            Self::Dirichlet(b) => BoundaryInfo { dir: b.dir(), side: b.side(), is_periodic: false },
            Self::Symmetry(b) => BoundaryInfo { dir: b.dir(), side: b.side(), is_periodic: false },
            Self::Absorbing(b) => BoundaryInfo { dir: b.dir(), side: b.side(), is_periodic: false },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Base { .. } => "Base",
            Self::Dirichlet(_) => "Dirichlet",
            Self::Symmetry(_) => "Symmetry",
            Self::Absorbing(_) => "Zeroth-Order Absorbing",
        }
    }

    /**
     * Overwrite the ghosts on this boundary's face. The lab must hold a
     * loaded block. Nothing is written if the active stencil has no width
     * on the face.
     */
    pub fn apply<const DIM: usize>(&self, lab: &mut FieldLab<T, DIM>) -> Result<(), Error> {
        let info = self.info();
        check_direction::<DIM>(info.dir)?;

        if !lab.is_loaded() {
            return Err(Error::NoFieldLoaded);
        }
        if !lab.active_stencil().has_width(info.dir, info.side) {
            return Ok(());
        }
        match self {
            Self::Base { .. } => Ok(()),
            Self::Dirichlet(b) => b.apply(lab),
            Self::Symmetry(b) => b.apply(lab),
            Self::Absorbing(b) => b.apply(lab),
        }
    }
}




/**
 * Check that every boundary in the list has a valid direction, and that no
 * face carries more than one boundary.
 */
pub fn validate<T: Element, const DIM: usize>(boundaries: &[Boundary<T>]) -> Result<(), Error> {
    let mut taken = [[false; 2]; DIM];

    for b in boundaries {
        let info = b.info();
        check_direction::<DIM>(info.dir)?;
        let face = &mut taken[info.dir][info.side.index()];

        if *face {
            return Err(Error::DuplicateBoundary { dir: info.dir, side: info.side.index() });
        }
        *face = true;
    }
    Ok(())
}

fn check_direction<const DIM: usize>(dir: usize) -> Result<(), Error> {
    if dir >= DIM {
        Err(Error::InvalidDirection { dir, dim: DIM })
    } else {
        Ok(())
    }
}




/**
 * The ghost region of a loaded lab on the given face, in lab coordinates.
 * For a tensorial stencil the region spans the full lab extent across the
 * face (edges and corners included), otherwise only the inner extent.
 */
fn ghost_slab<T: Element, const DIM: usize>(lab: &FieldLab<T, DIM>, dir: usize, side: Side) -> Result<IndexSpace<DIM>, Error> {
    let stencil = lab.active_stencil();
    let n = lab.active_space().dim();

    let (mut start, mut end) = if stencil.is_tensorial() {
        (lab.active_lab_space().start(), lab.active_lab_space().end())
    } else {
        (MultiIndex::zero(), n)
    };

    match side {
        Side::Low => {
            start[dir] = stencil.start()[dir];
            end[dir] = 0;
        }
        Side::High => {
            start[dir] = n[dir];
            end[dir] = n[dir] + stencil.end()[dir] - 1;
        }
    }
    IndexSpace::new(start, end)
}




/**
 * For every face, whether the ghost fill must leave it to a non-periodic
 * boundary. Indexed as `[dir][side]`.
 */
pub(crate) fn non_periodic_faces<T: Element, const DIM: usize>(boundaries: &[Boundary<T>]) -> [[bool; 2]; DIM] {
    let mut faces = [[false; 2]; DIM];

    for info in boundaries.iter().map(Boundary::info) {
        if info.dir < DIM && !info.is_periodic {
            faces[info.dir][info.side.index()] = true;
        }
    }
    faces
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{non_periodic_faces, validate, Boundary, Side};
    use crate::error::Error;

    #[test]
    fn boundaries_report_their_face() {
        let b = Boundary::dirichlet(1, Side::High, 2.0);
        assert_eq!(b.info().dir, 1);
        assert_eq!(b.info().side, Side::High);
        assert!(!b.info().is_periodic);
        assert!(Boundary::<f64>::periodic(0, Side::Low).info().is_periodic);
        assert_eq!(Boundary::<f64>::absorbing(0, Side::Low).name(), "Zeroth-Order Absorbing");
        assert_eq!(Boundary::<f64>::symmetry(0, Side::Low).name(), "Symmetry");
        assert_eq!(b.name(), "Dirichlet");
    }

    #[test]
    fn validation_rejects_bad_direction_and_duplicates() {
        let ok = vec![
            Boundary::dirichlet(0, Side::Low, 1.0),
            Boundary::dirichlet(0, Side::High, 1.0),
            Boundary::absorbing(1, Side::Low),
        ];
        assert!(validate::<f64, 2>(&ok).is_ok());
        assert_eq!(
            validate::<f64, 2>(&[Boundary::absorbing(2, Side::Low)]),
            Err(Error::InvalidDirection { dir: 2, dim: 2 }));
        assert_eq!(
            validate::<f64, 2>(&[Boundary::absorbing(1, Side::Low), Boundary::symmetry(1, Side::Low)]),
            Err(Error::DuplicateBoundary { dir: 1, side: 0 }));
    }

    #[test]
    fn periodic_boundaries_do_not_mark_faces() {
        let list = vec![
            Boundary::periodic(0, Side::Low),
            Boundary::dirichlet(1, Side::High, 0.0f32),
        ];
        assert_eq!(non_periodic_faces::<f32, 2>(&list), [[false, false], [false, true]]);
    }

    #[test]
    fn boundaries_are_tagged_by_kind() {
        let list = vec![
            Boundary::periodic(0, Side::Low),
            Boundary::dirichlet(0, Side::High, 4.5f64),
            Boundary::symmetry_with_sign(1, Side::Low, -1.0),
            Boundary::absorbing(1, Side::High),
        ];
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(&list, &mut buffer).unwrap();
        let back: Vec<Boundary<f64>> = ciborium::de::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(back, list);
    }
}
