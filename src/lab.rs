use core::mem::size_of;
use core::ops::{Index, IndexMut};
use log::{debug, trace};
use crate::aligned::{AlignedBlock, DEFAULT_ALIGNMENT};
use crate::boundary::{non_periodic_faces, Boundary};
use crate::data::{BlockBytes, BlockData, Element};
use crate::error::Error;
use crate::field::Field;
use crate::index_space::{copy_region, IndexIter, IndexSpace, MultiIndex};
use crate::indexer::FieldQuery;
use crate::stencil::Stencil;




/**
 * A reusable scratch buffer holding one block's data surrounded by the ghost
 * cells a stencil reads. Elements are addressed relative to the origin of
 * the block's inner region, so ghosts have negative coordinates or
 * coordinates at or beyond the block extent.
 *
 * A lab is empty until `allocate` is called with a stencil and the largest
 * block it must hold. It is loaded by `load`, which copies the block, fills
 * the ghosts from the neighbour blocks, and applies boundary conditions.
 * Subsequent calls to `allocate` keep the buffer when the new requirement
 * fits into it. Use one lab per thread.
 */
#[derive(Debug)]
pub struct FieldLab<T: Element, const DIM: usize> {
    alignment: usize,
    block: Option<AlignedBlock<T>>,
    lab_space: IndexSpace<DIM>,
    lab_begin: MultiIndex<DIM>,
    maximum_space: IndexSpace<DIM>,
    stencil: Stencil<DIM>,
    active_space: IndexSpace<DIM>,
    active_lab_space: IndexSpace<DIM>,
    active_block: Option<MultiIndex<DIM>>,
}




// ============================================================================
impl<T: Element, const DIM: usize> FieldLab<T, DIM> {

    pub fn new() -> Self {
        Self {
            alignment: DEFAULT_ALIGNMENT,
            block: None,
            lab_space: IndexSpace::default(),
            lab_begin: MultiIndex::zero(),
            maximum_space: IndexSpace::default(),
            stencil: Stencil::default(),
            active_space: IndexSpace::default(),
            active_lab_space: IndexSpace::default(),
            active_block: None,
        }
    }

    /**
     * Create a lab whose buffer, and inner origin, are aligned to the given
     * number of bytes.
     */
    pub fn with_alignment(alignment: usize) -> Result<Self, Error> {
        if !alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(alignment))
        }
        Ok(Self { alignment, ..Self::new() })
    }




    /**
     * Prepare the lab for the given stencil and for blocks no larger than
     * `max_block`. The current buffer is kept if the padded extent needed
     * fits into the current one, unless `force` is set. Any loaded block is
     * invalidated.
     */
    pub fn allocate(&mut self, stencil: Stencil<DIM>, max_block: &IndexSpace<DIM>, force: bool) -> Result<(), Error> {
        let one = MultiIndex::splat(1);
        let per_align = (self.alignment / size_of::<T>().max(1)).max(1) as i64;

        // two extra cells per direction, so that blocks of a grid which
        // differ by one cell on the domain boundary fit the same lab
        let mut max_extent = max_block.dim() + MultiIndex::splat(2);
        let maximum_space = IndexSpace::from_extent(max_extent)?;

        let mut lab_begin = -stencil.start();
        lab_begin[0] = align_up(lab_begin[0], per_align);
        max_extent = max_extent + stencil.end() - one;
        max_extent[0] = align_up(max_extent[0], per_align);

        let lab_space = IndexSpace::from_extent(lab_begin + max_extent)?;
        let can_reuse = lab_space.dim().all_le(&self.lab_space.dim());

        if force || self.block.is_none() || !can_reuse {
            let block = AlignedBlock::zeroed(lab_space.len(), self.alignment)?;
            debug!("allocate lab {} ({} bytes) for stencil {} .. {}",
                lab_space.dim(),
                block.bytes(),
                stencil.start(),
                stencil.end());
            self.block = Some(block);
        } else {
            debug!("reuse lab allocation for stencil {} .. {} (new extent {})",
                stencil.start(),
                stencil.end(),
                lab_space.dim());
        }

        self.stencil = stencil;
        self.lab_space = lab_space;
        self.lab_begin = lab_begin;
        self.maximum_space = maximum_space;
        self.active_space = IndexSpace::default();
        self.active_lab_space = IndexSpace::default();
        self.active_block = None;
        Ok(())
    }




    /**
     * Load the given block, and apply the boundaries attached to its field.
     */
    pub fn load<Q>(&mut self, block: MultiIndex<DIM>, fields: &Q) -> Result<(), Error>
    where
        Q: FieldQuery<T, DIM> + ?Sized
    {
        self.load_with(block, fields, true, None)
    }

    /**
     * Load the given block, and apply the given boundaries in place of the
     * ones attached to its field.
     */
    pub fn load_with_boundaries<Q>(&mut self, block: MultiIndex<DIM>, fields: &Q, boundaries: &[Boundary<T>]) -> Result<(), Error>
    where
        Q: FieldQuery<T, DIM> + ?Sized
    {
        self.load_with(block, fields, true, Some(boundaries))
    }

    /**
     * Load the block at the given coordinate. The block's own data is copied
     * first, then the ghosts are filled from the neighbour blocks, which are
     * obtained from `fields` and must be periodic in the block coordinate.
     * Faces carrying a non-periodic boundary in the active boundary list
     * (`boundaries` if given, the field's own list otherwise) are not filled
     * from neighbours. Finally, if `apply_boundaries` is set, each boundary in
     * the active list is applied in order.
     */
    pub fn load_with<Q>(
        &mut self,
        block: MultiIndex<DIM>,
        fields: &Q,
        apply_boundaries: bool,
        boundaries: Option<&[Boundary<T>]>) -> Result<(), Error>
    where
        Q: FieldQuery<T, DIM> + ?Sized
    {
        if self.block.is_none() {
            return Err(Error::IllegalTransition { from: "empty", to: "loaded" })
        }
        self.active_block = None;

        let field = fields.field_at(block);
        let extent = field.space().dim();

        if !extent.all_le(&self.maximum_space.dim()) {
            return Err(Error::BlockTooLarge {
                extent: extent.to_string(),
                capacity: self.maximum_space.dim().to_string(),
            })
        }
        self.active_space = IndexSpace::from_extent(extent)?;
        self.active_lab_space = IndexSpace::new(
            self.stencil.start(),
            extent + self.stencil.end() - MultiIndex::splat(1))?;

        trace!("load block {} with extent {}", block, extent);

        let boundaries = boundaries.unwrap_or_else(|| field.boundaries());
        self.load_inner(field)?;
        self.load_ghosts(block, fields, &non_periodic_faces::<T, DIM>(boundaries))?;
        self.active_block = Some(block);

        if apply_boundaries {
            let applied = boundaries.iter().try_for_each(|boundary| boundary.apply(self));

            if applied.is_err() {
                self.active_block = None;
            }
            return applied
        }
        Ok(())
    }

    fn load_inner(&mut self, field: &Field<T, DIM>) -> Result<(), Error> {
        let local = self.active_space;
        let src = local.memory_region_in(&local);
        let dst = IndexSpace::new(self.lab_begin, self.lab_begin + local.dim())?.memory_region_in(&self.lab_space);
        let buffer = self.buffer_mut()?;
        copy_region(field.as_slice(), &src, buffer, &dst);
        Ok(())
    }

    fn load_ghosts<Q>(&mut self, block: MultiIndex<DIM>, fields: &Q, skip: &[[bool; 2]; DIM]) -> Result<(), Error>
    where
        Q: FieldQuery<T, DIM> + ?Sized
    {
        let one = MultiIndex::splat(1);
        let extent = self.active_space.dim();
        let halo_end = extent + self.stencil.end() - one;
        let stencil_start = self.stencil.start();
        let tensorial = self.stencil.is_tensorial();
        let lab_begin = self.lab_begin;
        let lab_space = self.lab_space;

        for offset in IndexSpace::from_extent(MultiIndex::splat(3))? {
            let bi = offset - one;

            if bi == MultiIndex::zero() {
                continue;
            }
            if (0..DIM).any(|j| (bi[j] == -1 && skip[j][0]) || (bi[j] == 1 && skip[j][1])) {
                continue;
            }
            if !tensorial && bi.abs().sum() > 1 {
                continue;
            }

            let mut begin = MultiIndex::zero();
            let mut end = MultiIndex::zero();

            for j in 0..DIM {
                let (b, e) = match bi[j] {
                    -1 => (stencil_start[j], 0),
                    0 => (0, extent[j]),
                    _ => (extent[j], halo_end[j]),
                };
                begin[j] = b;
                end[j] = e;
            }
            let halo = IndexSpace::new(begin, end)?;

            if halo.is_empty() {
                continue;
            }
            let shift = bi.component_mul(extent);
            let source = IndexSpace::new(begin - shift, end - shift)?;
            let neighbour = fields.field_at(block + bi);
            let neighbour_space = IndexSpace::from_extent(neighbour.space().dim())?;

            if !neighbour_space.contains_space(&source) {
                return Err(Error::NeighbourMismatch {
                    block: (block + bi).to_string(),
                    region: format!("{} .. {}", source.start(), source.end()),
                })
            }
            trace!("ghosts {} .. {} from neighbour {}", begin, end, block + bi);

            let src = source.memory_region_in(&neighbour_space);
            let dst = IndexSpace::new(begin + lab_begin, end + lab_begin)?.memory_region_in(&lab_space);
            copy_region(neighbour.as_slice(), &src, self.buffer_mut()?, &dst);
        }
        Ok(())
    }

    fn buffer_mut(&mut self) -> Result<&mut [T], Error> {
        self.block
            .as_mut()
            .map(AlignedBlock::as_mut_slice)
            .ok_or(Error::IllegalTransition { from: "empty", to: "loaded" })
    }




    /**
     * Return the element at the given coordinate, relative to the block's
     * inner origin. The coordinate must lie within the active lab space.
     */
    pub fn get(&self, index: MultiIndex<DIM>) -> &T {
        &self.as_slice()[self.offset(index)]
    }

    pub fn get_mut(&mut self, index: MultiIndex<DIM>) -> &mut T {
        let n = self.offset(index);
        &mut self.as_mut_slice()[n]
    }

    /**
     * Access by up to three scalar coordinates relative to the inner origin.
     * Unused trailing coordinates must be zero. Fails for dimensions above
     * three.
     */
    pub fn classic(&self, ix: i64, iy: i64, iz: i64) -> Result<&T, Error> {
        let n = self.classic_offset(ix, iy, iz)?;
        Ok(&self.as_slice()[n])
    }

    pub fn classic_mut(&mut self, ix: i64, iy: i64, iz: i64) -> Result<&mut T, Error> {
        let n = self.classic_offset(ix, iy, iz)?;
        Ok(&mut self.as_mut_slice()[n])
    }

    fn offset(&self, index: MultiIndex<DIM>) -> usize {
        debug_assert!(
            self.active_lab_space.is_empty() || self.active_lab_space.contains(index),
            "lab index {} outside of the active stencil region", index);
        self.lab_space.flat_index(index + self.lab_begin)
    }

    fn classic_offset(&self, ix: i64, iy: i64, iz: i64) -> Result<usize, Error> {
        let b = |axis: usize| if axis < DIM { self.lab_begin[axis] } else { 0 };
        self.lab_space.classic_flat_index(ix + b(0), iy + b(1), iz + b(2))
    }




    /**
     * The whole lab buffer, including alignment padding.
     */
    pub fn as_slice(&self) -> &[T] {
        self.block.as_ref().map(AlignedBlock::as_slice).unwrap_or_default()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.block.as_mut().map(AlignedBlock::as_mut_slice).unwrap_or_default()
    }

    /**
     * Address of the first element of the lab buffer, or null if the lab is
     * not allocated.
     */
    pub fn as_ptr(&self) -> *const T {
        self.block.as_ref().map_or(core::ptr::null(), AlignedBlock::as_ptr)
    }

    /**
     * Flat position of the block's inner origin in the lab buffer.
     */
    pub fn inner_offset(&self) -> usize {
        if self.block.is_none() {
            0
        } else {
            self.lab_space.flat_index(self.lab_begin)
        }
    }

    /**
     * Number of bytes held by the lab buffer, and the number of bytes the
     * active block and its ghosts occupy.
     */
    pub fn footprint(&self) -> BlockBytes {
        match &self.block {
            None => BlockBytes::default(),
            Some(block) => {
                let used = self.active_space.dim() + self.stencil.end() - self.stencil.start() - MultiIndex::splat(1);
                BlockBytes {
                    allocated: block.bytes(),
                    used: used.product() as usize * size_of::<T>(),
                }
            }
        }
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn active_stencil(&self) -> Stencil<DIM> {
        self.stencil
    }

    /**
     * Index space of the loaded block, with its origin at zero.
     */
    pub fn active_space(&self) -> IndexSpace<DIM> {
        self.active_space
    }

    /**
     * Index space of the loaded block including its ghosts.
     */
    pub fn active_lab_space(&self) -> IndexSpace<DIM> {
        self.active_lab_space
    }

    pub fn active_block(&self) -> Result<MultiIndex<DIM>, Error> {
        self.active_block.ok_or(Error::NoFieldLoaded)
    }

    /**
     * Largest block extent the current allocation can hold.
     */
    pub fn maximum_space(&self) -> IndexSpace<DIM> {
        self.maximum_space
    }

    /**
     * The padded index space of the lab buffer, with the buffer's first
     * element at zero.
     */
    pub fn lab_space(&self) -> IndexSpace<DIM> {
        self.lab_space
    }

    pub fn is_allocated(&self) -> bool {
        self.block.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.active_block.is_some()
    }

    /**
     * Iterate over the inner coordinates of the loaded block.
     */
    pub fn iter(&self) -> IndexIter<DIM> {
        self.active_space.iter()
    }
}

impl<T: Element, const DIM: usize> Default for FieldLab<T, DIM> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element, const DIM: usize> Index<MultiIndex<DIM>> for FieldLab<T, DIM> {
    type Output = T;

    fn index(&self, index: MultiIndex<DIM>) -> &T {
        self.get(index)
    }
}

impl<T: Element, const DIM: usize> IndexMut<MultiIndex<DIM>> for FieldLab<T, DIM> {
    fn index_mut(&mut self, index: MultiIndex<DIM>) -> &mut T {
        self.get_mut(index)
    }
}

fn align_up(n: i64, m: i64) -> i64 {
    ((n + m - 1) / m) * m
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::FieldLab;
    use crate::boundary::{Boundary, Side};
    use crate::data::{BlockBytes, BlockData};
    use crate::error::Error;
    use crate::field::Field;
    use crate::index_space::{IndexSpace, MultiIndex};
    use crate::stencil::Stencil;

    fn ramp(n: i64) -> Field<f64, 1> {
        Field::from_function(IndexSpace::from_extent([n].into()).unwrap(), |i| i[0] as f64).unwrap()
    }

    #[test]
    fn load_before_allocate_is_illegal() {
        let mut lab = FieldLab::<f64, 1>::new();
        assert!(!lab.is_allocated());
        assert_eq!(
            lab.load(MultiIndex::zero(), &ramp(4)),
            Err(Error::IllegalTransition { from: "empty", to: "loaded" }));
        assert_eq!(lab.active_block(), Err(Error::NoFieldLoaded));
        assert_eq!(lab.footprint(), BlockBytes::default());
    }

    #[test]
    fn lab_moves_through_its_states() {
        let field = ramp(16);
        let mut lab = FieldLab::new();
        lab.allocate(Stencil::uniform(-2, 3, false).unwrap(), &field.space(), false).unwrap();
        assert!(lab.is_allocated() && !lab.is_loaded());

        lab.load(MultiIndex::new([0]), &field).unwrap();
        assert!(lab.is_loaded());
        assert_eq!(lab.active_block(), Ok(MultiIndex::new([0])));
        assert_eq!(lab.active_space(), field.space());
        assert_eq!(lab.active_lab_space(), IndexSpace::new([-2].into(), [18].into()).unwrap());

        lab.allocate(Stencil::uniform(-1, 2, false).unwrap(), &field.space(), false).unwrap();
        assert!(lab.is_allocated() && !lab.is_loaded());
    }

    #[test]
    fn allocation_is_padded_for_alignment() {
        let field = ramp(16);
        let mut lab = FieldLab::new();
        lab.allocate(Stencil::uniform(-2, 3, false).unwrap(), &field.space(), false).unwrap();
        assert_eq!(lab.maximum_space().dim(), MultiIndex::new([18]));
        assert_eq!(lab.lab_space().dim(), MultiIndex::new([24]));
        assert_eq!(lab.inner_offset(), 4);
        assert_eq!(lab.footprint().allocated, 192);

        lab.load(MultiIndex::zero(), &field).unwrap();
        assert_eq!(lab.footprint(), BlockBytes { allocated: 192, used: 160 });
        assert_eq!(lab.as_slice()[lab.inner_offset()..].as_ptr() as usize % 32, 0);
    }

    #[test]
    fn allocation_is_reused_unless_larger_or_forced() {
        let field = ramp(16);
        let mut lab = FieldLab::<f64, 1>::new();
        lab.allocate(Stencil::uniform(-2, 3, false).unwrap(), &field.space(), false).unwrap();
        let (ptr, bytes) = (lab.as_ptr(), lab.footprint().allocated);

        lab.allocate(Stencil::uniform(-1, 2, false).unwrap(), &field.space(), false).unwrap();
        assert_eq!(lab.as_ptr(), ptr);
        assert_eq!(lab.footprint().allocated, bytes);

        lab.allocate(Stencil::uniform(-5, 6, false).unwrap(), &field.space(), false).unwrap();
        assert_ne!(lab.as_ptr(), ptr);
        assert_eq!(lab.footprint().allocated, 256);

        let ptr = lab.as_ptr();
        lab.allocate(Stencil::uniform(-5, 6, false).unwrap(), &field.space(), true).unwrap();
        assert_ne!(lab.as_ptr(), ptr);
    }

    #[test]
    fn oversized_block_is_rejected() {
        let mut lab = FieldLab::new();
        lab.allocate(Stencil::uniform(-1, 2, false).unwrap(), &IndexSpace::from_extent([4].into()).unwrap(), false).unwrap();
        assert!(lab.load(MultiIndex::zero(), &ramp(6)).is_ok());
        assert!(matches!(lab.load(MultiIndex::zero(), &ramp(7)), Err(Error::BlockTooLarge { .. })));
        assert!(!lab.is_loaded());
    }

    #[test]
    fn boundaries_can_be_replaced_per_load() {
        let field = ramp(8);
        let mut lab = FieldLab::new();
        lab.allocate(Stencil::uniform(-1, 2, false).unwrap(), &field.space(), false).unwrap();
        lab.load_with_boundaries(MultiIndex::zero(), &field, &[Boundary::dirichlet(0, Side::High, -1.0)]).unwrap();
        assert_eq!(lab[MultiIndex::new([-1])], 7.0);
        assert_eq!(lab[MultiIndex::new([8])], -1.0);

        lab.load_with(MultiIndex::zero(), &field, false, None).unwrap();
        assert_eq!(lab[MultiIndex::new([8])], 0.0);
    }

    #[test]
    fn classic_access_matches_index_access() {
        let space = IndexSpace::from_extent([4, 3].into()).unwrap();
        let field = Field::from_function(space, |i| (i[0] + 10 * i[1]) as f32).unwrap();
        let mut lab = FieldLab::new();
        lab.allocate(Stencil::uniform(-1, 2, true).unwrap(), &space, false).unwrap();
        lab.load(MultiIndex::zero(), &field).unwrap();
        assert_eq!(*lab.classic(2, 1, 0).unwrap(), 12.0);
        assert_eq!(*lab.classic(-1, -1, 0).unwrap(), 23.0);
        *lab.classic_mut(0, 0, 0).unwrap() = 5.0;
        assert_eq!(lab[MultiIndex::new([0, 0])], 5.0);

        let mut lab4 = FieldLab::<f32, 4>::new();
        let space4 = IndexSpace::from_extent(MultiIndex::splat(2)).unwrap();
        lab4.allocate(Stencil::default(), &space4, false).unwrap();
        assert_eq!(lab4.classic(0, 0, 0), Err(Error::UnsupportedAccess(4)));
    }

    #[test]
    fn custom_alignment_is_honoured() {
        assert_eq!(FieldLab::<f64, 2>::with_alignment(48).unwrap_err(), Error::InvalidAlignment(48));
        let space = IndexSpace::from_extent([5, 5].into()).unwrap();
        let field = Field::from_function(space, |i| (i[0] * i[1]) as f64).unwrap();

        for alignment in [8, 64, 128] {
            let mut lab = FieldLab::with_alignment(alignment).unwrap();
            lab.allocate(Stencil::uniform(-3, 4, true).unwrap(), &space, false).unwrap();
            lab.load(MultiIndex::zero(), &field).unwrap();
            assert_eq!(lab.as_ptr() as usize % alignment, 0);
            assert_eq!(lab.as_slice()[lab.inner_offset()..].as_ptr() as usize % alignment, 0);
            assert!(lab.iter().all(|i| lab[i] == field[i]));
        }
    }
}
