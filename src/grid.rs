use log::info;
use rayon::prelude::*;
use crate::boundary::{self, Boundary, Side};
use crate::aligned::DEFAULT_ALIGNMENT;
use crate::data::{BlockBytes, BlockData, Data, Element};
use crate::error::Error;
use crate::field::{Field, FieldState};
use crate::index_space::{IndexSpace, MultiIndex};
use crate::indexer::PeriodicIndexFunctor;
use crate::lab::FieldLab;
use crate::stencil::Stencil;




/**
 * A Cartesian arrangement of equally sized blocks. The grid stores a tensor
 * quantity of the given rank, which has `DIM^rank` components; every
 * component is a container of block fields in flat block order. Block
 * fields are indexed locally from zero, like the lab a block is loaded
 * into; block `b` holds the global cells from `b * block_extent` to
 * `(b + 1) * block_extent`.
 */
#[derive(Clone, Debug)]
pub struct Grid<T: Element, const DIM: usize> {
    blocks: IndexSpace<DIM>,
    block_extent: MultiIndex<DIM>,
    rank: usize,
    alignment: usize,
    components: Vec<Vec<Field<T, DIM>>>,
}




// ============================================================================
impl<T: Element, const DIM: usize> Grid<T, DIM> {

    pub fn new(num_blocks: MultiIndex<DIM>, block_extent: MultiIndex<DIM>, rank: usize) -> Result<Self, Error> {
        Self::with_alignment(num_blocks, block_extent, rank, DEFAULT_ALIGNMENT)
    }

    /**
     * Create a grid whose block fields, and the labs it loads them into,
     * are aligned to the given number of bytes.
     */
    pub fn with_alignment(
        num_blocks: MultiIndex<DIM>,
        block_extent: MultiIndex<DIM>,
        rank: usize,
        alignment: usize) -> Result<Self, Error>
    {
        let one = MultiIndex::splat(1);

        if !one.all_le(&num_blocks) || !one.all_le(&block_extent) {
            return Err(Error::InvalidIndexSpace {
                start: num_blocks.to_string(),
                end: block_extent.to_string(),
            })
        }
        let count = u32::try_from(rank)
            .ok()
            .and_then(|rank| DIM.checked_pow(rank))
            .ok_or(Error::InvalidRank { rank, dim: DIM })?;
        let blocks = IndexSpace::from_extent(num_blocks)?;
        let space = IndexSpace::from_extent(block_extent)?;
        let mut components = Vec::with_capacity(count);

        for component in 0..count {
            let fields = blocks
                .iter()
                .map(|block_index| -> Result<Field<T, DIM>, Error> {
                    let state = FieldState { rank, component, block_index };
                    Ok(Field::from_data(Data::with_alignment(space, alignment)?).with_state(state))
                })
                .collect::<Result<Vec<_>, Error>>()?;
            components.push(fields);
        }
        info!("grid of {} blocks with extent {}, {} component(s) per block", num_blocks, block_extent, count);

        Ok(Self { blocks, block_extent, rank, alignment, components })
    }

    /**
     * The range of block coordinates.
     */
    pub fn blocks(&self) -> IndexSpace<DIM> {
        self.blocks
    }

    pub fn block_extent(&self) -> MultiIndex<DIM> {
        self.block_extent
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /**
     * The global coordinate of a block's first cell.
     */
    pub fn block_origin(&self, block: MultiIndex<DIM>) -> MultiIndex<DIM> {
        block.component_mul(self.block_extent)
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /**
     * The index space of all cells in the grid.
     */
    pub fn global_space(&self) -> IndexSpace<DIM> {
        IndexSpace::from_extent(self.blocks.dim().component_mul(self.block_extent)).unwrap_or_default()
    }

    pub fn fields(&self, component: usize) -> Result<&[Field<T, DIM>], Error> {
        let count = self.components.len();
        self.components
            .get(component)
            .map(Vec::as_slice)
            .ok_or(Error::InvalidComponent { component, count })
    }

    pub fn fields_mut(&mut self, component: usize) -> Result<&mut [Field<T, DIM>], Error> {
        let count = self.components.len();
        self.components
            .get_mut(component)
            .map(Vec::as_mut_slice)
            .ok_or(Error::InvalidComponent { component, count })
    }

    /**
     * The field of one component at the given block coordinate, which must
     * be inside the block range.
     */
    pub fn field(&self, component: usize, block: MultiIndex<DIM>) -> Result<&Field<T, DIM>, Error> {
        let n = self.block_offset(block)?;
        Ok(&self.fields(component)?[n])
    }

    pub fn field_mut(&mut self, component: usize, block: MultiIndex<DIM>) -> Result<&mut Field<T, DIM>, Error> {
        let n = self.block_offset(block)?;
        Ok(&mut self.fields_mut(component)?[n])
    }

    fn block_offset(&self, block: MultiIndex<DIM>) -> Result<usize, Error> {
        if !self.blocks.contains(block) {
            return Err(Error::InvalidBlock(block.to_string()))
        }
        Ok(self.blocks.global_flat_index(block))
    }

    /**
     * Set every cell of one component from a function of its global index.
     * Blocks are filled in parallel.
     */
    pub fn fill<F>(&mut self, component: usize, f: F) -> Result<(), Error>
    where
        F: Fn(MultiIndex<DIM>) -> T + Sync + Send
    {
        let extent = self.block_extent;

        self.fields_mut(component)?.par_iter_mut().for_each(|field| {
            let origin = field.state().block_index.component_mul(extent);
            let space = field.space();
            for (x, index) in field.as_mut_slice().iter_mut().zip(space.iter()) {
                *x = f(origin + index)
            }
        });
        Ok(())
    }

    /**
     * A periodic lookup of one component's block fields.
     */
    pub fn index_functor(&self, component: usize) -> Result<PeriodicIndexFunctor<'_, T, DIM>, Error> {
        PeriodicIndexFunctor::new(self.blocks, self.fields(component)?)
    }

    /**
     * Attach domain boundaries to the blocks. Each boundary is given to the
     * blocks which touch its face of the domain; the boundary lists of all
     * other blocks are cleared, so their ghosts come from their neighbours.
     */
    pub fn set_domain_boundaries(&mut self, boundaries: &[Boundary<T>]) -> Result<(), Error> {
        boundary::validate::<T, DIM>(boundaries)?;
        let last = self.blocks.end() - MultiIndex::splat(1);

        for fields in &mut self.components {
            for field in fields.iter_mut() {
                let block = field.state().block_index;
                let touching = boundaries
                    .iter()
                    .filter(|b| {
                        let info = b.info();
                        match info.side {
                            Side::Low => block[info.dir] == 0,
                            Side::High => block[info.dir] == last[info.dir],
                        }
                    })
                    .cloned()
                    .collect();
                field.set_boundaries(touching)?;
            }
        }
        Ok(())
    }

    /**
     * Load every block of one component into a lab for the given stencil,
     * and evaluate `f` on each loaded lab. Blocks are processed in parallel
     * with one lab per worker thread, allocated once and reused for every
     * block the worker loads. The results are returned in flat block order.
     */
    pub fn map_labs<F, R>(&self, component: usize, stencil: Stencil<DIM>, f: F) -> Result<Vec<R>, Error>
    where
        F: Fn(&FieldLab<T, DIM>) -> R + Sync + Send,
        R: Send,
    {
        let functor = self.index_functor(component)?;
        let max_block = IndexSpace::from_extent(self.block_extent)?;
        let blocks = self.blocks;
        let alignment = self.alignment;

        (0..blocks.len())
            .into_par_iter()
            .map_init(
                || -> Result<FieldLab<T, DIM>, Error> {
                    let mut lab = FieldLab::with_alignment(alignment)?;
                    lab.allocate(stencil, &max_block, false)?;
                    Ok(lab)
                },
                |lab, n| -> Result<R, Error> {
                    let lab = lab.as_mut().map_err(|e| e.clone())?;
                    lab.load(blocks.global_multi_index(n), &functor)?;
                    Ok(f(lab))
                })
            .collect()
    }

    /**
     * Memory held by all block fields of the grid.
     */
    pub fn footprint(&self) -> BlockBytes {
        self.components
            .iter()
            .flatten()
            .map(|field| field.footprint())
            .fold(BlockBytes::default(), |a, b| a + b)
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::Grid;
    use crate::boundary::{Boundary, Side};
    use crate::data::BlockData;
    use crate::error::Error;
    use crate::index_space::{IndexSpace, MultiIndex};
    use crate::indexer::FieldQuery;
    use crate::stencil::Stencil;

    fn profile(i: MultiIndex<2>) -> f64 {
        (i[0] + 100 * i[1]) as f64
    }

    #[test]
    fn grid_has_rank_dependent_components() {
        let scalar = Grid::<f64, 3>::new(MultiIndex::splat(2), MultiIndex::splat(4), 0).unwrap();
        let vector = Grid::<f64, 3>::new(MultiIndex::splat(2), MultiIndex::splat(4), 1).unwrap();
        let tensor = Grid::<f64, 2>::new(MultiIndex::splat(2), MultiIndex::splat(4), 2).unwrap();
        assert_eq!(scalar.num_components(), 1);
        assert_eq!(vector.num_components(), 3);
        assert_eq!(tensor.num_components(), 4);
        assert_eq!(vector.fields(2).unwrap()[5].state().component, 2);
        assert_eq!(vector.fields(3).unwrap_err(), Error::InvalidComponent { component: 3, count: 3 });
        assert_eq!(scalar.footprint().used, 8 * 64 * 8);
    }

    #[test]
    fn blocks_cover_the_global_space() {
        let grid = Grid::<f64, 2>::new([3, 2].into(), [4, 5].into(), 0).unwrap();
        assert_eq!(grid.global_space(), IndexSpace::from_extent([12, 10].into()).unwrap());
        let field = grid.field(0, [2, 1].into()).unwrap();
        assert_eq!(field.space(), IndexSpace::from_extent([4, 5].into()).unwrap());
        assert_eq!(grid.block_origin([2, 1].into()), MultiIndex::new([8, 5]));
        assert_eq!(field.state().block_index, MultiIndex::new([2, 1]));
        assert!(grid.field(0, [3, 0].into()).is_err());
        assert!(Grid::<f64, 2>::new([0, 2].into(), [4, 4].into(), 0).is_err());
    }

    #[test]
    fn index_functor_wraps_blocks() {
        let grid = Grid::<f32, 2>::new([3, 2].into(), [2, 2].into(), 0).unwrap();
        let functor = grid.index_functor(0).unwrap();
        assert_eq!(functor.field_at([-1, 2].into()).state().block_index, MultiIndex::new([2, 0]));
    }

    #[test]
    fn domain_boundaries_attach_to_edge_blocks_only() {
        let mut grid = Grid::<f64, 2>::new([3, 3].into(), [2, 2].into(), 1).unwrap();
        grid.set_domain_boundaries(&[
            Boundary::dirichlet(0, Side::Low, 1.0),
            Boundary::absorbing(1, Side::High),
        ]).unwrap();

        for component in 0..2 {
            assert_eq!(grid.field(component, [1, 1].into()).unwrap().boundaries().len(), 0);
            assert_eq!(grid.field(component, [0, 1].into()).unwrap().boundaries().len(), 1);
            assert_eq!(grid.field(component, [0, 2].into()).unwrap().boundaries().len(), 2);
            assert_eq!(grid.field(component, [2, 2].into()).unwrap().boundaries()[0].name(), "Zeroth-Order Absorbing");
        }
        assert!(grid.set_domain_boundaries(&[Boundary::absorbing(2, Side::High)]).is_err());
    }

    #[test]
    fn periodic_grid_labs_see_global_neighbours() {
        let mut grid = Grid::<f64, 2>::new([3, 2].into(), [4, 3].into(), 0).unwrap();
        grid.fill(0, profile).unwrap();
        let global = grid.global_space();
        let extent = grid.block_extent();

        for tensorial in [false, true] {
            let stencil = Stencil::uniform(-2, 3, tensorial).unwrap();
            let checks = grid.map_labs(0, stencil, |lab| {
                let origin = lab.active_block().unwrap().component_mul(extent);
                lab.active_lab_space().iter().all(|q| {
                    let corner = (0..2).filter(|&j| q[j] < 0 || q[j] >= extent[j]).count() > 1;
                    if corner && !tensorial {
                        return true;
                    }
                    let mut g = origin + q;
                    for j in 0..2 {
                        g[j] = g[j].rem_euclid(global.dim()[j]);
                    }
                    lab[q] == profile(g)
                })
            }).unwrap();
            assert_eq!(checks.len(), 6);
            assert!(checks.into_iter().all(|ok| ok));
        }
    }

    #[test]
    fn labs_apply_domain_boundaries() {
        let mut grid = Grid::<f64, 2>::new([2, 2].into(), [3, 3].into(), 0).unwrap();
        grid.fill(0, profile).unwrap();
        grid.set_domain_boundaries(&[Boundary::dirichlet(0, Side::Low, -1.0)]).unwrap();

        let ghosts = grid.map_labs(0, Stencil::uniform(-1, 2, false).unwrap(), |lab| {
            lab[MultiIndex::new([-1, 1])]
        }).unwrap();

        // blocks 0 and 2 touch the low x face, blocks 1 and 3 see their left neighbour
        assert_eq!(ghosts, vec![-1.0, profile([2, 1].into()), -1.0, profile([2, 4].into())]);
    }

    #[test]
    fn loaded_labs_match_their_block_fields() {
        let mut grid = Grid::<f64, 1>::new([2].into(), [4].into(), 0).unwrap();
        grid.fill(0, |i| i[0] as f64).unwrap();
        assert_eq!(grid.field(0, [1].into()).unwrap()[MultiIndex::new([0])], 4.0);

        let mut grid = Grid::<f64, 2>::new([3, 2].into(), [4, 3].into(), 0).unwrap();
        grid.fill(0, profile).unwrap();
        let stencil = Stencil::uniform(-1, 2, true).unwrap();

        let matches = grid.map_labs(0, stencil, |lab| {
            let field = grid.field(0, lab.active_block().unwrap()).unwrap();
            lab.active_space() == field.space() && field.space().iter().all(|p| lab[p] == field[p])
        }).unwrap();
        assert_eq!(matches, vec![true; 6]);
    }

    #[test]
    fn grid_alignment_applies_to_fields_and_labs() {
        let grid = Grid::<f32, 3>::with_alignment(MultiIndex::splat(2), [3, 2, 2].into(), 1, 64).unwrap();
        assert_eq!(grid.alignment(), 64);
        for component in 0..3 {
            assert!(grid.fields(component).unwrap().iter().all(|field| field.data().as_ptr() as usize % 64 == 0));
        }
        let labs = grid.map_labs(2, Stencil::uniform(-1, 2, false).unwrap(), |lab| {
            lab.as_ptr() as usize % 64 == 0 && lab.alignment() == 64
        }).unwrap();
        assert!(labs.into_iter().all(|aligned| aligned));
        assert!(Grid::<f32, 2>::with_alignment(MultiIndex::splat(2), MultiIndex::splat(2), 0, 24).is_err());
    }

    #[test]
    fn oversized_rank_is_an_error() {
        assert_eq!(
            Grid::<f64, 3>::new(MultiIndex::splat(2), MultiIndex::splat(2), 50).unwrap_err(),
            Error::InvalidRank { rank: 50, dim: 3 });
        assert_eq!(
            Grid::<f64, 2>::new(MultiIndex::splat(2), MultiIndex::splat(2), usize::MAX).unwrap_err(),
            Error::InvalidRank { rank: usize::MAX, dim: 2 });
    }
}
