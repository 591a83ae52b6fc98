use crate::data::Element;
use crate::error::Error;
use crate::field::Field;
use crate::index_space::{IndexSpace, MultiIndex};




/**
 * Resolves a block coordinate to the field stored for that block. This is
 * how a lab finds the neighbours of the block it loads, so implementations
 * must accept coordinates outside the block range and map them
 * periodically.
 */
pub trait FieldQuery<T: Element, const DIM: usize> {
    fn field_at(&self, block: MultiIndex<DIM>) -> &Field<T, DIM>;
}




/**
 * A single field is its own neighbour in every direction.
 */
impl<T: Element, const DIM: usize> FieldQuery<T, DIM> for Field<T, DIM> {
    fn field_at(&self, _block: MultiIndex<DIM>) -> &Field<T, DIM> {
        self
    }
}




/**
 * Looks up fields in a container laid out in flat order over a range of
 * block coordinates, wrapping every coordinate periodically into the range.
 * Lookups never leave the container; halo data owned elsewhere must be
 * staged into it before labs are loaded.
 */
#[derive(Clone, Copy, Debug)]
pub struct PeriodicIndexFunctor<'a, T: Element, const DIM: usize> {
    blocks: IndexSpace<DIM>,
    fields: &'a [Field<T, DIM>],
}




// ============================================================================
impl<'a, T: Element, const DIM: usize> PeriodicIndexFunctor<'a, T, DIM> {

    /**
     * Create a functor over the given block range. The container must hold
     * exactly one field per block, and the range must not be empty.
     */
    pub fn new(blocks: IndexSpace<DIM>, fields: &'a [Field<T, DIM>]) -> Result<Self, Error> {
        if fields.len() != blocks.len() || blocks.is_empty() {
            return Err(Error::ContainerSize {
                expected: blocks.len(),
                found: fields.len(),
            });
        }
        Ok(Self { blocks, fields })
    }

    pub fn blocks(&self) -> IndexSpace<DIM> {
        self.blocks
    }

    /**
     * Map a block coordinate into the block range, component by component.
     */
    pub fn wrap(&self, block: MultiIndex<DIM>) -> MultiIndex<DIM> {
        let start = self.blocks.start();
        let extent = self.blocks.dim();
        let mut wrapped = block;

        for axis in 0..DIM {
            wrapped[axis] = (block[axis] - start[axis]).rem_euclid(extent[axis]) + start[axis];
        }
        wrapped
    }
}

impl<'a, T: Element, const DIM: usize> FieldQuery<T, DIM> for PeriodicIndexFunctor<'a, T, DIM> {
    fn field_at(&self, block: MultiIndex<DIM>) -> &Field<T, DIM> {
        &self.fields[self.blocks.global_flat_index(self.wrap(block))]
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{FieldQuery, PeriodicIndexFunctor};
    use crate::error::Error;
    use crate::field::{Field, FieldState};
    use crate::index_space::{IndexSpace, MultiIndex};

    fn fields(blocks: IndexSpace<2>) -> Vec<Field<f64, 2>> {
        blocks
            .iter()
            .map(|block_index| {
                let state = FieldState { rank: 0, component: 0, block_index };
                Field::new(IndexSpace::from_extent([2, 2].into()).unwrap()).unwrap().with_state(state)
            })
            .collect()
    }

    #[test]
    fn functor_wraps_coordinates_periodically() {
        let blocks = IndexSpace::from_extent([3, 2].into()).unwrap();
        let fields = fields(blocks);
        let functor = PeriodicIndexFunctor::new(blocks, &fields).unwrap();
        let at = |i: [i64; 2]| functor.field_at(i.into()).state().block_index;
        assert_eq!(at([0, 0]), MultiIndex::new([0, 0]));
        assert_eq!(at([2, 1]), MultiIndex::new([2, 1]));
        assert_eq!(at([-1, 0]), MultiIndex::new([2, 0]));
        assert_eq!(at([3, -1]), MultiIndex::new([0, 1]));
        assert_eq!(at([-4, 5]), MultiIndex::new([2, 1]));
    }

    #[test]
    fn functor_respects_range_start() {
        let blocks = IndexSpace::new([1, 1].into(), [3, 2].into()).unwrap();
        let fields = fields(blocks);
        let functor = PeriodicIndexFunctor::new(blocks, &fields).unwrap();
        assert_eq!(functor.wrap([0, 1].into()), MultiIndex::new([2, 1]));
        assert_eq!(functor.wrap([3, 0].into()), MultiIndex::new([1, 1]));
        assert_eq!(functor.field_at([0, 0].into()).state().block_index, MultiIndex::new([2, 1]));
    }

    #[test]
    fn functor_requires_one_field_per_block() {
        let blocks = IndexSpace::from_extent([2, 2].into()).unwrap();
        let fields = fields(IndexSpace::from_extent([2, 1].into()).unwrap());
        assert_eq!(
            PeriodicIndexFunctor::new(blocks, &fields).unwrap_err(),
            Error::ContainerSize { expected: 4, found: 2 });
    }

    #[test]
    fn single_field_is_its_own_neighbour() {
        let field = Field::<f32, 2>::new(IndexSpace::from_extent([2, 2].into()).unwrap()).unwrap();
        assert!(std::ptr::eq(field.field_at([5, -3].into()), &field));
    }
}
