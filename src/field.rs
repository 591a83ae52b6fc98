use core::ops::{Index, IndexMut};
use log::warn;
use crate::boundary::{self, Boundary};
use crate::data::{BlockBytes, BlockData, Data, Element};
use crate::error::Error;
use crate::index_space::{IndexSpace, MultiIndex};




/**
 * Identity of a block field within a grid: the tensor rank of the quantity
 * it is part of, the component it stores, and the coordinate of its block.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FieldState<const DIM: usize> {
    pub rank: usize,
    pub component: usize,
    pub block_index: MultiIndex<DIM>,
}




/**
 * Block data together with its identity and the boundaries that apply on
 * the domain faces it touches. A field without boundaries is periodic in
 * every direction.
 */
#[derive(Clone, Debug)]
pub struct Field<T: Element, const DIM: usize> {
    data: Data<T, DIM>,
    state: FieldState<DIM>,
    boundaries: Vec<Boundary<T>>,
}




// ============================================================================
impl<T: Element, const DIM: usize> Field<T, DIM> {

    pub fn new(space: IndexSpace<DIM>) -> Result<Self, Error> {
        Ok(Self::from_data(Data::new(space)?))
    }

    pub fn from_data(data: Data<T, DIM>) -> Self {
        Self {
            data,
            state: FieldState::default(),
            boundaries: Vec::new(),
        }
    }

    /**
     * Generate a field over the given index space, with values defined from
     * a closure of the global index.
     */
    pub fn from_function<F>(space: IndexSpace<DIM>, f: F) -> Result<Self, Error>
    where
        F: Fn(MultiIndex<DIM>) -> T
    {
        Ok(Self::from_data(Data::from_function(space, f)?))
    }

    pub fn with_state(mut self, state: FieldState<DIM>) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> &FieldState<DIM> {
        &self.state
    }

    pub fn data(&self) -> &Data<T, DIM> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Data<T, DIM> {
        &mut self.data
    }

    pub fn boundaries(&self) -> &[Boundary<T>] {
        &self.boundaries
    }

    /**
     * Replace the boundary list of this field. Fails if a boundary names a
     * direction outside the field's dimension, or if two boundaries share a
     * face.
     */
    pub fn set_boundaries(&mut self, boundaries: Vec<Boundary<T>>) -> Result<(), Error> {
        boundary::validate::<T, DIM>(&boundaries)?;

        if !self.boundaries.is_empty() {
            warn!("replacing {} boundaries on block {}", self.boundaries.len(), self.state.block_index);
        }
        self.boundaries = boundaries;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.data.iter()
    }

    /**
     * Iterate over (global index, value) pairs.
     */
    pub fn iter_indexed(&self) -> impl Iterator<Item = (MultiIndex<DIM>, &T)> + '_ {
        self.space().iter().zip(self.data.iter())
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_mut_slice()
    }
}

impl<T: Element, const DIM: usize> BlockData<T, DIM> for Field<T, DIM> {
    fn space(&self) -> IndexSpace<DIM> {
        self.data.space()
    }

    fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    fn bytes(&self) -> usize {
        self.data.bytes()
    }

    fn footprint(&self) -> BlockBytes {
        self.data.footprint()
    }
}

impl<T: Element, const DIM: usize> Index<MultiIndex<DIM>> for Field<T, DIM> {
    type Output = T;

    fn index(&self, index: MultiIndex<DIM>) -> &T {
        &self.data[index]
    }
}

impl<T: Element, const DIM: usize> IndexMut<MultiIndex<DIM>> for Field<T, DIM> {
    fn index_mut(&mut self, index: MultiIndex<DIM>) -> &mut T {
        &mut self.data[index]
    }
}




// ============================================================================
#[cfg(test)]
mod test {

    use super::{Field, FieldState};
    use crate::boundary::{Boundary, Side};
    use crate::data::BlockData;
    use crate::error::Error;
    use crate::index_space::{IndexSpace, MultiIndex};

    #[test]
    fn field_is_initialised_from_function() {
        let space = IndexSpace::new([4, 4].into(), [6, 7].into()).unwrap();
        let field = Field::from_function(space, |i| i[0] * i[1]).unwrap();
        assert_eq!(field[MultiIndex::new([5, 6])], 30);
        assert_eq!(field.iter().count(), 6);
        assert_eq!(field.space(), space);
        assert!(field.iter_indexed().all(|(i, &x)| x == i[0] * i[1]));
        assert!(field.boundaries().is_empty());
    }

    #[test]
    fn field_state_is_attached() {
        let state = FieldState { rank: 1, component: 2, block_index: [1, 0, 3].into() };
        let field = Field::<f64, 3>::new(IndexSpace::from_extent(MultiIndex::splat(2)).unwrap())
            .unwrap()
            .with_state(state);
        assert_eq!(field.state().component, 2);
        assert_eq!(field.state().block_index, MultiIndex::new([1, 0, 3]));
    }

    #[test]
    fn boundary_list_is_validated() {
        let mut field = Field::<f64, 2>::new(IndexSpace::from_extent([2, 2].into()).unwrap()).unwrap();
        field.set_boundaries(vec![Boundary::dirichlet(0, Side::Low, 1.0)]).unwrap();
        assert_eq!(field.boundaries().len(), 1);
        assert_eq!(
            field.set_boundaries(vec![Boundary::absorbing(3, Side::Low)]),
            Err(Error::InvalidDirection { dir: 3, dim: 2 }));
        assert_eq!(field.boundaries()[0].name(), "Dirichlet");
    }

    #[test]
    fn field_clone_is_deep() {
        let mut a = Field::<i32, 1>::new(IndexSpace::from_extent([3].into()).unwrap()).unwrap();
        let b = a.clone();
        a[MultiIndex::new([1])] = 4;
        assert_eq!(b[MultiIndex::new([1])], 0);
        assert_eq!(a.as_slice(), &[0, 4, 0]);
    }
}
