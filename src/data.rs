use core::ops::{Index, IndexMut, Mul};
use bytemuck::Pod;
use crate::aligned::{AlignedBlock, DEFAULT_ALIGNMENT};
use crate::error::Error;
use crate::index_space::{IndexSpace, MultiIndex};




/**
 * Trait for the element type stored in block data. Elements are plain old
 * data, so inner and ghost regions can be moved with bitwise copies, and they
 * can be scaled by a value of their own type (needed for signed
 * reflections).
 */
pub trait Element: Pod + Mul<Output = Self> + Send + Sync {}

impl<T> Element for T where T: Pod + Mul<Output = T> + Send + Sync {}




/**
 * Number of bytes held by a block buffer, and the number of those bytes
 * which carry data.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockBytes {
    pub allocated: usize,
    pub used: usize,
}

impl core::ops::Add for BlockBytes {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            allocated: self.allocated + other.allocated,
            used: self.used + other.used,
        }
    }
}




/**
 * Interface shared by owned block data and views of it. Elements are
 * addressed by their global index in the data's own index space.
 */
pub trait BlockData<T: Element, const DIM: usize> {

    /**
     * The index space covered by this data.
     */
    fn space(&self) -> IndexSpace<DIM>;

    /**
     * The elements in flat order. The slice has exactly `space().len()`
     * elements, even when the underlying buffer is padded.
     */
    fn as_slice(&self) -> &[T];

    /**
     * Number of bytes held by the underlying buffer.
     */
    fn bytes(&self) -> usize;

    fn footprint(&self) -> BlockBytes {
        BlockBytes {
            allocated: self.bytes(),
            used: self.space().len() * core::mem::size_of::<T>(),
        }
    }

    fn get(&self, index: MultiIndex<DIM>) -> &T {
        &self.as_slice()[self.space().global_flat_index(index)]
    }
}




/**
 * Owned, aligned storage for one N-dimensional array. The buffer is zero
 * initialised and freed when the data is dropped.
 */
#[derive(Clone, Debug)]
pub struct Data<T: Element, const DIM: usize> {
    space: IndexSpace<DIM>,
    block: AlignedBlock<T>,
}




// ============================================================================
impl<T: Element, const DIM: usize> Data<T, DIM> {

    pub fn new(space: IndexSpace<DIM>) -> Result<Self, Error> {
        Self::with_alignment(space, DEFAULT_ALIGNMENT)
    }

    pub fn with_alignment(space: IndexSpace<DIM>, alignment: usize) -> Result<Self, Error> {
        Ok(Self {
            space,
            block: AlignedBlock::zeroed(space.len(), alignment)?,
        })
    }

    /**
     * Generate data over the given index space, with values defined from a
     * closure of the global index.
     */
    pub fn from_function<F>(space: IndexSpace<DIM>, f: F) -> Result<Self, Error>
    where
        F: Fn(MultiIndex<DIM>) -> T
    {
        let mut data = Self::new(space)?;
        for (x, index) in data.as_mut_slice().iter_mut().zip(space.iter()) {
            *x = f(index)
        }
        Ok(data)
    }

    pub fn alignment(&self) -> usize {
        self.block.alignment()
    }

    pub fn as_ptr(&self) -> *const T {
        self.block.as_ptr()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let n = self.space.len();
        &mut self.block.as_mut_slice()[..n]
    }

    pub fn get_mut(&mut self, index: MultiIndex<DIM>) -> &mut T {
        let n = self.space.global_flat_index(index);
        &mut self.as_mut_slice()[n]
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.as_slice().iter()
    }

    /**
     * Copy the contents of another block into this one. Both buffers must
     * hold the same number of bytes.
     */
    pub fn copy_from<D: BlockData<T, DIM>>(&mut self, other: &D) -> Result<(), Error> {
        if self.bytes() != other.bytes() || self.space.len() != other.space().len() {
            return Err(Error::ByteCountMismatch {
                expected: self.bytes(),
                found: other.bytes(),
            });
        }
        self.as_mut_slice().copy_from_slice(other.as_slice());
        Ok(())
    }

    pub fn view(&self) -> DataView<'_, T, DIM> {
        DataView {
            space: self.space,
            bytes: self.bytes(),
            data: self.as_slice(),
        }
    }

    pub fn view_mut(&mut self) -> DataViewMut<'_, T, DIM> {
        let space = self.space;
        let bytes = self.bytes();
        DataViewMut {
            space,
            bytes,
            data: self.as_mut_slice(),
        }
    }
}

impl<T: Element, const DIM: usize> BlockData<T, DIM> for Data<T, DIM> {
    fn space(&self) -> IndexSpace<DIM> {
        self.space
    }

    fn as_slice(&self) -> &[T] {
        &self.block.as_slice()[..self.space.len()]
    }

    fn bytes(&self) -> usize {
        self.block.bytes()
    }
}

impl<T: Element, const DIM: usize> Index<MultiIndex<DIM>> for Data<T, DIM> {
    type Output = T;

    fn index(&self, index: MultiIndex<DIM>) -> &T {
        self.get(index)
    }
}

impl<T: Element, const DIM: usize> IndexMut<MultiIndex<DIM>> for Data<T, DIM> {
    fn index_mut(&mut self, index: MultiIndex<DIM>) -> &mut T {
        self.get_mut(index)
    }
}




/**
 * A read-only view of block data owned elsewhere. Views are cheap to copy
 * and never free memory; the borrow ties them to their owner.
 */
#[derive(Clone, Copy, Debug)]
pub struct DataView<'a, T: Element, const DIM: usize> {
    space: IndexSpace<DIM>,
    bytes: usize,
    data: &'a [T],
}

impl<'a, T: Element, const DIM: usize> DataView<'a, T, DIM> {

    /**
     * View externally managed memory as block data. Fails if the slice is
     * too short for the index space.
     */
    pub fn new(space: IndexSpace<DIM>, data: &'a [T]) -> Result<Self, Error> {
        let bytes = core::mem::size_of_val(data);
        if data.len() < space.len() {
            return Err(Error::ByteCountMismatch {
                expected: space.len() * core::mem::size_of::<T>(),
                found: bytes,
            });
        }
        Ok(Self { space, bytes, data: &data[..space.len()] })
    }
}

impl<'a, T: Element, const DIM: usize> BlockData<T, DIM> for DataView<'a, T, DIM> {
    fn space(&self) -> IndexSpace<DIM> {
        self.space
    }

    fn as_slice(&self) -> &[T] {
        self.data
    }

    fn bytes(&self) -> usize {
        self.bytes
    }
}

impl<'a, T: Element, const DIM: usize> Index<MultiIndex<DIM>> for DataView<'a, T, DIM> {
    type Output = T;

    fn index(&self, index: MultiIndex<DIM>) -> &T {
        self.get(index)
    }
}




/**
 * A mutable view of block data owned elsewhere.
 */
#[derive(Debug)]
pub struct DataViewMut<'a, T: Element, const DIM: usize> {
    space: IndexSpace<DIM>,
    bytes: usize,
    data: &'a mut [T],
}

impl<'a, T: Element, const DIM: usize> DataViewMut<'a, T, DIM> {

    pub fn new(space: IndexSpace<DIM>, data: &'a mut [T]) -> Result<Self, Error> {
        let bytes = core::mem::size_of_val(data);
        if data.len() < space.len() {
            return Err(Error::ByteCountMismatch {
                expected: space.len() * core::mem::size_of::<T>(),
                found: bytes,
            });
        }
        let n = space.len();
        Ok(Self { space, bytes, data: &mut data[..n] })
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data
    }

    pub fn get_mut(&mut self, index: MultiIndex<DIM>) -> &mut T {
        &mut self.data[self.space.global_flat_index(index)]
    }
}

impl<'a, T: Element, const DIM: usize> BlockData<T, DIM> for DataViewMut<'a, T, DIM> {
    fn space(&self) -> IndexSpace<DIM> {
        self.space
    }

    fn as_slice(&self) -> &[T] {
        self.data
    }

    fn bytes(&self) -> usize {
        self.bytes
    }
}

impl<'a, T: Element, const DIM: usize> Index<MultiIndex<DIM>> for DataViewMut<'a, T, DIM> {
    type Output = T;

    fn index(&self, index: MultiIndex<DIM>) -> &T {
        self.get(index)
    }
}

impl<'a, T: Element, const DIM: usize> IndexMut<MultiIndex<DIM>> for DataViewMut<'a, T, DIM> {
    fn index_mut(&mut self, index: MultiIndex<DIM>) -> &mut T {
        self.get_mut(index)
    }
}
