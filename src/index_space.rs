use crate::error::Error;
use crate::num_vec::Vector;




/**
 * A multi-dimensional index: a fixed-size tuple of signed integers.
 */
pub type MultiIndex<const DIM: usize> = Vector<i64, DIM>;




/**
 * Represents a rectangular region in a discrete index space. The start index
 * is inclusive and the end index is exclusive on every axis. The index type
 * is signed 64-bit integer.
 *
 * Flat offsets are computed with the first axis varying fastest:
 * `flat = i0 + n0 * (i1 + n1 * (i2 + ...))`.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IndexSpace<const DIM: usize> {
    start: MultiIndex<DIM>,
    end: MultiIndex<DIM>,
}




// ============================================================================
impl<const DIM: usize> IndexSpace<DIM> {


    /**
     * Create an index space from its inclusive start and exclusive end. Fails
     * if the start exceeds the end on any axis.
     */
    pub fn new(start: MultiIndex<DIM>, end: MultiIndex<DIM>) -> Result<Self, Error> {
        if !start.all_le(&end) {
            return Err(Error::InvalidIndexSpace {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }


    /**
     * Create an index space starting at zero with the given extent.
     */
    pub fn from_extent(extent: MultiIndex<DIM>) -> Result<Self, Error> {
        Self::new(MultiIndex::zero(), extent)
    }


    /**
     * Return the number of indexes on each axis.
     */
    pub fn dim(&self) -> MultiIndex<DIM> {
        self.end - self.start
    }


    /**
     * Return the number of indexes along a single axis.
     */
    pub fn dim_along(&self, axis: usize) -> usize {
        (self.end[axis] - self.start[axis]) as usize
    }


    /**
     * Return the number of elements in this index space.
     */
    pub fn len(&self) -> usize {
        self.dim().product() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }


    /**
     * Return the minimum index (inclusive).
     */
    pub fn start(&self) -> MultiIndex<DIM> {
        self.start
    }


    /**
     * Return the maximum index (exclusive).
     */
    pub fn end(&self) -> MultiIndex<DIM> {
        self.end
    }


    /**
     * Determine whether this index space contains the given (global) index.
     */
    pub fn contains(&self, index: MultiIndex<DIM>) -> bool {
        self.start.all_le(&index) && index.all_lt(&self.end)
    }


    /**
     * Determine whether the given index, measured relative to the start of
     * this space, lies within `[0, dim)`.
     */
    pub fn is_index(&self, local: MultiIndex<DIM>) -> bool {
        MultiIndex::zero().all_le(&local) && local.all_lt(&self.dim())
    }


    /**
     * Determine whether another index space is a subset of this one.
     */
    pub fn contains_space(&self, other: &Self) -> bool {
        self.start.all_le(&other.start) && other.end.all_le(&self.end)
    }


    /**
     * Return the overlap of two index spaces. If they are disjoint the result
     * is an empty space.
     */
    pub fn intersection(&self, other: &Self) -> Self {
        let start = self.start.component_max(&other.start);
        let end = self.end.component_min(&other.end).component_max(&start);
        Self { start, end }
    }


    /**
     * Determine whether two index spaces share at least one index.
     */
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }


    /**
     * Expand this index space by the given number of elements on each axis.
     */
    pub fn extend_all(&self, delta: i64) -> Result<Self, Error> {
        let delta = MultiIndex::splat(delta);
        Self::new(self.start - delta, self.end + delta)
    }


    /**
     * Trim this index space by the given number of elements on each axis.
     */
    pub fn trim_all(&self, delta: i64) -> Result<Self, Error> {
        self.extend_all(-delta)
    }


    /**
     * Return the linear offset of an index measured relative to the start of
     * this space.
     */
    pub fn flat_index(&self, local: MultiIndex<DIM>) -> usize {
        debug_assert!(self.is_index(local), "local index {} out of range {}", local, self.dim());
        let n = self.dim();
        (0..DIM).rev().fold(0, |acc, axis| acc * n[axis] + local[axis]) as usize
    }


    /**
     * Return the index, relative to the start of this space, at the given
     * linear offset. Inverse of `flat_index`.
     */
    pub fn multi_index(&self, flat: usize) -> MultiIndex<DIM> {
        debug_assert!(flat < self.len(), "flat index {} out of range {}", flat, self.len());
        let n = self.dim();
        let mut rest = flat as i64;
        let mut local = MultiIndex::zero();
        for axis in 0..DIM {
            local[axis] = rest % n[axis];
            rest /= n[axis];
        }
        local
    }


    /**
     * Return the linear offset for the given global index, in a memory
     * buffer aligned with the start of this index space.
     */
    pub fn global_flat_index(&self, index: MultiIndex<DIM>) -> usize {
        self.flat_index(index - self.start)
    }


    /**
     * Return the global index at the given linear offset.
     */
    pub fn global_multi_index(&self, flat: usize) -> MultiIndex<DIM> {
        self.multi_index(flat) + self.start
    }


    /**
     * Linear offset of a local index given as up to three scalar
     * components. Unused trailing components must be zero. Only supported
     * for dimensions 1, 2 and 3.
     */
    pub fn classic_flat_index(&self, ix: i64, iy: i64, iz: i64) -> Result<usize, Error> {
        let n = self.dim();
        let flat = match DIM {
            1 => ix,
            2 => ix + n[0] * iy,
            3 => ix + n[0] * (iy + n[1] * iz),
            _ => return Err(Error::UnsupportedAccess(DIM)),
        };
        Ok(flat as usize)
    }


    /**
     * Return a memory region object corresponding to the selection of this
     * index space in the buffer allocated for another one.
     */
    pub fn memory_region_in(&self, parent: &Self) -> MemoryRegion<DIM> {
        debug_assert!(parent.contains_space(self), "region {:?} not inside {:?}", self, parent);
        let offset = self.start - parent.start;
        let count = self.dim();
        let shape = parent.dim();
        MemoryRegion {
            start: offset.map(|x| x as usize).into_array(),
            count: count.map(|x| x as usize).into_array(),
            shape: shape.map(|x| x as usize).into_array(),
        }
    }


    /**
     * Return an iterator which traverses the index space with the first axis
     * increasing fastest. The iterator yields global indexes.
     */
    pub fn iter(&self) -> IndexIter<DIM> {
        IndexIter {
            start: self.start,
            end: self.end,
            current: self.start,
            remaining: self.len(),
        }
    }
}




// ============================================================================
impl<const DIM: usize> IntoIterator for IndexSpace<DIM> {
    type Item = MultiIndex<DIM>;
    type IntoIter = IndexIter<DIM>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<const DIM: usize> IntoIterator for &IndexSpace<DIM> {
    type Item = MultiIndex<DIM>;
    type IntoIter = IndexIter<DIM>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}




/**
 * Lazy traversal of an index space, first axis fastest.
 */
#[derive(Clone, Debug)]
pub struct IndexIter<const DIM: usize> {
    start: MultiIndex<DIM>,
    end: MultiIndex<DIM>,
    current: MultiIndex<DIM>,
    remaining: usize,
}

impl<const DIM: usize> Iterator for IndexIter<DIM> {
    type Item = MultiIndex<DIM>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.current;
        self.remaining -= 1;

        if self.remaining > 0 {
            for axis in 0..DIM {
                self.current[axis] += 1;
                if self.current[axis] < self.end[axis] {
                    break;
                }
                self.current[axis] = self.start[axis];
            }
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<const DIM: usize> ExactSizeIterator for IndexIter<DIM> {}




/**
 * An N-dimensional memory region within a contiguous buffer, traversed as
 * contiguous rows along the first (fastest) axis.
 */
#[derive(Clone, Debug)]
pub struct MemoryRegion<const DIM: usize> {
    start: [usize; DIM],
    count: [usize; DIM],
    shape: [usize; DIM],
}




// ============================================================================
impl<const DIM: usize> MemoryRegion<DIM> {

    /**
     * Number of contiguous elements in each row.
     */
    pub fn row_len(&self) -> usize {
        if self.count.iter().any(|&c| c == 0) {
            0
        } else {
            self.count[0]
        }
    }

    /**
     * Iterate over the buffer offsets of the first element of every row.
     */
    pub fn row_offsets(&self) -> impl Iterator<Item = usize> + '_ {
        let mut rows = MultiIndex::<DIM>::zero();
        for axis in 1..DIM {
            rows[axis] = self.count[axis] as i64;
        }
        if DIM > 0 {
            rows[0] = if self.row_len() == 0 { 0 } else { 1 };
        }
        let strides: [usize; DIM] = core::array::from_fn(|axis| {
            self.shape[..axis].iter().product()
        });

        IndexSpace { start: MultiIndex::zero(), end: rows }
            .iter()
            .map(move |row| {
                (0..DIM)
                    .map(|axis| (self.start[axis] + row[axis] as usize) * strides[axis])
                    .sum()
            })
    }

    pub fn iter_slice<'a, T>(&'a self, slice: &'a [T]) -> impl Iterator<Item = &'a [T]> {
        let n = self.row_len();
        self.row_offsets().map(move |offset| &slice[offset..offset + n])
    }
}




/**
 * Copy the elements selected by `src_region` in `src` into the elements
 * selected by `dst_region` in `dst`. The regions must have equal counts.
 */
pub fn copy_region<T: Copy, const DIM: usize>(
    src: &[T],
    src_region: &MemoryRegion<DIM>,
    dst: &mut [T],
    dst_region: &MemoryRegion<DIM>)
{
    debug_assert_eq!(src_region.count, dst_region.count);
    let n = src_region.row_len();

    for (s, d) in src_region.row_offsets().zip(dst_region.row_offsets()) {
        dst[d..d + n].copy_from_slice(&src[s..s + n]);
    }
}
