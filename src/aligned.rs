//! Aligned, zero-initialised block memory.
//!
//! This is the only module in the crate that touches raw allocation. Every
//! other module accesses block memory through the slices handed out here.

use bytemuck::Pod;
use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::mem::{align_of, size_of};
use std::ptr::NonNull;
use crate::error::Error;

/// Byte boundary block memory is aligned at, unless configured otherwise.
pub const DEFAULT_ALIGNMENT: usize = 32;

/// Round `n` up to the next multiple of `m`.
pub(crate) fn round_up(n: usize, m: usize) -> usize {
    ((n + m - 1) / m) * m
}

/// A contiguous, zero-initialised buffer of `T` whose first element lies on
/// an alignment boundary. The byte count is rounded up to a multiple of the
/// alignment. The buffer is freed when the block is dropped.
///
pub struct AlignedBlock<T: Pod> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
}

// SAFETY: the block uniquely owns its allocation, like a `Box<[T]>`.
unsafe impl<T: Pod + Send> Send for AlignedBlock<T> {}
unsafe impl<T: Pod + Sync> Sync for AlignedBlock<T> {}

impl<T: Pod> AlignedBlock<T> {
    /// Allocate room for at least `count` elements at the given byte
    /// alignment. Fails if the alignment is not a power of two, or the byte
    /// count overflows.
    ///
    pub fn zeroed(count: usize, alignment: usize) -> Result<Self, Error> {
        if !alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(alignment));
        }
        let align = alignment.max(align_of::<T>());
        let bytes = count
            .checked_mul(size_of::<T>())
            .and_then(|b| b.checked_add(align - 1))
            .map(|b| (b / align) * align)
            .ok_or(Error::AllocationOverflow(count))?;
        let layout =
            Layout::from_size_align(bytes, align).map_err(|_| Error::AllocationOverflow(count))?;

        let ptr = if bytes == 0 {
            // an aligned, never dereferenced address for empty blocks
            NonNull::new(align as *mut T).ok_or(Error::InvalidAlignment(alignment))?
        } else {
            // SAFETY: the layout has non-zero size, and all-zero bytes are a
            // valid `T` because `T: Pod`.
            let raw = unsafe { alloc_zeroed(layout) as *mut T };
            match NonNull::new(raw) {
                Some(ptr) => ptr,
                None => handle_alloc_error(layout),
            }
        };
        debug_assert_eq!(ptr.as_ptr() as usize % align, 0, "alignment guarantee violated");

        let len = if size_of::<T>() == 0 { count } else { bytes / size_of::<T>() };
        Ok(Self { ptr, len, layout })
    }

    /// Number of bytes held by the block (a multiple of the alignment).
    ///
    pub fn bytes(&self) -> usize {
        self.layout.size()
    }

    /// Byte alignment of the first element.
    ///
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    /// Number of elements that fit in the block.
    ///
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` is valid for `len` initialised elements (or dangling
        // and aligned with `len * size_of::<T>() == 0`).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Pod> Drop for AlignedBlock<T> {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: the pointer was obtained from `alloc_zeroed` with this
            // exact layout.
            unsafe { dealloc(self.ptr.as_ptr() as *mut u8, self.layout) }
        }
    }
}

impl<T: Pod> Clone for AlignedBlock<T> {
    fn clone(&self) -> Self {
        let mut block = match Self::zeroed(self.len, self.layout.align()) {
            Ok(block) => block,
            Err(_) => handle_alloc_error(self.layout),
        };
        block.as_mut_slice().copy_from_slice(self.as_slice());
        block
    }
}

impl<T: Pod> std::fmt::Debug for AlignedBlock<T> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("AlignedBlock")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("bytes", &self.bytes())
            .field("alignment", &self.alignment())
            .finish()
    }
}
