use core::alloc::Layout;
use core::fmt;
use core::mem::{align_of, size_of};
use core::ptr::{self, NonNull};
use core::slice;

use const_default::ConstDefault;

use super::utils::{array_layout, wipe};
use crate::alloc::{Allocator, AllocatorDefault};
use crate::error::StorageError;
use crate::plain::Plain;

/// The capacity and occupied length of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BufferHeader {
    pub capacity: usize,
    pub length: usize,
}

impl BufferHeader {
    pub const EMPTY: Self = Self {
        capacity: 0,
        length: 0,
    };
}

/// An allocation handle which overwrites every element slot with zeroes
/// before the memory is handed back to its allocator.
///
/// New allocations are always requested zero-filled, so the spare capacity
/// `[length, capacity)` starts out zeroed. Callers maintain that property
/// by wiping every slot they vacate.
pub(crate) struct WipingBuffer<T: Plain, A: Allocator> {
    header: BufferHeader,
    data: NonNull<T>,
    alloc: A,
}

impl<T: Plain, A: Allocator> WipingBuffer<T, A> {
    const IS_ZST: bool = size_of::<T>() == 0;

    #[inline]
    pub const fn dangling(alloc: A) -> Self {
        Self {
            header: BufferHeader::EMPTY,
            data: NonNull::dangling(),
            alloc,
        }
    }

    pub fn allocate_in(capacity: usize, alloc: A) -> Result<Self, StorageError> {
        let mut buf = Self::dangling(alloc);
        if capacity > 0 && !Self::IS_ZST {
            buf.data = buf.allocate_data(capacity)?;
            buf.header.capacity = capacity;
        }
        Ok(buf)
    }

    /// Reconstruct a buffer from the parts of a detached buffer.
    ///
    /// # Safety
    /// `data` and `header` must have been produced by `detach` on a buffer
    /// whose allocator may be released through `alloc`.
    #[inline]
    pub unsafe fn from_parts(header: BufferHeader, data: NonNull<T>, alloc: A) -> Self {
        Self {
            header,
            data,
            alloc,
        }
    }

    fn allocate_data(&self, capacity: usize) -> Result<NonNull<T>, StorageError> {
        let layout = array_layout::<T>(capacity)?;
        match self.alloc.allocate_zeroed(layout) {
            Ok(ptr) => Ok(ptr.cast()),
            Err(_) => Err(StorageError::AllocError(layout)),
        }
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        if Self::IS_ZST {
            usize::MAX
        } else {
            self.header.capacity
        }
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.header.length
    }

    /// # Safety
    /// Every element in `[0, len)` must be initialized, and any slot beyond
    /// `len` must already be wiped.
    #[inline]
    pub unsafe fn set_length(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.header.length = len;
    }

    #[inline]
    pub fn data_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    #[inline]
    pub fn data_ptr_mut(&mut self) -> *mut T {
        self.data.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.data.as_ptr(), self.header.length) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.data.as_ptr(), self.header.length) }
    }

    #[inline]
    fn has_allocation(&self) -> bool {
        !Self::IS_ZST && self.header.capacity > 0
    }

    /// Overwrite the element slots in `start..end` with zeroes.
    ///
    /// # Safety
    /// The range must lie within the capacity of the buffer.
    #[inline]
    pub unsafe fn wipe_range(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end && (Self::IS_ZST || end <= self.header.capacity));
        if start < end {
            wipe(self.data.as_ptr().add(start), end - start);
        }
    }

    /// Move the occupied elements into a fresh zeroed allocation of
    /// `capacity` elements. The previous allocation is wiped in full and
    /// released. On failure the buffer is left untouched.
    pub fn relocate(&mut self, capacity: usize) -> Result<(), StorageError> {
        let length = self.header.length;
        debug_assert!(capacity >= length);
        if Self::IS_ZST || capacity == self.header.capacity {
            return Ok(());
        }
        let data = if capacity == 0 {
            NonNull::dangling()
        } else {
            let data = self.allocate_data(capacity)?;
            unsafe { ptr::copy_nonoverlapping(self.data.as_ptr(), data.as_ptr(), length) };
            data
        };
        log::trace!(
            "relocating secure buffer: {} -> {} elements ({} occupied)",
            self.header.capacity,
            capacity,
            length
        );
        let prev_data = core::mem::replace(&mut self.data, data);
        let prev_cap = core::mem::replace(&mut self.header.capacity, capacity);
        unsafe { self.release_data(prev_data, prev_cap) };
        Ok(())
    }

    unsafe fn release_data(&self, data: NonNull<T>, capacity: usize) {
        if Self::IS_ZST || capacity == 0 {
            return;
        }
        wipe(data.as_ptr(), capacity);
        // the layout was validated when the block was allocated
        let layout = Layout::from_size_align_unchecked(size_of::<T>() * capacity, align_of::<T>());
        self.alloc.deallocate(data.cast(), layout);
    }

    /// Wipe the whole allocation and return it to the allocator, leaving
    /// this buffer empty with no capacity.
    pub fn release(&mut self) {
        let data = core::mem::replace(&mut self.data, NonNull::dangling());
        let header = core::mem::replace(&mut self.header, BufferHeader::EMPTY);
        if header.capacity > 0 && !Self::IS_ZST {
            log::trace!(
                "releasing secure buffer of {} elements ({} occupied)",
                header.capacity,
                header.length
            );
        }
        unsafe { self.release_data(data, header.capacity) };
    }

    /// Disown the allocation, leaving this buffer empty with no capacity.
    #[inline]
    pub fn detach(&mut self) -> (BufferHeader, NonNull<T>) {
        (
            core::mem::replace(&mut self.header, BufferHeader::EMPTY),
            core::mem::replace(&mut self.data, NonNull::dangling()),
        )
    }

    /// Adopt an allocation detached from another buffer.
    ///
    /// # Safety
    /// The allocation must be releasable through this buffer's allocator,
    /// and this buffer must not currently hold an allocation.
    #[inline]
    pub unsafe fn attach(&mut self, header: BufferHeader, data: NonNull<T>) {
        debug_assert!(!self.has_allocation());
        self.header = header;
        self.data = data;
    }

    /// Check that every byte of the spare capacity is zero.
    pub fn spare_is_zeroed(&self) -> bool {
        if !self.has_allocation() {
            return true;
        }
        let spare = (self.header.capacity - self.header.length) * size_of::<T>();
        // spare slots only ever hold bytes written by a zeroed allocation or a wipe,
        // while occupied slots may contain padding
        let bytes = unsafe {
            slice::from_raw_parts(
                self.data.as_ptr().add(self.header.length).cast::<u8>(),
                spare,
            )
        };
        bytes.iter().all(|b| *b == 0)
    }
}

impl<T: Plain, A: Allocator + Clone> WipingBuffer<T, A> {
    /// Allocate a new buffer from a clone of this buffer's allocator.
    #[inline]
    pub fn spawn(&self, capacity: usize) -> Result<Self, StorageError> {
        Self::allocate_in(capacity, self.alloc.clone())
    }
}

impl<T: Plain, A: AllocatorDefault> ConstDefault for WipingBuffer<T, A> {
    const DEFAULT: Self = Self::dangling(A::DEFAULT);
}

impl<T: Plain, A: Allocator + fmt::Debug> fmt::Debug for WipingBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WipingBuffer")
            .field("header", &self.header)
            .field("alloc", &self.alloc)
            .finish_non_exhaustive()
    }
}

unsafe impl<T: Plain + Send, A: Allocator + Send> Send for WipingBuffer<T, A> {}

unsafe impl<T: Plain + Sync, A: Allocator + Sync> Sync for WipingBuffer<T, A> {}

impl<T: Plain, A: Allocator> Drop for WipingBuffer<T, A> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use crate::alloc::Global;

    #[test]
    fn allocate_zeroed() {
        let buf = WipingBuffer::<u32, Global>::allocate_in(10, Global).expect("alloc failed");
        assert_eq!(buf.capacity(), 10);
        assert_eq!(buf.length(), 0);
        assert!(buf.spare_is_zeroed());
    }

    #[test]
    fn relocate_keeps_contents() {
        let mut buf = WipingBuffer::<u32, Global>::allocate_in(2, Global).expect("alloc failed");
        unsafe {
            buf.data_ptr_mut().write(5);
            buf.data_ptr_mut().add(1).write(6);
            buf.set_length(2);
        }
        buf.relocate(8).expect("relocate failed");
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.as_slice(), &[5, 6]);
        assert!(buf.spare_is_zeroed());
        buf.relocate(2).expect("relocate failed");
        assert_eq!(buf.capacity(), 2);
        assert_eq!(buf.as_slice(), &[5, 6]);
    }

    #[test]
    fn wipe_marks_spare() {
        let mut buf = WipingBuffer::<u8, Global>::allocate_in(4, Global).expect("alloc failed");
        unsafe {
            buf.data_ptr_mut().write_bytes(0xaa, 4);
            buf.set_length(4);
            buf.set_length(1);
        }
        assert!(!buf.spare_is_zeroed());
        unsafe { buf.wipe_range(1, 4) };
        assert!(buf.spare_is_zeroed());
        assert_eq!(buf.as_slice(), &[0xaa]);
    }

    #[test]
    fn zero_sized() {
        let mut buf = WipingBuffer::<(), Global>::allocate_in(10, Global).expect("alloc failed");
        assert_eq!(buf.capacity(), usize::MAX);
        buf.relocate(100).expect("relocate failed");
        unsafe { buf.set_length(1000) };
        assert_eq!(buf.as_slice().len(), 1000);
        assert!(buf.spare_is_zeroed());
    }

    #[test]
    fn detach_attach() {
        let mut a = WipingBuffer::<u16, Global>::allocate_in(3, Global).expect("alloc failed");
        let mut b = WipingBuffer::<u16, Global>::dangling(Global);
        let (header, data) = a.detach();
        assert_eq!(a.capacity(), 0);
        unsafe { b.attach(header, data) };
        assert_eq!(b.capacity(), 3);
    }
}
