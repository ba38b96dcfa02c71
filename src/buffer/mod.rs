//! A growable array which wipes vacated memory.
//!
//! [`SecureBuffer`] keeps the usual `Vec` contract (a contiguous run of
//! occupied elements followed by spare capacity) with an added invariant:
//! every byte of the spare capacity is zero whenever control returns to the
//! caller. Slots are wiped as soon as they are vacated by `pop`, `remove`,
//! `truncate` and friends, a reallocation wipes the whole previous block
//! before releasing it, and dropping the buffer wipes the full capacity.
//!
//! Fallible operations come in two forms: a `try_` method returning a
//! [`StorageError`], and a panicking method of the same name without the
//! prefix. A failed operation leaves the buffer unchanged.

use core::borrow::{Borrow, BorrowMut};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use core::ops::{Bound, Deref, DerefMut, RangeBounds};
use core::ptr;
use core::slice;

use const_default::ConstDefault;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::alloc::{AllocatorDefault, AllocatorKind, Global, SecureAllocator};
use crate::capacity::{Grow, GrowDoubling, GrowExact};
use crate::error::{StorageError, UpdateError};
use crate::plain::Plain;
use crate::storage::utils::max_capacity;
use crate::storage::WipingBuffer;

use self::insert::Inserter;

pub use self::into_iter::IntoIter;

mod insert;
mod into_iter;
mod macros;

/// Create a [`SecureBuffer`] containing `count` copies of `elem`.
pub fn from_elem<T: Plain>(elem: T, count: usize) -> SecureBuffer<T, Global> {
    from_elem_in(elem, count, Global)
}

/// Create a [`SecureBuffer`] in `alloc` containing `count` copies of `elem`.
pub fn from_elem_in<T: Plain, A: SecureAllocator>(
    elem: T,
    count: usize,
    alloc: A,
) -> SecureBuffer<T, A> {
    match SecureBuffer::try_from_elem_in(elem, count, alloc) {
        Ok(buf) => buf,
        Err(err) => err.panic(),
    }
}

/// Resolve a range argument against a sequence of `len` elements.
pub(crate) fn resolve_range<R: RangeBounds<usize>>(
    range: R,
    len: usize,
) -> Result<(usize, usize), StorageError> {
    let start = match range.start_bound() {
        Bound::Included(&start) => start,
        Bound::Excluded(&start) => start.checked_add(1).ok_or(StorageError::OutOfRange)?,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&end) => end.checked_add(1).ok_or(StorageError::OutOfRange)?,
        Bound::Excluded(&end) => end,
        Bound::Unbounded => len,
    };
    if start > end || end > len {
        Err(StorageError::OutOfRange)
    } else {
        Ok((start, end))
    }
}

#[cold]
fn capacity_exceeded<T>(len: usize, additional: usize) -> StorageError {
    log::debug!(
        "refused to grow secure buffer of {} elements by {} (limit {})",
        len,
        additional,
        max_capacity::<T>()
    );
    StorageError::CapacityLimit
}

/// A contiguous growable array of plain data which overwrites its memory
/// with zeroes whenever an element slot is vacated or the storage is
/// released.
pub struct SecureBuffer<T: Plain, A: SecureAllocator = Global> {
    buffer: WipingBuffer<T, A>,
}

impl<T: Plain, A: AllocatorDefault + SecureAllocator> SecureBuffer<T, A> {
    /// Constructs a new, empty `SecureBuffer`. No memory is allocated until
    /// elements are added.
    pub const fn new() -> Self {
        Self {
            buffer: <WipingBuffer<T, A> as ConstDefault>::DEFAULT,
        }
    }

    /// Constructs a new, empty `SecureBuffer` with at least the specified capacity.
    ///
    /// # Panics
    /// Panics if the allocation fails or `capacity` exceeds [`max_len`](Self::max_len).
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(buf) => buf,
            Err(err) => err.panic(),
        }
    }

    /// Try to construct a new, empty `SecureBuffer` with at least the specified capacity.
    #[inline]
    pub fn try_with_capacity(capacity: usize) -> Result<Self, StorageError> {
        Self::try_with_capacity_in(capacity, A::DEFAULT)
    }

    /// Constructs a `SecureBuffer` of `len` elements, each consisting of zero bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::zeroed_in(len, A::DEFAULT)
    }

    /// Constructs a new `SecureBuffer` containing a copy of `data`.
    pub fn from_slice(data: &[T]) -> Self {
        Self::from_slice_in(data, A::DEFAULT)
    }

    /// Try to construct a new `SecureBuffer` containing a copy of `data`.
    #[inline]
    pub fn try_from_slice(data: &[T]) -> Result<Self, StorageError> {
        Self::try_from_slice_in(data, A::DEFAULT)
    }
}

impl<T: Plain, A: SecureAllocator> SecureBuffer<T, A> {
    /// Constructs a new, empty `SecureBuffer` which allocates from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            buffer: WipingBuffer::dangling(alloc),
        }
    }

    /// Constructs a new, empty `SecureBuffer` in `alloc` with at least the
    /// specified capacity.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        match Self::try_with_capacity_in(capacity, alloc) {
            Ok(buf) => buf,
            Err(err) => err.panic(),
        }
    }

    /// Try to construct a new, empty `SecureBuffer` in `alloc` with at least
    /// the specified capacity.
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, StorageError> {
        Ok(Self {
            buffer: WipingBuffer::allocate_in(capacity, alloc)?,
        })
    }

    /// Constructs a `SecureBuffer` in `alloc` of `len` zeroed elements.
    pub fn zeroed_in(len: usize, alloc: A) -> Self {
        match Self::try_zeroed_in(len, alloc) {
            Ok(buf) => buf,
            Err(err) => err.panic(),
        }
    }

    /// Try to construct a `SecureBuffer` in `alloc` of `len` zeroed elements.
    pub fn try_zeroed_in(len: usize, alloc: A) -> Result<Self, StorageError> {
        let mut buf = Self::try_with_capacity_in(len, alloc)?;
        // new allocations are zero-filled, and zero bytes are a valid `T`
        unsafe { buf.buffer.set_length(len) };
        Ok(buf)
    }

    /// Try to construct a `SecureBuffer` in `alloc` containing `count` copies of `elem`.
    pub fn try_from_elem_in(elem: T, count: usize, alloc: A) -> Result<Self, StorageError> {
        let mut buf = Self::try_with_capacity_in(count, alloc)?;
        unsafe { buf.fill_unchecked(0, count, elem) };
        Ok(buf)
    }

    /// Constructs a new `SecureBuffer` in `alloc` containing a copy of `data`.
    pub fn from_slice_in(data: &[T], alloc: A) -> Self {
        match Self::try_from_slice_in(data, alloc) {
            Ok(buf) => buf,
            Err(err) => err.panic(),
        }
    }

    /// Try to construct a new `SecureBuffer` in `alloc` containing a copy of `data`.
    pub fn try_from_slice_in(data: &[T], alloc: A) -> Result<Self, StorageError> {
        let mut buf = Self::try_with_capacity_in(data.len(), alloc)?;
        unsafe { buf.copy_unchecked(0, data) };
        Ok(buf)
    }

    /// Copy the contents into a new `SecureBuffer` allocated from `alloc`.
    pub fn clone_in(&self, alloc: A) -> Self {
        match self.try_clone_in(alloc) {
            Ok(buf) => buf,
            Err(err) => err.panic(),
        }
    }

    /// Try to copy the contents into a new `SecureBuffer` allocated from `alloc`.
    #[inline]
    pub fn try_clone_in(&self, alloc: A) -> Result<Self, StorageError> {
        Self::try_from_slice_in(self.as_slice(), alloc)
    }

    /// Access a reference to the allocator instance.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.buffer.allocator()
    }

    /// Get the number of elements the buffer can hold without reallocating.
    /// Zero-sized types report `usize::MAX`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Get the number of occupied elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.length()
    }

    /// Check whether the buffer has no occupied elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.length() == 0
    }

    /// The largest number of elements a buffer of this element type may hold.
    #[inline]
    pub const fn max_len(&self) -> usize {
        max_capacity::<T>()
    }

    /// Access the occupied elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.buffer.as_slice()
    }

    /// Access the occupied elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.buffer.as_mut_slice()
    }

    /// Get a pointer to the first element. The pointer is dangling when
    /// nothing has been allocated.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buffer.data_ptr()
    }

    /// Get a mutable pointer to the first element.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buffer.data_ptr_mut()
    }

    /// Get a reference to the element at `index`, or `StorageError::OutOfRange`.
    #[inline]
    pub fn try_get(&self, index: usize) -> Result<&T, StorageError> {
        self.as_slice().get(index).ok_or(StorageError::OutOfRange)
    }

    /// Get a mutable reference to the element at `index`, or `StorageError::OutOfRange`.
    #[inline]
    pub fn try_get_mut(&mut self, index: usize) -> Result<&mut T, StorageError> {
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(StorageError::OutOfRange)
    }

    /// Get a reference to the element at `index` without a bounds check.
    ///
    /// # Safety
    /// `index` must be less than `len()`. Debug builds assert this.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.len(), "index out of bounds");
        &*self.buffer.data_ptr().add(index)
    }

    /// Get a mutable reference to the element at `index` without a bounds check.
    ///
    /// # Safety
    /// `index` must be less than `len()`. Debug builds assert this.
    #[inline]
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.len(), "index out of bounds");
        &mut *self.buffer.data_ptr_mut().add(index)
    }

    /// Check the structural invariants: the occupied length is within the
    /// capacity and every spare byte is zero.
    pub fn invariants(&self) -> bool {
        self.buffer.length() <= self.buffer.capacity() && self.buffer.spare_is_zeroed()
    }

    fn _try_reserve<G: Grow>(&mut self, additional: usize) -> Result<(), StorageError> {
        let len = self.buffer.length();
        let capacity = self.buffer.capacity();
        let Some(required) = len.checked_add(additional) else {
            return Err(capacity_exceeded::<T>(len, additional));
        };
        if required <= capacity {
            return Ok(());
        }
        let max_cap = max_capacity::<T>();
        if required > max_cap {
            return Err(capacity_exceeded::<T>(len, additional));
        }
        let target = G::next_capacity::<T>(capacity, required).min(max_cap);
        self.buffer.relocate(target)
    }

    /// Reserve capacity for at least `additional` more elements, growing the
    /// capacity to at least double its previous value when a reallocation is
    /// needed. The capacity never decreases.
    ///
    /// # Panics
    /// Panics if the allocation fails or the new length exceeds [`max_len`](Self::max_len).
    pub fn reserve(&mut self, additional: usize) {
        match self.try_reserve(additional) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to reserve capacity for at least `additional` more elements.
    #[inline]
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), StorageError> {
        self._try_reserve::<GrowDoubling>(additional)
    }

    /// Reserve capacity for exactly `additional` more elements.
    ///
    /// # Panics
    /// Panics if the allocation fails or the new length exceeds [`max_len`](Self::max_len).
    pub fn reserve_exact(&mut self, additional: usize) {
        match self.try_reserve_exact(additional) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to reserve capacity for exactly `additional` more elements.
    #[inline]
    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<(), StorageError> {
        self._try_reserve::<GrowExact>(additional)
    }

    /// Reduce the capacity to the occupied length, releasing the storage
    /// entirely when the buffer is empty.
    pub fn shrink_to_fit(&mut self) {
        self.shrink_to(0)
    }

    /// Try to reduce the capacity to the occupied length.
    #[inline]
    pub fn try_shrink_to_fit(&mut self) -> Result<(), StorageError> {
        self.try_shrink_to(0)
    }

    /// Reduce the capacity to the larger of `min_capacity` and the occupied length.
    pub fn shrink_to(&mut self, min_capacity: usize) {
        match self.try_shrink_to(min_capacity) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to reduce the capacity to the larger of `min_capacity` and the
    /// occupied length. The new block is allocated before the old one is
    /// wiped and released.
    pub fn try_shrink_to(&mut self, min_capacity: usize) -> Result<(), StorageError> {
        let target = self.len().max(min_capacity);
        if target < self.buffer.capacity() {
            self.buffer.relocate(target)
        } else {
            Ok(())
        }
    }

    /// # Safety
    /// The buffer must have capacity for `count` elements beyond `index`,
    /// and `index` must equal the occupied length.
    #[inline]
    unsafe fn fill_unchecked(&mut self, index: usize, count: usize, elem: T) {
        let head = self.buffer.data_ptr_mut().add(index);
        for offset in 0..count {
            head.add(offset).write(elem);
        }
        self.buffer.set_length(index + count);
    }

    /// # Safety
    /// The buffer must have capacity for `data.len()` elements beyond `index`,
    /// and `index` must equal the occupied length.
    #[inline]
    unsafe fn copy_unchecked(&mut self, index: usize, data: &[T]) {
        ptr::copy_nonoverlapping(
            data.as_ptr(),
            self.buffer.data_ptr_mut().add(index),
            data.len(),
        );
        self.buffer.set_length(index + data.len());
    }

    /// Move the elements in `index..len` up by `count` slots, into the spare
    /// capacity, and return a pointer to the opened gap.
    ///
    /// # Safety
    /// Capacity must be reserved for `count` additional elements and
    /// `index` must not exceed the occupied length. The gap must be filled
    /// before the length is updated.
    #[inline]
    unsafe fn open_gap(&mut self, index: usize, count: usize) -> *mut T {
        let len = self.buffer.length();
        let head = self.buffer.data_ptr_mut().add(index);
        if index < len && count > 0 {
            ptr::copy(head, head.add(count), len - index);
        }
        head
    }

    /// Append an element to the end of the buffer.
    ///
    /// # Panics
    /// Panics if the allocation fails or the buffer is at its maximum length.
    pub fn push(&mut self, value: T) {
        match self.try_push(value) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to append an element to the end of the buffer. When storage
    /// cannot be obtained the value is returned within the error.
    pub fn try_push(&mut self, value: T) -> Result<(), UpdateError<T>> {
        if let Err(err) = self.try_reserve(1) {
            return Err(UpdateError::new(err, value));
        }
        let len = self.buffer.length();
        unsafe {
            self.buffer.data_ptr_mut().add(len).write(value);
            self.buffer.set_length(len + 1);
        }
        Ok(())
    }

    /// Remove and return the last element, wiping its slot.
    pub fn pop(&mut self) -> Option<T> {
        let len = self.buffer.length();
        if len == 0 {
            return None;
        }
        unsafe {
            let value = self.buffer.data_ptr().add(len - 1).read();
            self.buffer.wipe_range(len - 1, len);
            self.buffer.set_length(len - 1);
            Some(value)
        }
    }

    /// Insert an element at position `index`, shifting later elements up.
    ///
    /// # Panics
    /// Panics if `index > len()` or the allocation fails.
    pub fn insert(&mut self, index: usize, value: T) {
        match self.try_insert(index, value) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to insert an element at position `index`, shifting later elements up.
    pub fn try_insert(&mut self, index: usize, value: T) -> Result<(), UpdateError<T>> {
        let len = self.buffer.length();
        if index > len {
            return Err(UpdateError::new(StorageError::OutOfRange, value));
        }
        if let Err(err) = self.try_reserve(1) {
            return Err(UpdateError::new(err, value));
        }
        unsafe {
            self.open_gap(index, 1).write(value);
            self.buffer.set_length(len + 1);
        }
        Ok(())
    }

    /// Insert a copy of `values` at position `index`.
    ///
    /// # Panics
    /// Panics if `index > len()` or the allocation fails.
    pub fn insert_slice(&mut self, index: usize, values: &[T]) {
        match self.try_insert_slice(index, values) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to insert a copy of `values` at position `index`.
    pub fn try_insert_slice(&mut self, index: usize, values: &[T]) -> Result<(), StorageError> {
        let len = self.buffer.length();
        if index > len {
            return Err(StorageError::OutOfRange);
        }
        self.try_reserve(values.len())?;
        unsafe {
            let gap = self.open_gap(index, values.len());
            ptr::copy_nonoverlapping(values.as_ptr(), gap, values.len());
            self.buffer.set_length(len + values.len());
        }
        Ok(())
    }

    /// Insert `count` copies of `elem` at position `index`.
    ///
    /// # Panics
    /// Panics if `index > len()` or the allocation fails.
    pub fn insert_elem(&mut self, index: usize, count: usize, elem: T) {
        match self.try_insert_elem(index, count, elem) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to insert `count` copies of `elem` at position `index`.
    pub fn try_insert_elem(
        &mut self,
        index: usize,
        count: usize,
        elem: T,
    ) -> Result<(), StorageError> {
        let len = self.buffer.length();
        if index > len {
            return Err(StorageError::OutOfRange);
        }
        self.try_reserve(count)?;
        unsafe {
            let gap = self.open_gap(index, count);
            for offset in 0..count {
                gap.add(offset).write(elem);
            }
            self.buffer.set_length(len + count);
        }
        Ok(())
    }

    /// Insert the items produced by `iter` at position `index`.
    ///
    /// # Panics
    /// Panics if `index > len()` or the allocation fails.
    pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, index: usize, iter: I) {
        match self.try_insert_iter(index, iter) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to insert the items produced by `iter` at position `index`.
    ///
    /// The items are appended and then rotated into place. If storage runs
    /// out part way, the appended items are wiped and the previous storage
    /// is kept, so neither the contents nor the capacity change.
    pub fn try_insert_iter<I: IntoIterator<Item = T>>(
        &mut self,
        index: usize,
        iter: I,
    ) -> Result<(), StorageError> {
        let len = self.buffer.length();
        if index > len {
            return Err(StorageError::OutOfRange);
        }
        self._try_extend(iter.into_iter())?;
        self.as_mut_slice()[index..].rotate_left(len - index);
        Ok(())
    }

    fn _try_extend<I: Iterator<Item = T>>(&mut self, mut iter: I) -> Result<(), StorageError> {
        let start_len = self.buffer.length();
        let Some(item) = self.fill_spare(&mut iter) else {
            return Ok(());
        };
        match self.try_extend_staged(item, iter) {
            Ok(mut staged) => {
                // the previous block is wiped and released with `staged`
                self.swap_with(&mut staged);
                Ok(())
            }
            Err(err) => {
                self.truncate(start_len);
                Err(err)
            }
        }
    }

    /// Move items from `iter` into the spare capacity, returning the first
    /// item which did not fit.
    fn fill_spare<I: Iterator<Item = T>>(&mut self, iter: &mut I) -> Option<T> {
        let mut inserter = Inserter::for_buffer(&mut self.buffer);
        let mut overflow = None;
        for item in iter.by_ref() {
            if inserter.full() {
                overflow = Some(item);
                break;
            }
            inserter.push(item);
        }
        let len = inserter.complete();
        unsafe { self.buffer.set_length(len) };
        overflow
    }

    /// Continue an extension which has run out of capacity in a larger block
    /// from the same allocator. This buffer's storage is left untouched, so
    /// the caller may discard the result without changing the capacity.
    fn try_extend_staged<I: Iterator<Item = T>>(
        &self,
        mut item: T,
        mut iter: I,
    ) -> Result<Self, StorageError> {
        let len = self.buffer.length();
        let additional = iter.size_hint().0.saturating_add(1);
        let max_cap = max_capacity::<T>();
        let required = match len.checked_add(additional) {
            Some(required) if required <= max_cap => required,
            _ => return Err(capacity_exceeded::<T>(len, additional)),
        };
        let capacity = GrowDoubling::next_capacity::<T>(self.buffer.capacity(), required).min(max_cap);
        let mut staged = Self {
            buffer: self.buffer.spawn(capacity)?,
        };
        unsafe {
            ptr::copy_nonoverlapping(self.as_ptr(), staged.buffer.data_ptr_mut(), len);
            staged.buffer.set_length(len);
        }
        loop {
            let len = staged.buffer.length();
            unsafe {
                staged.buffer.data_ptr_mut().add(len).write(item);
                staged.buffer.set_length(len + 1);
            }
            let Some(next) = staged.fill_spare(&mut iter) else {
                return Ok(staged);
            };
            staged.try_reserve(iter.size_hint().0.saturating_add(1))?;
            item = next;
        }
    }

    /// Try to append the items produced by `iter`. On failure, the appended
    /// items are wiped and the previous length and capacity are restored.
    pub fn try_extend<I: IntoIterator<Item = T>>(&mut self, iter: I) -> Result<(), StorageError> {
        self._try_extend(iter.into_iter())
    }

    /// Append a copy of `values` to the end of the buffer.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn extend_from_slice(&mut self, values: &[T]) {
        match self.try_extend_from_slice(values) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to append a copy of `values` to the end of the buffer.
    pub fn try_extend_from_slice(&mut self, values: &[T]) -> Result<(), StorageError> {
        self.try_reserve(values.len())?;
        let len = self.buffer.length();
        unsafe { self.copy_unchecked(len, values) };
        Ok(())
    }

    /// Move all the elements of `other` to the end of this buffer. The
    /// vacated slots of `other` are wiped; its capacity is retained.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn append(&mut self, other: &mut Self) {
        match self.try_append(other) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to move all the elements of `other` to the end of this buffer.
    pub fn try_append(&mut self, other: &mut Self) -> Result<(), StorageError> {
        self.try_extend_from_slice(other.as_slice())?;
        other.clear();
        Ok(())
    }

    /// Remove and return the element at `index`, shifting later elements
    /// down and wiping the vacated slot.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> T {
        match self.try_remove(index) {
            Ok(value) => value,
            Err(err) => err.panic(),
        }
    }

    /// Try to remove and return the element at `index`.
    pub fn try_remove(&mut self, index: usize) -> Result<T, StorageError> {
        let len = self.buffer.length();
        if index >= len {
            return Err(StorageError::OutOfRange);
        }
        unsafe {
            let head = self.buffer.data_ptr_mut().add(index);
            let value = head.read();
            ptr::copy(head.add(1), head, len - index - 1);
            self.buffer.wipe_range(len - 1, len);
            self.buffer.set_length(len - 1);
            Ok(value)
        }
    }

    /// Remove and return the element at `index`, replacing it with the last
    /// element and wiping the last slot.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn swap_remove(&mut self, index: usize) -> T {
        let len = self.buffer.length();
        if index >= len {
            StorageError::OutOfRange.panic();
        }
        unsafe {
            let data = self.buffer.data_ptr_mut();
            let value = data.add(index).read();
            data.add(index).write(data.add(len - 1).read());
            self.buffer.wipe_range(len - 1, len);
            self.buffer.set_length(len - 1);
            value
        }
    }

    /// Remove the elements within `range`, shifting later elements down and
    /// wiping the vacated tail.
    ///
    /// # Panics
    /// Panics if the range is out of bounds.
    pub fn remove_range<R: RangeBounds<usize>>(&mut self, range: R) {
        match self.try_remove_range(range) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to remove the elements within `range`.
    pub fn try_remove_range<R: RangeBounds<usize>>(
        &mut self,
        range: R,
    ) -> Result<(), StorageError> {
        let len = self.buffer.length();
        let (start, end) = resolve_range(range, len)?;
        if start == end {
            return Ok(());
        }
        let new_len = len - (end - start);
        unsafe {
            let data = self.buffer.data_ptr_mut();
            ptr::copy(data.add(end), data.add(start), len - end);
            self.buffer.wipe_range(new_len, len);
            self.buffer.set_length(new_len);
        }
        Ok(())
    }

    /// Shorten the buffer to `len` elements, wiping the removed elements.
    /// Has no effect if `len` is not less than the current length.
    pub fn truncate(&mut self, len: usize) {
        let prev = self.buffer.length();
        if len < prev {
            unsafe {
                self.buffer.wipe_range(len, prev);
                self.buffer.set_length(len);
            }
        }
    }

    /// Wipe and remove all elements. The capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0)
    }

    /// Keep only the elements for which `keep` returns `true`, preserving
    /// their order. The vacated tail is wiped.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut keep: F) {
        let len = self.buffer.length();
        let data = self.buffer.data_ptr_mut();
        let mut kept = 0;
        for index in 0..len {
            let item = unsafe { data.add(index).read() };
            if keep(&item) {
                if kept != index {
                    unsafe { data.add(kept).write(item) };
                }
                kept += 1;
            }
        }
        self.truncate(kept);
    }

    /// Resize the buffer to `new_len` elements, appending copies of `value`
    /// or wiping the removed elements.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn resize(&mut self, new_len: usize, value: T) {
        match self.try_resize(new_len, value) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to resize the buffer to `new_len` elements.
    pub fn try_resize(&mut self, new_len: usize, value: T) -> Result<(), StorageError> {
        let len = self.buffer.length();
        if new_len <= len {
            self.truncate(new_len);
            Ok(())
        } else {
            self.try_insert_elem(len, new_len - len, value)
        }
    }

    /// Resize the buffer to `new_len` elements, appending zeroed elements.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn resize_zeroed(&mut self, new_len: usize) {
        match self.try_resize_zeroed(new_len) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to resize the buffer to `new_len` elements, appending zeroed elements.
    pub fn try_resize_zeroed(&mut self, new_len: usize) -> Result<(), StorageError> {
        let len = self.buffer.length();
        if new_len <= len {
            self.truncate(new_len);
        } else {
            self.try_reserve(new_len - len)?;
            // the spare capacity is already zeroed
            unsafe { self.buffer.set_length(new_len) };
        }
        Ok(())
    }

    /// Replace the contents with a copy of `values`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn assign_from_slice(&mut self, values: &[T]) {
        match self.try_assign_from_slice(values) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to replace the contents with a copy of `values`. When the current
    /// capacity is too small a new block is filled first, then the old block
    /// is wiped and released.
    pub fn try_assign_from_slice(&mut self, values: &[T]) -> Result<(), StorageError> {
        let count = values.len();
        if count > self.buffer.capacity() {
            let mut buffer = self.buffer.spawn(count)?;
            unsafe {
                ptr::copy_nonoverlapping(values.as_ptr(), buffer.data_ptr_mut(), count);
                buffer.set_length(count);
            }
            self.buffer = buffer;
        } else {
            let len = self.buffer.length();
            unsafe {
                ptr::copy_nonoverlapping(values.as_ptr(), self.buffer.data_ptr_mut(), count);
                if count < len {
                    self.buffer.wipe_range(count, len);
                }
                self.buffer.set_length(count);
            }
        }
        Ok(())
    }

    /// Replace the contents with `count` copies of `elem`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn assign_elem(&mut self, count: usize, elem: T) {
        match self.try_assign_elem(count, elem) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to replace the contents with `count` copies of `elem`.
    pub fn try_assign_elem(&mut self, count: usize, elem: T) -> Result<(), StorageError> {
        if count > self.buffer.capacity() {
            let mut buffer = self.buffer.spawn(count)?;
            let data = buffer.data_ptr_mut();
            unsafe {
                for offset in 0..count {
                    data.add(offset).write(elem);
                }
                buffer.set_length(count);
            }
            self.buffer = buffer;
        } else {
            self.truncate(count);
            let data = self.buffer.data_ptr_mut();
            unsafe {
                for offset in 0..count {
                    data.add(offset).write(elem);
                }
                self.buffer.set_length(count);
            }
        }
        Ok(())
    }

    /// Replace the contents with the items produced by `iter`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn assign_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        match self.try_assign_iter(iter) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to replace the contents with the items produced by `iter`.
    ///
    /// The new items are appended after the current contents, which are
    /// removed only once the iterator is exhausted. On failure the buffer
    /// is unchanged.
    pub fn try_assign_iter<I: IntoIterator<Item = T>>(
        &mut self,
        iter: I,
    ) -> Result<(), StorageError> {
        let len = self.buffer.length();
        self._try_extend(iter.into_iter())?;
        self.try_remove_range(..len)
    }

    /// Move the contents out into a new buffer, leaving this one empty with
    /// no capacity. The storage itself changes hands, so nothing is copied.
    pub fn take(&mut self) -> Self {
        let alloc = self.buffer.allocator().clone();
        mem::replace(self, Self::new_in(alloc))
    }

    /// Move the contents into a new buffer which releases through `alloc`,
    /// leaving this one empty with no capacity.
    ///
    /// # Panics
    /// Panics if a copy was required and the allocation fails.
    pub fn take_in(&mut self, alloc: A) -> Self {
        match self.try_take_in(alloc) {
            Ok(buf) => buf,
            Err(err) => err.panic(),
        }
    }

    /// Try to move the contents into a new buffer which releases through
    /// `alloc`.
    ///
    /// When `alloc` may release this buffer's storage the storage is handed
    /// over. Otherwise the contents are copied into storage obtained from
    /// `alloc`, and this buffer's storage is wiped and released through its
    /// own allocator.
    pub fn try_take_in(&mut self, alloc: A) -> Result<Self, StorageError> {
        if <A::Kind as AllocatorKind>::can_transfer(&alloc, self.buffer.allocator()) {
            let (header, data) = self.buffer.detach();
            Ok(Self {
                buffer: unsafe { WipingBuffer::from_parts(header, data, alloc) },
            })
        } else {
            let taken = Self::try_from_slice_in(self.as_slice(), alloc)?;
            self.buffer.release();
            Ok(taken)
        }
    }

    /// Replace the contents of this buffer with the contents of `donor`,
    /// leaving `donor` empty with no capacity. The previous storage of this
    /// buffer is wiped and released.
    ///
    /// # Panics
    /// Panics if a copy was required and the allocation fails.
    pub fn replace_from(&mut self, donor: &mut Self) {
        match self.try_replace_from(donor) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to replace the contents of this buffer with the contents of `donor`.
    ///
    /// When this buffer's allocator may release the donor's storage, the
    /// storage is handed over. Otherwise the contents are copied and the
    /// donor's storage is wiped and released through the donor's allocator.
    pub fn try_replace_from(&mut self, donor: &mut Self) -> Result<(), StorageError> {
        let transfer = <A::Kind as AllocatorKind>::can_transfer(
            self.buffer.allocator(),
            donor.buffer.allocator(),
        );
        if transfer {
            self.buffer.release();
            let (header, data) = donor.buffer.detach();
            unsafe { self.buffer.attach(header, data) };
        } else {
            self.try_assign_from_slice(donor.as_slice())?;
            donor.buffer.release();
        }
        Ok(())
    }

    /// Exchange the contents, capacities and allocators of two buffers.
    #[inline]
    pub fn swap_with(&mut self, other: &mut Self) {
        mem::swap(self, other)
    }
}

impl<T: Plain, A: SecureAllocator> AsRef<[T]> for SecureBuffer<T, A> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Plain, A: SecureAllocator> AsMut<[T]> for SecureBuffer<T, A> {
    #[inline]
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Plain, A: SecureAllocator> Borrow<[T]> for SecureBuffer<T, A> {
    #[inline]
    fn borrow(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Plain, A: SecureAllocator> BorrowMut<[T]> for SecureBuffer<T, A> {
    #[inline]
    fn borrow_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Plain, A: SecureAllocator> Clone for SecureBuffer<T, A> {
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().clone())
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign_from_slice(source.as_slice())
    }
}

impl<T: Plain + fmt::Debug, A: SecureAllocator> fmt::Debug for SecureBuffer<T, A> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_slice().fmt(f)
    }
}

impl<T: Plain, A: AllocatorDefault + SecureAllocator> Default for SecureBuffer<T, A> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Plain, A: AllocatorDefault + SecureAllocator> ConstDefault for SecureBuffer<T, A> {
    const DEFAULT: Self = Self::new();
}

impl<T: Plain, A: SecureAllocator> Deref for SecureBuffer<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Plain, A: SecureAllocator> DerefMut for SecureBuffer<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Plain, A: SecureAllocator> Extend<T> for SecureBuffer<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        match self._try_extend(iter.into_iter()) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }
}

impl<'a, T: Plain, A: SecureAllocator> Extend<&'a T> for SecureBuffer<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        match self._try_extend(iter.into_iter().copied()) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }
}

impl<T: Plain, A: AllocatorDefault + SecureAllocator> FromIterator<T> for SecureBuffer<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buf = Self::new();
        buf.extend(iter);
        buf
    }
}

impl<T: Plain, A: AllocatorDefault + SecureAllocator> From<&[T]> for SecureBuffer<T, A> {
    fn from(data: &[T]) -> Self {
        Self::from_slice(data)
    }
}

impl<T: Plain, A: AllocatorDefault + SecureAllocator, const N: usize> From<[T; N]>
    for SecureBuffer<T, A>
{
    fn from(data: [T; N]) -> Self {
        Self::from_slice(&data)
    }
}

impl<A: AllocatorDefault + SecureAllocator> From<&str> for SecureBuffer<u8, A> {
    fn from(data: &str) -> Self {
        Self::from_slice(data.as_bytes())
    }
}

impl<T: Plain + Hash, A: SecureAllocator> Hash for SecureBuffer<T, A> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T: Plain, A: SecureAllocator> IntoIterator for SecureBuffer<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, T: Plain, A: SecureAllocator> IntoIterator for &'a SecureBuffer<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Plain, A: SecureAllocator> IntoIterator for &'a mut SecureBuffer<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A, B> PartialEq<SecureBuffer<T, B>> for SecureBuffer<T, A>
where
    T: Plain + PartialEq,
    A: SecureAllocator,
    B: SecureAllocator,
{
    #[inline]
    fn eq(&self, other: &SecureBuffer<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Plain + Eq, A: SecureAllocator> Eq for SecureBuffer<T, A> {}

impl<T: Plain + PartialEq, A: SecureAllocator> PartialEq<[T]> for SecureBuffer<T, A> {
    #[inline]
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Plain + PartialEq, A: SecureAllocator> PartialEq<&[T]> for SecureBuffer<T, A> {
    #[inline]
    fn eq(&self, other: &&[T]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: Plain + PartialEq, A: SecureAllocator, const N: usize> PartialEq<[T; N]>
    for SecureBuffer<T, A>
{
    #[inline]
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Plain + PartialEq, A: SecureAllocator, const N: usize> PartialEq<&[T; N]>
    for SecureBuffer<T, A>
{
    #[inline]
    fn eq(&self, other: &&[T; N]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: Plain + PartialOrd, A: SecureAllocator> PartialOrd for SecureBuffer<T, A> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<T: Plain + Ord, A: SecureAllocator> Ord for SecureBuffer<T, A> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Plain, A: SecureAllocator> Zeroize for SecureBuffer<T, A> {
    /// Wipe the full capacity and release the storage.
    #[inline]
    fn zeroize(&mut self) {
        self.buffer.release();
    }
}

impl<T: Plain, A: SecureAllocator> ZeroizeOnDrop for SecureBuffer<T, A> {}

#[cfg(feature = "std")]
impl<A: SecureAllocator> std::io::Write for SecureBuffer<u8, A> {
    #[inline]
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self.try_extend_from_slice(buf) {
            Ok(_) => Ok(buf.len()),
            Err(StorageError::CapacityLimit) => {
                let spare = self.max_len() - self.len();
                let count = spare.min(buf.len());
                self.try_extend_from_slice(&buf[..count])
                    .map_err(|err| std::io::Error::new(std::io::ErrorKind::OutOfMemory, err))?;
                Ok(count)
            }
            Err(err) => Err(std::io::Error::new(std::io::ErrorKind::OutOfMemory, err)),
        }
    }
}
