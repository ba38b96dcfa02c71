//! A NUL-terminated string stored in a [`SecureBuffer`].
//!
//! The underlying buffer always holds `len() + 1` characters, the last of
//! which is [`CharType::NUL`]. Every mutation is expressed as an insertion,
//! removal or resize of the buffer at an index no greater than `len()`, so
//! the terminator travels with the tail and all wiping of vacated
//! characters is performed by the buffer.

use core::cmp::Ordering;
use core::ffi::{CStr, FromBytesWithNulError};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use core::ops::{Add, AddAssign, Deref, DerefMut, RangeBounds};
use core::str::Utf8Error;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::alloc::{AllocatorDefault, Global, SecureAllocator};
use crate::buffer::{resolve_range, SecureBuffer};
use crate::error::{StorageError, UpdateError};

pub use self::chars::{CharType, Pattern};

mod chars;
mod impls;
#[cfg(feature = "std")]
mod read;
mod search;

/// A secure string of 16-bit code units.
pub type SecureU16String<A = Global> = SecureString<u16, A>;

/// A secure string of 32-bit code units.
pub type SecureU32String<A = Global> = SecureString<u32, A>;

/// A secure string of Unicode scalar values.
pub type SecureCharString<A = Global> = SecureString<char, A>;

/// Select `count` characters of `chars` starting from `pos`, clamping the
/// count to the available characters.
fn sub_chars<T>(chars: &[T], pos: usize, count: usize) -> Result<&[T], StorageError> {
    if pos > chars.len() {
        return Err(StorageError::OutOfRange);
    }
    let count = count.min(chars.len() - pos);
    Ok(&chars[pos..pos + count])
}

/// A growable, NUL-terminated character string which wipes its memory.
pub struct SecureString<T: CharType = u8, A: SecureAllocator = Global> {
    buffer: SecureBuffer<T, A>,
}

impl<T: CharType, A: AllocatorDefault + SecureAllocator> SecureString<T, A> {
    /// Constructs a new, empty string. This allocates storage for the terminator.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn new() -> Self {
        Self::new_in(A::DEFAULT)
    }

    /// Try to construct a new, empty string.
    #[inline]
    pub fn try_new() -> Result<Self, StorageError> {
        Self::try_new_in(A::DEFAULT)
    }

    /// Constructs a new, empty string with capacity for at least `capacity` characters.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, A::DEFAULT)
    }

    /// Constructs a string containing a copy of `chars`.
    pub fn from_slice(chars: &[T]) -> Self {
        Self::from_slice_in(chars, A::DEFAULT)
    }

    /// Try to construct a string containing a copy of `chars`.
    #[inline]
    pub fn try_from_slice(chars: &[T]) -> Result<Self, StorageError> {
        Self::try_from_slice_in(chars, A::DEFAULT)
    }

    /// Constructs a string containing `count` copies of `ch`.
    pub fn from_elem(ch: T, count: usize) -> Self {
        match Self::try_from_elem_in(ch, count, A::DEFAULT) {
            Ok(s) => s,
            Err(err) => err.panic(),
        }
    }
}

impl<T: CharType, A: SecureAllocator> SecureString<T, A> {
    /// Constructs a new, empty string which allocates from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        match Self::try_new_in(alloc) {
            Ok(s) => s,
            Err(err) => err.panic(),
        }
    }

    /// Try to construct a new, empty string which allocates from `alloc`.
    pub fn try_new_in(alloc: A) -> Result<Self, StorageError> {
        Self::try_with_capacity_in(0, alloc)
    }

    /// Constructs a new, empty string in `alloc` with capacity for at least
    /// `capacity` characters.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        match Self::try_with_capacity_in(capacity, alloc) {
            Ok(s) => s,
            Err(err) => err.panic(),
        }
    }

    /// Try to construct a new, empty string in `alloc` with capacity for at
    /// least `capacity` characters.
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self, StorageError> {
        let capacity = capacity
            .checked_add(1)
            .ok_or(StorageError::CapacityLimit)?;
        let mut buffer = SecureBuffer::try_with_capacity_in(capacity, alloc)?;
        buffer.try_push(T::NUL)?;
        Ok(Self { buffer })
    }

    /// Constructs a string in `alloc` containing a copy of `chars`.
    pub fn from_slice_in(chars: &[T], alloc: A) -> Self {
        match Self::try_from_slice_in(chars, alloc) {
            Ok(s) => s,
            Err(err) => err.panic(),
        }
    }

    /// Try to construct a string in `alloc` containing a copy of `chars`.
    pub fn try_from_slice_in(chars: &[T], alloc: A) -> Result<Self, StorageError> {
        let mut s = Self::try_with_capacity_in(chars.len(), alloc)?;
        s.buffer.try_insert_slice(0, chars)?;
        Ok(s)
    }

    /// Constructs a string in `alloc` containing `count` copies of `ch`.
    pub fn from_elem_in(ch: T, count: usize, alloc: A) -> Self {
        match Self::try_from_elem_in(ch, count, alloc) {
            Ok(s) => s,
            Err(err) => err.panic(),
        }
    }

    /// Try to construct a string in `alloc` containing `count` copies of `ch`.
    pub fn try_from_elem_in(ch: T, count: usize, alloc: A) -> Result<Self, StorageError> {
        let mut s = Self::try_with_capacity_in(count, alloc)?;
        s.buffer.try_insert_elem(0, count, ch)?;
        Ok(s)
    }

    /// Convert a buffer of characters into a string by appending the
    /// terminator. On failure the buffer is returned within the error.
    pub fn try_from_buffer(
        mut buffer: SecureBuffer<T, A>,
    ) -> Result<Self, UpdateError<SecureBuffer<T, A>>> {
        match buffer.try_push(T::NUL) {
            Ok(_) => Ok(Self { buffer }),
            Err(err) => Err(UpdateError::new(err.error, buffer)),
        }
    }

    /// Convert into the underlying buffer, wiping the terminator.
    pub fn into_buffer(self) -> SecureBuffer<T, A> {
        let mut buffer = self.buffer;
        buffer.pop();
        buffer
    }

    /// Copy the contents into a new string allocated from `alloc`.
    pub fn clone_in(&self, alloc: A) -> Self {
        match self.try_clone_in(alloc) {
            Ok(s) => s,
            Err(err) => err.panic(),
        }
    }

    /// Try to copy the contents into a new string allocated from `alloc`.
    #[inline]
    pub fn try_clone_in(&self, alloc: A) -> Result<Self, StorageError> {
        Ok(Self {
            buffer: self.buffer.try_clone_in(alloc)?,
        })
    }

    /// Access a reference to the allocator instance.
    #[inline]
    pub fn allocator(&self) -> &A {
        self.buffer.allocator()
    }

    /// Get the number of characters, excluding the terminator.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Check whether the string has no characters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.len() == 1
    }

    /// Get the number of characters the string can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity().saturating_sub(1)
    }

    /// The largest number of characters a string may hold.
    #[inline]
    pub fn max_len(&self) -> usize {
        self.buffer.max_len() - 1
    }

    /// Access the characters, excluding the terminator.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        let len = self.len();
        &self.buffer[..len]
    }

    /// Access the characters mutably, excluding the terminator.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len();
        &mut self.buffer[..len]
    }

    /// Access the characters followed by the terminator.
    #[inline]
    pub fn as_slice_with_nul(&self) -> &[T] {
        self.buffer.as_slice()
    }

    /// Get a pointer to the NUL-terminated character data.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buffer.as_ptr()
    }

    /// Get a reference to the character at `index`, or `StorageError::OutOfRange`.
    #[inline]
    pub fn try_get(&self, index: usize) -> Result<&T, StorageError> {
        self.as_slice().get(index).ok_or(StorageError::OutOfRange)
    }

    /// Get a mutable reference to the character at `index`, or `StorageError::OutOfRange`.
    #[inline]
    pub fn try_get_mut(&mut self, index: usize) -> Result<&mut T, StorageError> {
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(StorageError::OutOfRange)
    }

    /// Check the structural invariants: the terminator is present and the
    /// buffer invariants hold.
    pub fn invariants(&self) -> bool {
        self.buffer.last() == Some(&T::NUL) && self.buffer.invariants()
    }

    /// Reserve capacity for at least `additional` more characters.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn reserve(&mut self, additional: usize) {
        self.buffer.reserve(additional)
    }

    /// Try to reserve capacity for at least `additional` more characters.
    #[inline]
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), StorageError> {
        self.buffer.try_reserve(additional)
    }

    /// Reserve capacity for exactly `additional` more characters.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn reserve_exact(&mut self, additional: usize) {
        self.buffer.reserve_exact(additional)
    }

    /// Try to reserve capacity for exactly `additional` more characters.
    #[inline]
    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<(), StorageError> {
        self.buffer.try_reserve_exact(additional)
    }

    /// Reduce the capacity to the length of the string.
    pub fn shrink_to_fit(&mut self) {
        self.buffer.shrink_to_fit()
    }

    /// Try to reduce the capacity to the length of the string.
    #[inline]
    pub fn try_shrink_to_fit(&mut self) -> Result<(), StorageError> {
        self.buffer.try_shrink_to_fit()
    }

    /// Wipe and remove all characters. The capacity is retained.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0)
    }

    /// Shorten the string to `len` characters, wiping the removed characters.
    pub fn truncate(&mut self, len: usize) {
        let cur = self.len();
        if len < cur {
            self.buffer.remove_range(len..cur);
        }
    }

    /// Append a character.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn push(&mut self, ch: T) {
        match self.try_push(ch) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to append a character.
    #[inline]
    pub fn try_push(&mut self, ch: T) -> Result<(), UpdateError<T>> {
        let len = self.len();
        self.buffer.try_insert(len, ch)
    }

    /// Remove and return the last character, wiping its slot.
    pub fn pop(&mut self) -> Option<T> {
        let len = self.len();
        if len == 0 {
            None
        } else {
            Some(self.buffer.remove(len - 1))
        }
    }

    /// Insert a character at `index`.
    ///
    /// # Panics
    /// Panics if `index > len()` or the allocation fails.
    pub fn insert(&mut self, index: usize, ch: T) {
        match self.try_insert(index, ch) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to insert a character at `index`.
    pub fn try_insert(&mut self, index: usize, ch: T) -> Result<(), UpdateError<T>> {
        if index > self.len() {
            return Err(UpdateError::new(StorageError::OutOfRange, ch));
        }
        self.buffer.try_insert(index, ch)
    }

    /// Insert the characters of `chars` at `index`.
    ///
    /// # Panics
    /// Panics if `index > len()` or the allocation fails.
    pub fn insert_chars<P: Pattern<T>>(&mut self, index: usize, chars: P) {
        match self.try_insert_chars(index, chars) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to insert the characters of `chars` at `index`.
    pub fn try_insert_chars<P: Pattern<T>>(
        &mut self,
        index: usize,
        chars: P,
    ) -> Result<(), StorageError> {
        if index > self.len() {
            return Err(StorageError::OutOfRange);
        }
        self.buffer.try_insert_slice(index, chars.as_chars())
    }

    /// Insert `count` copies of `ch` at `index`.
    ///
    /// # Panics
    /// Panics if `index > len()` or the allocation fails.
    pub fn insert_elem(&mut self, index: usize, count: usize, ch: T) {
        match self.try_insert_elem(index, count, ch) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to insert `count` copies of `ch` at `index`.
    pub fn try_insert_elem(&mut self, index: usize, count: usize, ch: T) -> Result<(), StorageError> {
        if index > self.len() {
            return Err(StorageError::OutOfRange);
        }
        self.buffer.try_insert_elem(index, count, ch)
    }

    /// Insert up to `count` characters of `chars` starting from `pos`, at `index`.
    ///
    /// # Panics
    /// Panics if `index > len()`, `pos` is beyond the end of `chars`, or the
    /// allocation fails.
    pub fn insert_substr<P: Pattern<T>>(&mut self, index: usize, chars: P, pos: usize, count: usize) {
        match self.try_insert_substr(index, chars, pos, count) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to insert up to `count` characters of `chars` starting from `pos`, at `index`.
    pub fn try_insert_substr<P: Pattern<T>>(
        &mut self,
        index: usize,
        chars: P,
        pos: usize,
        count: usize,
    ) -> Result<(), StorageError> {
        let sub = sub_chars(chars.as_chars(), pos, count)?;
        self.try_insert_chars(index, sub)
    }

    /// Insert the characters produced by `iter` at `index`.
    ///
    /// # Panics
    /// Panics if `index > len()` or the allocation fails.
    pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, index: usize, iter: I) {
        match self.try_insert_iter(index, iter) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to insert the characters produced by `iter` at `index`. On
    /// failure the string is unchanged.
    pub fn try_insert_iter<I: IntoIterator<Item = T>>(
        &mut self,
        index: usize,
        iter: I,
    ) -> Result<(), StorageError> {
        if index > self.len() {
            return Err(StorageError::OutOfRange);
        }
        self.buffer.try_insert_iter(index, iter)
    }

    /// Append the characters of `chars`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn append<P: Pattern<T>>(&mut self, chars: P) {
        match self.try_append(chars) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to append the characters of `chars`.
    #[inline]
    pub fn try_append<P: Pattern<T>>(&mut self, chars: P) -> Result<(), StorageError> {
        let len = self.len();
        self.buffer.try_insert_slice(len, chars.as_chars())
    }

    /// Append `count` copies of `ch`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn append_elem(&mut self, count: usize, ch: T) {
        match self.try_append_elem(count, ch) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to append `count` copies of `ch`.
    #[inline]
    pub fn try_append_elem(&mut self, count: usize, ch: T) -> Result<(), StorageError> {
        let len = self.len();
        self.buffer.try_insert_elem(len, count, ch)
    }

    /// Append up to `count` characters of `chars` starting from `pos`.
    ///
    /// # Panics
    /// Panics if `pos` is beyond the end of `chars` or the allocation fails.
    pub fn append_substr<P: Pattern<T>>(&mut self, chars: P, pos: usize, count: usize) {
        match self.try_append_substr(chars, pos, count) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to append up to `count` characters of `chars` starting from `pos`.
    /// Fails with `StorageError::OutOfRange` if `pos` is beyond the end of `chars`.
    pub fn try_append_substr<P: Pattern<T>>(
        &mut self,
        chars: P,
        pos: usize,
        count: usize,
    ) -> Result<(), StorageError> {
        let sub = sub_chars(chars.as_chars(), pos, count)?;
        self.try_append(sub)
    }

    /// Replace the contents with the characters of `chars`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn assign<P: Pattern<T>>(&mut self, chars: P) {
        match self.try_assign(chars) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to replace the contents with the characters of `chars`.
    pub fn try_assign<P: Pattern<T>>(&mut self, chars: P) -> Result<(), StorageError> {
        let chars = chars.as_chars();
        let count = chars.len();
        self.resize_buffer(count)?;
        self.buffer[..count].copy_from_slice(chars);
        Ok(())
    }

    /// Replace the contents with `count` copies of `ch`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn assign_elem(&mut self, count: usize, ch: T) {
        match self.try_assign_elem(count, ch) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to replace the contents with `count` copies of `ch`.
    pub fn try_assign_elem(&mut self, count: usize, ch: T) -> Result<(), StorageError> {
        self.resize_buffer(count)?;
        self.buffer[..count].fill(ch);
        Ok(())
    }

    /// Replace the contents with up to `count` characters of `chars` starting from `pos`.
    ///
    /// # Panics
    /// Panics if `pos` is beyond the end of `chars` or the allocation fails.
    pub fn assign_substr<P: Pattern<T>>(&mut self, chars: P, pos: usize, count: usize) {
        match self.try_assign_substr(chars, pos, count) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to replace the contents with up to `count` characters of `chars`
    /// starting from `pos`.
    pub fn try_assign_substr<P: Pattern<T>>(
        &mut self,
        chars: P,
        pos: usize,
        count: usize,
    ) -> Result<(), StorageError> {
        let sub = sub_chars(chars.as_chars(), pos, count)?;
        self.try_assign(sub)
    }

    /// Replace the contents with the characters produced by `iter`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn assign_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        match self.try_assign_iter(iter) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to replace the contents with the characters produced by `iter`.
    /// The previous characters are removed only once the iterator is
    /// exhausted, so on failure the string is unchanged.
    pub fn try_assign_iter<I: IntoIterator<Item = T>>(&mut self, iter: I) -> Result<(), StorageError> {
        let len = self.len();
        self.buffer.try_insert_iter(len, iter)?;
        self.buffer.try_remove_range(..len)
    }

    /// Resize the buffer to hold `count` characters plus the terminator.
    /// The characters in `[0, count)` are left for the caller to overwrite.
    fn resize_buffer(&mut self, count: usize) -> Result<(), StorageError> {
        let total = count.checked_add(1).ok_or(StorageError::CapacityLimit)?;
        self.buffer.try_resize(total, T::NUL)?;
        self.buffer[count] = T::NUL;
        Ok(())
    }

    /// Remove up to `count` characters starting at `index`, wiping the vacated tail.
    ///
    /// # Panics
    /// Panics if `index > len()`.
    pub fn erase(&mut self, index: usize, count: usize) {
        match self.try_erase(index, count) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to remove up to `count` characters starting at `index`.
    pub fn try_erase(&mut self, index: usize, count: usize) -> Result<(), StorageError> {
        let len = self.len();
        if index > len {
            return Err(StorageError::OutOfRange);
        }
        let count = count.min(len - index);
        self.buffer.try_remove_range(index..index + count)
    }

    /// Remove and return the character at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> T {
        match self.try_remove(index) {
            Ok(ch) => ch,
            Err(err) => err.panic(),
        }
    }

    /// Try to remove and return the character at `index`.
    pub fn try_remove(&mut self, index: usize) -> Result<T, StorageError> {
        if index >= self.len() {
            return Err(StorageError::OutOfRange);
        }
        self.buffer.try_remove(index)
    }

    /// Remove the characters within `range`.
    ///
    /// # Panics
    /// Panics if the range is out of bounds.
    pub fn remove_range<R: RangeBounds<usize>>(&mut self, range: R) {
        match self.try_remove_range(range) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to remove the characters within `range`.
    pub fn try_remove_range<R: RangeBounds<usize>>(&mut self, range: R) -> Result<(), StorageError> {
        let (start, end) = resolve_range(range, self.len())?;
        self.buffer.try_remove_range(start..end)
    }

    /// Resize the string to `new_len` characters, appending copies of `ch`
    /// or wiping the removed characters.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    pub fn resize(&mut self, new_len: usize, ch: T) {
        match self.try_resize(new_len, ch) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to resize the string to `new_len` characters.
    pub fn try_resize(&mut self, new_len: usize, ch: T) -> Result<(), StorageError> {
        let len = self.len();
        if new_len <= len {
            self.truncate(new_len);
            Ok(())
        } else {
            self.buffer.try_insert_elem(len, new_len - len, ch)
        }
    }

    /// Compare the contents with `other`.
    #[inline]
    pub fn compare<P: Pattern<T>>(&self, other: P) -> Ordering {
        self.as_slice().cmp(other.as_chars())
    }

    /// Compare up to `count` characters starting from `pos` with `other`.
    ///
    /// # Panics
    /// Panics if `pos > len()`.
    pub fn compare_substr<P: Pattern<T>>(&self, pos: usize, count: usize, other: P) -> Ordering {
        match self.try_compare_substr(pos, count, other) {
            Ok(ord) => ord,
            Err(err) => err.panic(),
        }
    }

    /// Try to compare up to `count` characters starting from `pos` with `other`.
    pub fn try_compare_substr<P: Pattern<T>>(
        &self,
        pos: usize,
        count: usize,
        other: P,
    ) -> Result<Ordering, StorageError> {
        let sub = sub_chars(self.as_slice(), pos, count)?;
        Ok(sub.cmp(other.as_chars()))
    }

    /// Copy up to `count` characters starting from `pos` into a new string
    /// using a clone of this string's allocator.
    ///
    /// # Panics
    /// Panics if `pos > len()` or the allocation fails.
    pub fn substr(&self, pos: usize, count: usize) -> Self {
        match self.try_substr(pos, count) {
            Ok(s) => s,
            Err(err) => err.panic(),
        }
    }

    /// Try to copy up to `count` characters starting from `pos` into a new string.
    pub fn try_substr(&self, pos: usize, count: usize) -> Result<Self, StorageError> {
        let sub = sub_chars(self.as_slice(), pos, count)?;
        Self::try_from_slice_in(sub, self.allocator().clone())
    }

    /// Copy characters starting from `pos` into `dest`, returning the number
    /// of characters copied. No terminator is written.
    ///
    /// # Panics
    /// Panics if `pos > len()`.
    pub fn copy_to(&self, dest: &mut [T], pos: usize) -> usize {
        match self.try_copy_to(dest, pos) {
            Ok(count) => count,
            Err(err) => err.panic(),
        }
    }

    /// Try to copy characters starting from `pos` into `dest`.
    pub fn try_copy_to(&self, dest: &mut [T], pos: usize) -> Result<usize, StorageError> {
        let sub = sub_chars(self.as_slice(), pos, dest.len())?;
        dest[..sub.len()].copy_from_slice(sub);
        Ok(sub.len())
    }

    /// Move the contents out into a new string, leaving this one empty.
    ///
    /// # Panics
    /// Panics if storage for the replacement terminator cannot be allocated.
    pub fn take(&mut self) -> Self {
        match self.try_take() {
            Ok(s) => s,
            Err(err) => err.panic(),
        }
    }

    /// Try to move the contents out into a new string, leaving this one empty.
    /// The storage itself changes hands.
    pub fn try_take(&mut self) -> Result<Self, StorageError> {
        let empty = Self::try_new_in(self.allocator().clone())?;
        Ok(mem::replace(self, empty))
    }

    /// Move the contents into a new string which releases through `alloc`,
    /// leaving this one empty.
    ///
    /// # Panics
    /// Panics if an allocation fails.
    pub fn take_in(&mut self, alloc: A) -> Self {
        match self.try_take_in(alloc) {
            Ok(s) => s,
            Err(err) => err.panic(),
        }
    }

    /// Try to move the contents into a new string which releases through
    /// `alloc`. See [`SecureBuffer::try_take_in`].
    pub fn try_take_in(&mut self, alloc: A) -> Result<Self, StorageError> {
        let empty = Self::try_new_in(self.allocator().clone())?;
        let buffer = self.buffer.try_take_in(alloc)?;
        *self = empty;
        Ok(Self { buffer })
    }

    /// Replace the contents with the contents of `donor`, leaving `donor`
    /// empty. The previous storage of this string is wiped and released.
    ///
    /// # Panics
    /// Panics if an allocation fails.
    pub fn replace_from(&mut self, donor: &mut Self) {
        match self.try_replace_from(donor) {
            Ok(_) => (),
            Err(err) => err.panic(),
        }
    }

    /// Try to replace the contents with the contents of `donor`.
    /// See [`SecureBuffer::try_replace_from`].
    pub fn try_replace_from(&mut self, donor: &mut Self) -> Result<(), StorageError> {
        let empty = Self::try_new_in(donor.allocator().clone())?;
        self.buffer.try_replace_from(&mut donor.buffer)?;
        *donor = empty;
        Ok(())
    }

    /// Exchange the contents, capacities and allocators of two strings.
    #[inline]
    pub fn swap_with(&mut self, other: &mut Self) {
        mem::swap(self, other)
    }
}

impl<A: SecureAllocator> SecureString<u8, A> {
    /// Access the contents as a `str` if they are valid UTF-8.
    #[inline]
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        core::str::from_utf8(self.as_slice())
    }

    /// Access the NUL-terminated contents as a `CStr`. Fails if the string
    /// contains an interior NUL.
    #[inline]
    pub fn as_c_str(&self) -> Result<&CStr, FromBytesWithNulError> {
        CStr::from_bytes_with_nul(self.as_slice_with_nul())
    }

    /// Append the contents of `s`.
    ///
    /// # Panics
    /// Panics if the allocation fails.
    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.append(s)
    }

    /// Insert the contents of `s` at `index`.
    ///
    /// # Panics
    /// Panics if `index > len()` or the allocation fails.
    #[inline]
    pub fn insert_str(&mut self, index: usize, s: &str) {
        self.insert_chars(index, s)
    }
}

impl<T: CharType, A: SecureAllocator> AsRef<[T]> for SecureString<T, A> {
    #[inline]
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: CharType, A: SecureAllocator> Clone for SecureString<T, A> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.buffer.clone_from(&source.buffer)
    }
}

impl<T: CharType, A: SecureAllocator> fmt::Debug for SecureString<T, A> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        T::fmt_debug(self.as_slice(), f)
    }
}

impl<T: CharType, A: AllocatorDefault + SecureAllocator> Default for SecureString<T, A> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CharType, A: SecureAllocator> Deref for SecureString<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: CharType, A: SecureAllocator> DerefMut for SecureString<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: CharType, A: SecureAllocator> Hash for SecureString<T, A> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl<T: CharType, A: SecureAllocator> Zeroize for SecureString<T, A> {
    /// Wipe the characters, leaving an empty string.
    #[inline]
    fn zeroize(&mut self) {
        self.clear();
    }
}

impl<T: CharType, A: SecureAllocator> ZeroizeOnDrop for SecureString<T, A> {}

impl<T, A, P> Add<P> for SecureString<T, A>
where
    T: CharType,
    A: SecureAllocator,
    P: Pattern<T>,
{
    type Output = Self;

    #[inline]
    fn add(mut self, rhs: P) -> Self {
        self.append(rhs);
        self
    }
}

impl<T, A, P> AddAssign<P> for SecureString<T, A>
where
    T: CharType,
    A: SecureAllocator,
    P: Pattern<T>,
{
    #[inline]
    fn add_assign(&mut self, rhs: P) {
        self.append(rhs)
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;

    type S = SecureString;

    #[test]
    fn empty_has_terminator() {
        let s = S::new();
        assert_eq!(s.len(), 0);
        assert!(s.is_empty());
        assert_eq!(s.as_slice_with_nul(), b"\0");
        assert!(s.capacity() < s.max_len());
        assert!(s.invariants());
    }

    #[test]
    fn insert_in_middle() {
        let mut s = S::from("123456");
        s.insert_chars(3, "abc");
        assert_eq!(s, "123abc456");
        assert_eq!(s.as_slice_with_nul(), b"123abc456\0");
        assert_eq!(s.try_insert(10, b'x').map_err(|e| e.error), Err(StorageError::OutOfRange));
        s.insert_str(9, "!");
        s.insert(0, b'>');
        assert_eq!(s, ">123abc456!");
        assert!(s.invariants());
    }

    #[test]
    fn substr_ranges() {
        let mut s = S::from("abc");
        assert_eq!(s.try_append_substr("xyz", 4, 1), Err(StorageError::OutOfRange));
        assert_eq!(s, "abc");
        s.append_substr("xyz", 1, S::NPOS);
        assert_eq!(s, "abcyz");
        s.append_substr("xyz", 3, 5);
        assert_eq!(s, "abcyz");
        assert_eq!(s.substr(1, 3), "bcy");
        assert_eq!(s.substr(5, 1), "");
        assert!(s.try_substr(6, 1).is_err());
        s.assign_substr("hello", 1, 3);
        assert_eq!(s, "ell");
        s.insert_substr(0, "xyz", 2, 1);
        assert_eq!(s, "zell");
    }

    #[test]
    fn erase_and_remove() {
        let mut s = S::from("hello world");
        s.erase(5, 100);
        assert_eq!(s, "hello");
        s.erase(1, 2);
        assert_eq!(s, "hlo");
        assert_eq!(s.try_erase(4, 1), Err(StorageError::OutOfRange));
        assert_eq!(s.remove(0), b'h');
        assert_eq!(s.try_remove(2), Err(StorageError::OutOfRange));
        s.remove_range(..1);
        assert_eq!(s, "o");
        assert_eq!(s.pop(), Some(b'o'));
        assert_eq!(s.pop(), None);
        assert!(s.invariants());
    }

    #[test]
    fn assign_and_resize() {
        let mut s = S::from("a long initial value");
        s.assign("short");
        assert_eq!(s.as_slice_with_nul(), b"short\0");
        s.assign_elem(3, b'z');
        assert_eq!(s, "zzz");
        s.assign_iter(b"iter".iter().copied());
        assert_eq!(s, "iter");
        s.resize(6, b'!');
        assert_eq!(s, "iter!!");
        s.resize(2, b'?');
        assert_eq!(s, "it");
        s.append_elem(2, b'.');
        s.push(b'x');
        s += "yz";
        let s = s + b'!';
        assert_eq!(s, "it..xyz!");
        assert!(s.invariants());
    }

    #[test]
    fn compare_and_copy() {
        let s = S::from("abcdef");
        assert_eq!(s.compare("abcdef"), Ordering::Equal);
        assert_eq!(s.compare("abd"), Ordering::Less);
        assert_eq!(s.compare_substr(2, 2, "cd"), Ordering::Equal);
        assert_eq!(s.compare_substr(4, 10, "ef"), Ordering::Equal);
        assert_eq!(s.try_compare_substr(7, 1, "a"), Err(StorageError::OutOfRange));
        let mut dest = [0u8; 4];
        assert_eq!(s.copy_to(&mut dest, 3), 3);
        assert_eq!(&dest, b"def\0");
        assert_eq!(s.copy_to(&mut dest, 6), 0);
        assert_eq!(s.try_copy_to(&mut dest, 7), Err(StorageError::OutOfRange));
    }

    #[test]
    fn take_and_replace() {
        let mut a = S::from("secret");
        let b = a.take();
        assert_eq!(b, "secret");
        assert!(a.is_empty());
        assert!(a.invariants());
        let mut c = S::from("other");
        a.replace_from(&mut c);
        assert_eq!(a, "other");
        assert!(c.is_empty() && c.invariants());
        let d = a.take_in(Global);
        assert_eq!(d, "other");
        assert!(a.invariants());
        let mut e = S::from("e");
        let mut f = S::from("f");
        e.swap_with(&mut f);
        assert_eq!((e.as_slice(), f.as_slice()), (&b"f"[..], &b"e"[..]));
    }

    #[test]
    fn buffer_conversion() {
        let s = S::from("abc");
        let buf = s.into_buffer();
        assert_eq!(buf, b"abc");
        let s = S::try_from_buffer(buf).expect("conversion failed");
        assert_eq!(s.as_c_str().expect("interior nul").to_bytes(), b"abc");
        assert_eq!(s.as_str(), Ok("abc"));
        let bad = S::from(&b"a\0b"[..]);
        assert!(bad.as_c_str().is_err());
        assert_eq!(S::from_elem(b'q', 2), "qq");
    }
}
