use core::fmt;
use core::iter::FusedIterator;

use super::SecureBuffer;
use crate::alloc::{Global, SecureAllocator};
use crate::plain::Plain;

/// An iterator which takes ownership of a [`SecureBuffer`] and yields copies
/// of its elements. The storage is wiped when the iterator is dropped.
pub struct IntoIter<T: Plain, A: SecureAllocator = Global> {
    buffer: SecureBuffer<T, A>,
    start: usize,
    end: usize,
}

impl<T: Plain, A: SecureAllocator> IntoIter<T, A> {
    pub(super) fn new(buffer: SecureBuffer<T, A>) -> Self {
        let end = buffer.len();
        Self {
            buffer,
            start: 0,
            end,
        }
    }

    /// Access the remaining items as a slice reference.
    pub fn as_slice(&self) -> &[T] {
        &self.buffer[self.start..self.end]
    }

    /// Access a reference to the allocator instance.
    pub fn allocator(&self) -> &A {
        self.buffer.allocator()
    }
}

impl<T: Plain + fmt::Debug, A: SecureAllocator> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T: Plain, A: SecureAllocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.start < self.end {
            let item = self.buffer[self.start];
            self.start += 1;
            Some(item)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.end - self.start;
        (len, Some(len))
    }
}

impl<T: Plain, A: SecureAllocator> DoubleEndedIterator for IntoIter<T, A> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        if self.start < self.end {
            self.end -= 1;
            Some(self.buffer[self.end])
        } else {
            None
        }
    }
}

impl<T: Plain, A: SecureAllocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T: Plain, A: SecureAllocator> FusedIterator for IntoIter<T, A> {}
