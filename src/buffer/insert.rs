use core::marker::PhantomData;

use crate::alloc::Allocator;
use crate::plain::Plain;
use crate::storage::utils::wipe;
use crate::storage::WipingBuffer;

/// Writes elements into the spare capacity following the occupied length
/// of a buffer. Slots written before `complete` is called are wiped again
/// when the inserter is dropped, so an unwinding iterator cannot leave
/// data behind in the spare capacity.
pub(crate) struct Inserter<'a, T> {
    data: *mut T,
    cap: usize,
    start: usize,
    end: usize,
    _pd: PhantomData<&'a mut T>,
}

impl<'a, T: Plain> Inserter<'a, T> {
    #[inline]
    pub fn for_buffer<A: Allocator>(buf: &'a mut WipingBuffer<T, A>) -> Self {
        let cap = buf.capacity();
        let len = buf.length();
        Self {
            data: buf.data_ptr_mut(),
            cap,
            start: len,
            end: len,
            _pd: PhantomData,
        }
    }

    #[inline]
    pub fn push(&mut self, val: T) {
        assert!(self.end < self.cap);
        unsafe { self.data.add(self.end).write(val) };
        self.end += 1;
    }

    #[inline]
    pub const fn full(&self) -> bool {
        self.end == self.cap
    }

    /// Accept the written elements, returning the new occupied length.
    #[inline]
    pub fn complete(mut self) -> usize {
        self.start = self.end;
        self.end
    }
}

impl<T> Drop for Inserter<'_, T> {
    #[inline]
    fn drop(&mut self) {
        if self.start != self.end {
            unsafe { wipe(self.data.add(self.start), self.end - self.start) };
        }
    }
}
