use core::alloc::Layout;
use core::mem::{size_of, MaybeUninit};
use core::slice;

use zeroize::Zeroize;

use crate::error::StorageError;

/// The largest number of `T` elements which may be held in one allocation.
pub const fn max_capacity<T>() -> usize {
    if size_of::<T>() == 0 {
        usize::MAX
    } else {
        isize::MAX as usize / size_of::<T>()
    }
}

pub const fn min_non_zero_cap<T>() -> usize {
    if size_of::<T>() == 1 {
        8
    } else if size_of::<T>() <= 1024 {
        4
    } else {
        1
    }
}

#[inline]
pub fn array_layout<T>(count: usize) -> Result<Layout, StorageError> {
    if count > max_capacity::<T>() {
        return Err(StorageError::CapacityLimit);
    }
    Ok(Layout::array::<T>(count)?)
}

/// Overwrite `count` elements starting at `data` with zero bytes.
///
/// # Safety
/// The range must lie within a single live allocation.
#[inline]
pub unsafe fn wipe<T>(data: *mut T, count: usize) {
    let len = count * size_of::<T>();
    if len > 0 {
        slice::from_raw_parts_mut(data.cast::<MaybeUninit<u8>>(), len).zeroize();
    }
}
