//! Element types accepted by secure collections.

use core::mem::MaybeUninit;
use core::num::Wrapping;

/// Plain data which may be stored in a secure collection.
///
/// Secure collections copy their elements with raw memory copies, never run
/// destructors, and overwrite vacated elements with zero bytes. Only types
/// for which those operations are sound, and which do not own memory
/// elsewhere, may implement this trait.
///
/// # Safety
/// Implementors must be `Copy`, must not contain references or pointers to
/// storage that would escape wiping, and must be valid when every byte of
/// their representation is zero.
pub unsafe trait Plain: Copy + 'static {}

macro_rules! impl_plain {
    ($($ty:ty),+ $(,)?) => {
        $( unsafe impl Plain for $ty {} )+
    };
}

impl_plain!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char);

unsafe impl Plain for () {}

unsafe impl<T: Plain, const N: usize> Plain for [T; N] {}

unsafe impl<T: Plain> Plain for MaybeUninit<T> {}

unsafe impl<T: Plain> Plain for Wrapping<T> {}

unsafe impl<A: Plain, B: Plain> Plain for (A, B) {}

unsafe impl<A: Plain, B: Plain, C: Plain> Plain for (A, B, C) {}
