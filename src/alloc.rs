//! Support for memory allocation.
//!
//! Besides the `Allocator` interface itself, this module defines how a
//! secure container moves its storage between instances. Every allocator
//! used with a secure container implements [`SecureAllocator`], whose
//! associated [`AllocatorKind`] selects the strategy at compile time:
//!
//! - [`Stateless`] allocators can release any allocation made by any other
//!   instance of the same type, so storage is handed over directly.
//! - [`Stateful`] allocators are compared with
//!   [`SecureAllocator::is_interchangeable`]. When two instances do not
//!   share an arena, the receiver copies the contents into its own storage
//!   and the donor's storage is wiped and released through the donor's
//!   allocator.

use core::alloc::Layout;
#[cfg(not(feature = "allocator-api2"))]
use core::fmt;
#[cfg(not(feature = "allocator-api2"))]
use core::ptr;
use core::ptr::NonNull;

#[cfg(all(feature = "alloc", not(feature = "allocator-api2")))]
use core::mem::transmute;

#[cfg(all(feature = "alloc", not(feature = "allocator-api2")))]
use alloc_crate::alloc::{
    alloc as raw_alloc, alloc_zeroed as raw_alloc_zeroed, dealloc as raw_dealloc,
};

#[cfg(all(feature = "alloc", feature = "allocator-api2"))]
pub use allocator_api2::alloc::Global;
#[cfg(feature = "allocator-api2")]
pub use allocator_api2::alloc::{AllocError, Allocator};

#[cfg(all(not(test), feature = "alloc"))]
pub use alloc_crate::alloc::handle_alloc_error;

#[cfg(any(test, not(feature = "alloc")))]
/// Custom allocation error handler.
pub fn handle_alloc_error(layout: Layout) -> ! {
    panic!("memory allocation of {} bytes failed", layout.size());
}

#[cfg(all(feature = "alloc", not(feature = "allocator-api2")))]
#[inline]
pub(crate) fn layout_dangling(layout: Layout) -> NonNull<u8> {
    // FIXME: use Layout::dangling when stabilized
    // SAFETY: layout alignments are guaranteed to be non-zero.
    #[allow(clippy::useless_transmute)]
    unsafe {
        NonNull::new_unchecked(transmute(layout.align()))
    }
}

/// The AllocError error indicates an allocation failure that may be due to
/// resource exhaustion or to something wrong when combining the given input
/// arguments with this allocator.
#[cfg(not(feature = "allocator-api2"))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AllocError;

#[cfg(not(feature = "allocator-api2"))]
impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory allocation failed")
    }
}

#[cfg(all(feature = "std", not(feature = "allocator-api2")))]
impl std::error::Error for AllocError {}

/// An implementation of Allocator can allocate and deallocate arbitrary
/// blocks of data described via `Layout`.
///
/// Secure containers never resize an allocation in place: a resize always
/// produces a fresh zeroed block so that the previous block can be wiped
/// before it is released. Only `allocate`, `allocate_zeroed` and
/// `deallocate` are therefore required.
///
/// # Safety
/// - Memory blocks returned from an allocator must point to valid memory and retain
///   their validity until the instance and all of its clones are dropped,
/// - Cloning or moving the allocator must not invalidate memory blocks returned from
///   this allocator. A cloned allocator must behave like the same allocator, and
/// - Any pointer to a memory block which is currently allocated may be passed to any
///   other method of the allocator.
#[cfg(not(feature = "allocator-api2"))]
pub unsafe trait Allocator {
    /// Try to allocate a slice of memory within this allocator instance,
    /// returning the new allocation.
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError>;

    /// Release an allocation produced by this allocator.
    ///
    /// # Safety
    /// The value `ptr` must represent an allocation produced by this allocator, otherwise
    /// a memory access error may occur. The value `layout` must correspond to the
    /// layout used for the allocation.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Try to allocate a slice of memory within this allocator instance,
    /// returning the new allocation. The memory will be initialized with zeroes.
    #[inline]
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = self.allocate(layout)?;
        // SAFETY: the result of `allocate` must be properly aligned
        unsafe { ptr::write_bytes(ptr.cast::<u8>().as_ptr(), 0, ptr.len()) };
        Ok(ptr)
    }

    /// Obtain a reference to this allocator type.
    #[inline(always)]
    fn by_ref(&self) -> &Self
    where
        Self: Sized,
    {
        self
    }
}

/// A trait implemented by allocators supporting a constant initializer.
/// This cannot use ConstDefault as it is not implemented for the external
/// `Global` allocator.
pub trait AllocatorDefault: Allocator + Clone + Default {
    /// The constant initializer for this allocator.
    const DEFAULT: Self;
}

mod sealed {
    pub trait Sealed {}
}

/// The strategy used when storage changes hands between two containers.
pub trait AllocatorKind: sealed::Sealed {
    /// Whether every instance of the allocator type may release memory
    /// obtained from any other instance.
    const STATELESS: bool;

    /// Determine whether storage allocated by `donor` may be adopted by a
    /// container which releases through `receiver`.
    #[inline]
    fn can_transfer<A: SecureAllocator>(receiver: &A, donor: &A) -> bool {
        Self::STATELESS || receiver.is_interchangeable(donor)
    }
}

/// Tag for allocators without per-instance state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stateless {}

impl sealed::Sealed for Stateless {}

impl AllocatorKind for Stateless {
    const STATELESS: bool = true;
}

/// Tag for allocators whose instances may own distinct arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stateful {}

impl sealed::Sealed for Stateful {}

impl AllocatorKind for Stateful {
    const STATELESS: bool = false;
}

/// An allocator which may back a secure container.
pub trait SecureAllocator: Allocator + Clone {
    /// Either [`Stateless`] or [`Stateful`].
    type Kind: AllocatorKind;

    /// Determine whether memory allocated by `other` may be released through
    /// `self`. Only consulted for [`Stateful`] allocators; the default
    /// treats distinct instances as incompatible.
    #[inline]
    fn is_interchangeable(&self, other: &Self) -> bool {
        let _ = other;
        <Self::Kind as AllocatorKind>::STATELESS
    }
}

/// The global memory allocator.
///
/// When the `alloc` feature is enabled, this type implements the `Allocator`
/// trait by forwarding calls to the allocator registered with the
/// `#[global_allocator]` attribute if there is one, or the `std` crate's default.
#[cfg(any(not(feature = "alloc"), not(feature = "allocator-api2")))]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "alloc", derive(Default, Copy))]
pub struct Global;

#[cfg(all(feature = "alloc", not(feature = "allocator-api2")))]
unsafe impl Allocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = if layout.size() == 0 {
            layout_dangling(layout)
        } else {
            let Some(ptr) = NonNull::new(unsafe { raw_alloc(layout) }) else {
                return Err(AllocError);
            };
            ptr
        };
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    #[inline]
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = if layout.size() == 0 {
            layout_dangling(layout)
        } else {
            let Some(ptr) = NonNull::new(unsafe { raw_alloc_zeroed(layout) }) else {
                return Err(AllocError);
            };
            ptr
        };
        Ok(NonNull::slice_from_raw_parts(ptr, layout.size()))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() > 0 {
            raw_dealloc(ptr.as_ptr(), layout);
        }
    }
}

#[cfg(not(feature = "alloc"))]
// Stub implementation to allow Global as the default allocator type
// even when the `alloc` feature is not enabled. Any usage as an allocator
// will result in a panic.
unsafe impl Allocator for Global {
    fn allocate(&self, _layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        unimplemented!();
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        unimplemented!();
    }
}

#[cfg(feature = "alloc")]
impl AllocatorDefault for Global {
    const DEFAULT: Self = Global;
}

impl SecureAllocator for Global {
    type Kind = Stateless;
}
