#![allow(dead_code)]

use core::alloc::Layout;
use core::cell::{Cell, RefCell};
use core::ptr::NonNull;
use core::slice;
use std::rc::Rc;

use secure_buffer::alloc::{
    AllocError, Allocator, AllocatorDefault, Global, SecureAllocator, Stateful, Stateless,
};

/// A record of the blocks handed back to an allocator.
#[derive(Debug, Default)]
pub struct AllocLog {
    released: RefCell<Vec<Vec<u8>>>,
    limit: Cell<Option<usize>>,
    live: Cell<usize>,
}

impl AllocLog {
    fn check_limit(&self, layout: Layout) -> Result<(), AllocError> {
        match self.limit.get() {
            Some(limit) if layout.size() > limit => Err(AllocError),
            _ => Ok(()),
        }
    }

    fn allocated(&self) {
        self.live.set(self.live.get() + 1);
    }

    unsafe fn record(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() > 0 {
            let copy = Vec::from(slice::from_raw_parts(ptr.as_ptr(), layout.size()));
            self.released.borrow_mut().push(copy);
        }
        self.live.set(self.live.get() - 1);
    }
}

/// A stateful allocator which copies every block it releases into a log.
/// Two instances are interchangeable only when they share the same log.
#[derive(Debug, Clone, Default)]
pub struct TestAlloc {
    log: Rc<AllocLog>,
}

impl TestAlloc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any allocation larger than `bytes`.
    pub fn with_limit(bytes: usize) -> Self {
        let alloc = Self::new();
        alloc.set_limit(Some(bytes));
        alloc
    }

    pub fn set_limit(&self, bytes: Option<usize>) {
        self.log.limit.set(bytes);
    }

    /// The number of allocations not yet released.
    pub fn live(&self) -> usize {
        self.log.live.get()
    }

    pub fn released(&self) -> Vec<Vec<u8>> {
        self.log.released.borrow().clone()
    }

    pub fn take_released(&self) -> Vec<Vec<u8>> {
        self.log.released.take()
    }
}

unsafe impl Allocator for TestAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.log.check_limit(layout)?;
        let ptr = Global.allocate(layout)?;
        self.log.allocated();
        Ok(ptr)
    }

    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.log.check_limit(layout)?;
        let ptr = Global.allocate_zeroed(layout)?;
        self.log.allocated();
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.log.record(ptr, layout);
        Global.deallocate(ptr, layout)
    }
}

impl SecureAllocator for TestAlloc {
    type Kind = Stateful;

    fn is_interchangeable(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.log, &other.log)
    }
}

thread_local! {
    static SHARED_LOG: AllocLog = AllocLog::default();
}

/// A stateless allocator which records released blocks in a per-thread log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SharedAlloc;

impl SharedAlloc {
    pub fn live() -> usize {
        SHARED_LOG.with(|log| log.live.get())
    }

    pub fn take_released() -> Vec<Vec<u8>> {
        SHARED_LOG.with(|log| log.released.take())
    }
}

unsafe impl Allocator for SharedAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = Global.allocate(layout)?;
        SHARED_LOG.with(|log| log.allocated());
        Ok(ptr)
    }

    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let ptr = Global.allocate_zeroed(layout)?;
        SHARED_LOG.with(|log| log.allocated());
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        SHARED_LOG.with(|log| log.record(ptr, layout));
        Global.deallocate(ptr, layout)
    }
}

impl AllocatorDefault for SharedAlloc {
    const DEFAULT: Self = SharedAlloc;
}

impl SecureAllocator for SharedAlloc {
    type Kind = Stateless;
}

pub fn all_zero(block: &[u8]) -> bool {
    block.iter().all(|b| *b == 0)
}
