//! Backing storage for secure collections.

mod alloc;

pub(crate) mod utils;

pub(crate) use self::alloc::WipingBuffer;
