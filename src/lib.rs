//! Growable arrays and strings which wipe their memory.
//!
//! [`SecureBuffer`] behaves like a `Vec` restricted to plain-data element
//! types, with one additional guarantee: once an element stops being part of
//! the occupied contents, its bytes are overwritten with zeroes before the
//! memory is reused, returned to the allocator, or abandoned. This covers
//! removal, truncation, reallocation, moves between containers, and drop.
//!
//! [`SecureString`] layers a NUL-terminated character string on top of
//! `SecureBuffer`, delegating all wiping to it.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(test)]
#[macro_use]
extern crate std;

#[cfg(feature = "alloc")]
extern crate alloc as alloc_crate;

pub mod alloc;

pub mod buffer;

pub mod capacity;

mod error;

pub mod plain;

pub(crate) mod storage;

pub mod string;

pub use self::{
    buffer::SecureBuffer,
    error::{StorageError, UpdateError},
    plain::Plain,
    string::SecureString,
};

#[cfg(all(doctest, feature = "alloc"))]
#[doc = include_str!("../README.md")]
struct _ReadmeDoctests;
