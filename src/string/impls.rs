use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use crate::alloc::{AllocatorDefault, SecureAllocator};
use crate::error::StorageError;

use super::chars::write_utf8_lossy;
use super::{CharType, SecureString};

impl<T: CharType, A: SecureAllocator> Borrow<[T]> for SecureString<T, A> {
    #[inline]
    fn borrow(&self) -> &[T] {
        self.as_slice()
    }
}

impl<A: SecureAllocator> fmt::Display for SecureString<u8, A> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_utf8_lossy(self.as_slice(), f, false)
    }
}

impl<A: SecureAllocator> fmt::Display for SecureString<char, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.as_slice() {
            fmt::Write::write_char(f, *c)?;
        }
        Ok(())
    }
}

impl<A: SecureAllocator> fmt::Write for SecureString<u8, A> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.try_append(s).map_err(|_| fmt::Error)
    }
}

impl<A: SecureAllocator> fmt::Write for SecureString<char, A> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let len = self.len();
        self.try_insert_iter(len, s.chars()).map_err(|_| fmt::Error)
    }

    #[inline]
    fn write_char(&mut self, c: char) -> fmt::Result {
        self.try_push(c).map_err(|_| fmt::Error)
    }
}

impl<T: CharType, A: SecureAllocator> Extend<T> for SecureString<T, A> {
    #[inline]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let len = self.len();
        self.insert_iter(len, iter)
    }
}

impl<'a, T: CharType, A: SecureAllocator> Extend<&'a T> for SecureString<T, A> {
    #[inline]
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        let len = self.len();
        self.insert_iter(len, iter.into_iter().copied())
    }
}

impl<T: CharType, A: AllocatorDefault + SecureAllocator> FromIterator<T> for SecureString<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut s = Self::new();
        s.extend(iter);
        s
    }
}

impl<T: CharType, A: AllocatorDefault + SecureAllocator> From<&[T]> for SecureString<T, A> {
    #[inline]
    fn from(chars: &[T]) -> Self {
        Self::from_slice(chars)
    }
}

impl<T: CharType, A: AllocatorDefault + SecureAllocator, const N: usize> From<[T; N]>
    for SecureString<T, A>
{
    #[inline]
    fn from(chars: [T; N]) -> Self {
        Self::from_slice(&chars)
    }
}

impl<A: AllocatorDefault + SecureAllocator> From<&str> for SecureString<u8, A> {
    #[inline]
    fn from(s: &str) -> Self {
        Self::from_slice(s.as_bytes())
    }
}

impl<A: AllocatorDefault + SecureAllocator> FromStr for SecureString<u8, A> {
    type Err = StorageError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_slice(s.as_bytes())
    }
}

impl<T, A, B> PartialEq<SecureString<T, B>> for SecureString<T, A>
where
    T: CharType,
    A: SecureAllocator,
    B: SecureAllocator,
{
    #[inline]
    fn eq(&self, other: &SecureString<T, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: CharType, A: SecureAllocator> Eq for SecureString<T, A> {}

impl<T: CharType, A: SecureAllocator> PartialEq<[T]> for SecureString<T, A> {
    #[inline]
    fn eq(&self, other: &[T]) -> bool {
        self.as_slice() == other
    }
}

impl<T: CharType, A: SecureAllocator> PartialEq<&[T]> for SecureString<T, A> {
    #[inline]
    fn eq(&self, other: &&[T]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: CharType, A: SecureAllocator, const N: usize> PartialEq<[T; N]> for SecureString<T, A> {
    #[inline]
    fn eq(&self, other: &[T; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: CharType, A: SecureAllocator, const N: usize> PartialEq<&[T; N]> for SecureString<T, A> {
    #[inline]
    fn eq(&self, other: &&[T; N]) -> bool {
        self.as_slice() == *other
    }
}

impl<A: SecureAllocator> PartialEq<str> for SecureString<u8, A> {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_slice() == other.as_bytes()
    }
}

impl<A: SecureAllocator> PartialEq<&str> for SecureString<u8, A> {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.as_slice() == other.as_bytes()
    }
}

impl<A: SecureAllocator> PartialEq<SecureString<u8, A>> for str {
    #[inline]
    fn eq(&self, other: &SecureString<u8, A>) -> bool {
        self.as_bytes() == other.as_slice()
    }
}

impl<A: SecureAllocator> PartialEq<SecureString<u8, A>> for &str {
    #[inline]
    fn eq(&self, other: &SecureString<u8, A>) -> bool {
        self.as_bytes() == other.as_slice()
    }
}

impl<T, A, B> PartialOrd<SecureString<T, B>> for SecureString<T, A>
where
    T: CharType,
    A: SecureAllocator,
    B: SecureAllocator,
{
    #[inline]
    fn partial_cmp(&self, other: &SecureString<T, B>) -> Option<Ordering> {
        Some(self.as_slice().cmp(other.as_slice()))
    }
}

impl<T: CharType, A: SecureAllocator> Ord for SecureString<T, A> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<A: SecureAllocator> PartialOrd<str> for SecureString<u8, A> {
    #[inline]
    fn partial_cmp(&self, other: &str) -> Option<Ordering> {
        Some(self.as_slice().cmp(other.as_bytes()))
    }
}
