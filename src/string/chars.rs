use core::fmt::{self, Write};
use core::hash::Hash;
use core::slice;

use crate::alloc::SecureAllocator;
use crate::plain::Plain;

use super::SecureString;

/// Character types which may be held in a [`SecureString`].
pub trait CharType: Plain + Ord + Hash + fmt::Debug {
    /// The terminating character.
    const NUL: Self;

    /// Format a run of characters for `Debug` output.
    fn fmt_debug(chars: &[Self], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(chars, f)
    }
}

impl CharType for u8 {
    const NUL: Self = 0;

    fn fmt_debug(chars: &[Self], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        write_utf8_lossy(chars, f, true)?;
        f.write_char('"')
    }
}

impl CharType for u16 {
    const NUL: Self = 0;
}

impl CharType for u32 {
    const NUL: Self = 0;
}

impl CharType for char {
    const NUL: Self = '\0';

    fn fmt_debug(chars: &[Self], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        for c in chars {
            for e in c.escape_debug() {
                f.write_char(e)?;
            }
        }
        f.write_char('"')
    }
}

/// Write `bytes` as UTF-8, substituting the replacement character for
/// invalid sequences.
pub(crate) fn write_utf8_lossy(
    mut bytes: &[u8],
    f: &mut fmt::Formatter<'_>,
    escape: bool,
) -> fmt::Result {
    loop {
        let (valid, rest) = match core::str::from_utf8(bytes) {
            Ok(valid) => (valid, None),
            Err(err) => {
                let (head, tail) = bytes.split_at(err.valid_up_to());
                let skip = err.error_len().unwrap_or(tail.len());
                // SAFETY: `from_utf8` validated the prefix
                let head = unsafe { core::str::from_utf8_unchecked(head) };
                (head, Some(&tail[skip..]))
            }
        };
        if escape {
            write!(f, "{}", valid.escape_debug())?;
        } else {
            f.write_str(valid)?;
        }
        match rest {
            Some(rest) => {
                f.write_char(char::REPLACEMENT_CHARACTER)?;
                bytes = rest;
            }
            None => return Ok(()),
        }
    }
}

/// A run of characters used as an argument to string operations: a single
/// character, a slice or array of characters, a `&str` for byte strings,
/// or another [`SecureString`].
pub trait Pattern<T> {
    /// Access the characters of the pattern.
    fn as_chars(&self) -> &[T];
}

macro_rules! impl_char_pattern {
    ($($ty:ty),+) => {
        $(
            impl Pattern<$ty> for $ty {
                #[inline]
                fn as_chars(&self) -> &[$ty] {
                    slice::from_ref(self)
                }
            }
        )+
    };
}

impl_char_pattern!(u8, u16, u32, char);

impl<T: CharType> Pattern<T> for &[T] {
    #[inline]
    fn as_chars(&self) -> &[T] {
        self
    }
}

impl<T: CharType> Pattern<T> for &mut [T] {
    #[inline]
    fn as_chars(&self) -> &[T] {
        self
    }
}

impl<T: CharType, const N: usize> Pattern<T> for [T; N] {
    #[inline]
    fn as_chars(&self) -> &[T] {
        self
    }
}

impl<T: CharType, const N: usize> Pattern<T> for &[T; N] {
    #[inline]
    fn as_chars(&self) -> &[T] {
        &self[..]
    }
}

impl Pattern<u8> for &str {
    #[inline]
    fn as_chars(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<T: CharType, A: SecureAllocator> Pattern<T> for &SecureString<T, A> {
    #[inline]
    fn as_chars(&self) -> &[T] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lossy<'a>(&'a [u8]);

    impl fmt::Display for Lossy<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write_utf8_lossy(self.0, f, false)
        }
    }

    #[test]
    fn lossy_output() {
        assert_eq!(format!("{}", Lossy(b"abc")), "abc");
        assert_eq!(format!("{}", Lossy(b"ab\xffc")), "ab\u{fffd}c");
        assert_eq!(format!("{}", Lossy(b"\xe2\x82")), "\u{fffd}");
        assert_eq!(format!("{}", Lossy(b"")), "");
    }

    #[test]
    fn patterns() {
        assert_eq!(b'a'.as_chars(), b"a");
        assert_eq!("xy".as_chars(), b"xy");
        assert_eq!(Pattern::<u8>::as_chars(&b"xyz"), b"xyz");
        assert_eq!([1u16, 2].as_chars(), &[1, 2]);
    }
}
