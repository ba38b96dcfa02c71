//! Character and substring searches.
//!
//! Positions are character offsets. A `pos` beyond the end of the string
//! makes the forward searches fail, while the reverse searches clamp it to
//! the end; [`SecureString::NPOS`] searches the whole string in reverse.

use crate::alloc::SecureAllocator;

use super::{CharType, Pattern, SecureString};

impl<T: CharType, A: SecureAllocator> SecureString<T, A> {
    /// Position value meaning "until the end of the string".
    pub const NPOS: usize = usize::MAX;

    /// Find the first occurrence of `pattern` starting at or after `pos`.
    /// An empty pattern matches at `pos` when `pos <= len()`.
    pub fn find<P: Pattern<T>>(&self, pattern: P, pos: usize) -> Option<usize> {
        let hay = self.as_slice();
        let needle = pattern.as_chars();
        if pos > hay.len() || hay.len() - pos < needle.len() {
            return None;
        }
        if needle.is_empty() {
            return Some(pos);
        }
        hay[pos..]
            .windows(needle.len())
            .position(|window| window == needle)
            .map(|offset| pos + offset)
    }

    /// Find the last occurrence of `pattern` which begins at or before `pos`.
    /// An empty pattern matches at `min(pos, len())`.
    pub fn rfind<P: Pattern<T>>(&self, pattern: P, pos: usize) -> Option<usize> {
        let hay = self.as_slice();
        let needle = pattern.as_chars();
        let end = if pos < hay.len() && needle.len() < hay.len() - pos {
            pos + needle.len()
        } else {
            hay.len()
        };
        if needle.len() > end {
            return None;
        }
        if needle.is_empty() {
            return Some(end);
        }
        hay[..end].windows(needle.len()).rposition(|window| window == needle)
    }

    /// Find the first character at or after `pos` which is contained in `set`.
    pub fn find_first_of<P: Pattern<T>>(&self, set: P, pos: usize) -> Option<usize> {
        let hay = self.as_slice();
        let set = set.as_chars();
        if pos >= hay.len() || set.is_empty() {
            return None;
        }
        hay[pos..]
            .iter()
            .position(|c| set.contains(c))
            .map(|offset| pos + offset)
    }

    /// Find the last character at or before `pos` which is contained in `set`.
    pub fn find_last_of<P: Pattern<T>>(&self, set: P, pos: usize) -> Option<usize> {
        let hay = self.as_slice();
        let set = set.as_chars();
        if set.is_empty() {
            return None;
        }
        let end = reverse_end(hay.len(), pos);
        hay[..end].iter().rposition(|c| set.contains(c))
    }

    /// Find the first character at or after `pos` which is not contained in `set`.
    pub fn find_first_not_of<P: Pattern<T>>(&self, set: P, pos: usize) -> Option<usize> {
        let hay = self.as_slice();
        let set = set.as_chars();
        if pos >= hay.len() {
            return None;
        }
        hay[pos..]
            .iter()
            .position(|c| !set.contains(c))
            .map(|offset| pos + offset)
    }

    /// Find the last character at or before `pos` which is not contained in `set`.
    pub fn find_last_not_of<P: Pattern<T>>(&self, set: P, pos: usize) -> Option<usize> {
        let hay = self.as_slice();
        let set = set.as_chars();
        let end = reverse_end(hay.len(), pos);
        hay[..end].iter().rposition(|c| !set.contains(c))
    }
}

#[inline]
fn reverse_end(len: usize, pos: usize) -> usize {
    if pos < len {
        pos + 1
    } else {
        len
    }
}
