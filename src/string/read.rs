//! Extraction of byte strings from buffered readers.
//!
//! Bytes are appended directly into the secure storage, never into an
//! intermediate `String` or `Vec`.

use std::io::{self, BufRead};

use crate::alloc::SecureAllocator;
use crate::error::StorageError;

use super::SecureString;

fn storage_error(err: StorageError) -> io::Error {
    io::Error::new(io::ErrorKind::OutOfMemory, err)
}

fn fill<R: BufRead + ?Sized>(reader: &mut R) -> io::Result<&[u8]> {
    loop {
        match reader.fill_buf() {
            Ok(buf) => return Ok(buf),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

impl<A: SecureAllocator> SecureString<u8, A> {
    /// Replace the contents with the next whitespace-delimited word from
    /// `reader`. Leading ASCII whitespace is skipped and the delimiter
    /// following the word is left unread.
    ///
    /// Returns the number of bytes stored, which is zero only when the
    /// reader is exhausted before a word begins.
    pub fn read_word<R: BufRead + ?Sized>(&mut self, reader: &mut R) -> io::Result<usize> {
        self.clear();
        loop {
            let buf = fill(reader)?;
            if buf.is_empty() {
                return Ok(0);
            }
            let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
            let found = skip < buf.len();
            reader.consume(skip);
            if found {
                break;
            }
        }
        loop {
            let buf = fill(reader)?;
            if buf.is_empty() {
                break;
            }
            let count = buf.iter().take_while(|b| !b.is_ascii_whitespace()).count();
            self.try_append(&buf[..count]).map_err(storage_error)?;
            let done = count < buf.len();
            reader.consume(count);
            if done {
                break;
            }
        }
        Ok(self.len())
    }

    /// Replace the contents with the next line from `reader`. The line
    /// feed is consumed but not stored.
    ///
    /// Returns the number of bytes consumed including the line feed, which
    /// is zero only at the end of input.
    pub fn read_line<R: BufRead + ?Sized>(&mut self, reader: &mut R) -> io::Result<usize> {
        self.clear();
        let mut consumed = 0;
        loop {
            let buf = fill(reader)?;
            if buf.is_empty() {
                break;
            }
            let (line, used, done) = match buf.iter().position(|b| *b == b'\n') {
                Some(idx) => (&buf[..idx], idx + 1, true),
                None => (buf, buf.len(), false),
            };
            self.try_append(line).map_err(storage_error)?;
            reader.consume(used);
            consumed += used;
            if done {
                break;
            }
        }
        Ok(consumed)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor};

    use crate::string::SecureString;

    type S = SecureString;

    #[test]
    fn words() {
        let mut input = Cursor::new(&b"  alpha\tbeta\n\n gamma"[..]);
        let mut s = S::new();
        assert_eq!(s.read_word(&mut input).expect("read failed"), 5);
        assert_eq!(s, "alpha");
        assert_eq!(s.read_word(&mut input).expect("read failed"), 4);
        assert_eq!(s, "beta");
        assert_eq!(s.read_word(&mut input).expect("read failed"), 5);
        assert_eq!(s, "gamma");
        assert_eq!(s.read_word(&mut input).expect("read failed"), 0);
        assert!(s.is_empty());
        assert!(s.invariants());
    }

    #[test]
    fn words_across_small_reads() {
        let mut input = BufReader::with_capacity(2, &b" secret words"[..]);
        let mut s = S::new();
        s.read_word(&mut input).expect("read failed");
        assert_eq!(s, "secret");
        s.read_word(&mut input).expect("read failed");
        assert_eq!(s, "words");
    }

    #[test]
    fn lines() {
        let mut input = BufReader::with_capacity(3, &b"first line\nsecond\n\nlast"[..]);
        let mut s = S::from("stale");
        assert_eq!(s.read_line(&mut input).expect("read failed"), 11);
        assert_eq!(s, "first line");
        assert_eq!(s.read_line(&mut input).expect("read failed"), 7);
        assert_eq!(s, "second");
        assert_eq!(s.read_line(&mut input).expect("read failed"), 1);
        assert!(s.is_empty());
        assert_eq!(s.read_line(&mut input).expect("read failed"), 4);
        assert_eq!(s, "last");
        assert_eq!(s.read_line(&mut input).expect("read failed"), 0);
        assert!(s.is_empty());
    }
}
