#![cfg(feature = "alloc")]

use rand::{rngs::StdRng, Rng, SeedableRng};
use zeroize::Zeroize;

use secure_buffer::{buffer::from_elem_in, SecureBuffer, SecureString, StorageError};

mod common;

use common::{all_zero, SharedAlloc, TestAlloc};

#[test]
fn test_alloc_log() {
    // check functioning of alloc log
    let alloc = TestAlloc::new();
    let buf = SecureBuffer::from_slice_in(&99u32.to_ne_bytes(), alloc.clone());
    assert_eq!(alloc.live(), 1);
    drop(buf);
    assert_eq!(alloc.live(), 0);
    assert_eq!(alloc.released(), &[[0u8; 4]]);
}

#[test]
fn buffer_drop_wipes_capacity() {
    let alloc = TestAlloc::new();
    let mut buf = SecureBuffer::with_capacity_in(16, alloc.clone());
    buf.extend_from_slice(b"top secret");
    drop(buf);
    let released = alloc.released();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].len(), 16);
    assert!(all_zero(&released[0]));
}

#[test]
fn pop_wipes_slot() {
    let mut buf = SecureBuffer::<u8>::from_slice(b"abc");
    assert_eq!(buf.pop(), Some(b'c'));
    assert_eq!(unsafe { *buf.as_ptr().add(2) }, 0);
    assert!(buf.invariants());
}

#[test]
fn removal_wipes_tail() {
    let mut buf = SecureBuffer::<u32>::from_slice(&[u32::MAX; 12]);
    buf.remove(3);
    assert!(buf.invariants());
    buf.swap_remove(0);
    assert!(buf.invariants());
    buf.remove_range(2..6);
    assert!(buf.invariants());
    buf.retain(|v| *v != u32::MAX);
    assert!(buf.is_empty());
    assert!(buf.invariants());
    let ptr = buf.as_ptr();
    for index in 0..buf.capacity() {
        assert_eq!(unsafe { *ptr.add(index) }, 0);
    }
}

#[test]
fn relocation_wipes_previous_block() {
    let alloc = TestAlloc::new();
    let mut buf = from_elem_in(0xffu8, 100, alloc.clone());
    assert_eq!(buf.capacity(), 100);
    buf.push(0xff);
    assert_eq!(buf.capacity(), 200);
    let released = alloc.take_released();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].len(), 100);
    assert!(all_zero(&released[0]));

    buf.shrink_to_fit();
    assert_eq!(buf.capacity(), 101);
    let released = alloc.take_released();
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].len(), 200);
    assert!(all_zero(&released[0]));
    assert_eq!(buf.as_slice(), &[0xff; 101]);
    assert_eq!(alloc.live(), 1);
}

#[test]
fn assign_into_larger_block() {
    let alloc = TestAlloc::new();
    let mut buf = SecureBuffer::from_slice_in(b"old", alloc.clone());
    buf.assign_from_slice(b"a much longer replacement");
    let released = alloc.released();
    assert_eq!(released, &[vec![0u8; 3]]);
    assert_eq!(buf, b"a much longer replacement");
}

#[test]
fn failed_growth_leaves_buffer_intact() {
    let alloc = TestAlloc::with_limit(8);
    let mut buf = SecureBuffer::from_slice_in(b"12345678", alloc.clone());
    assert!(matches!(
        buf.try_extend_from_slice(b"9"),
        Err(StorageError::AllocError(_))
    ));
    assert_eq!(buf, b"12345678");
    assert!(buf.try_insert_iter(2, b"xyz".iter().copied()).is_err());
    assert_eq!(buf, b"12345678");
    assert!(buf.try_assign_from_slice(b"123456789").is_err());
    assert_eq!(buf, b"12345678");
    assert!(alloc.released().is_empty());
    assert_eq!(alloc.live(), 1);
    assert!(buf.invariants());
}

#[test]
fn failed_assign_iter_keeps_contents() {
    let alloc = TestAlloc::with_limit(8);
    let mut buf = SecureBuffer::from_slice_in(b"secret!!", alloc.clone());
    assert!(matches!(
        buf.try_assign_iter(b"a longer replacement".iter().copied()),
        Err(StorageError::AllocError(_))
    ));
    assert_eq!(buf, b"secret!!");
    assert_eq!(buf.capacity(), 8);
    assert!(buf.invariants());
    assert!(alloc.released().is_empty());

    alloc.set_limit(None);
    buf.assign_iter(b"new".iter().copied());
    assert_eq!(buf, b"new");
    assert!(buf.invariants());
    assert!(alloc.released().iter().all(|block| all_zero(block)));
}

#[test]
fn failed_extend_keeps_capacity() {
    let alloc = TestAlloc::with_limit(32);
    let mut buf = SecureBuffer::from_slice_in(b"abcd", alloc.clone());
    // no useful size hint, so growth happens in several steps
    assert!(matches!(
        buf.try_insert_iter(1, (0..100u8).filter(|_| true)),
        Err(StorageError::AllocError(_))
    ));
    assert_eq!(buf, b"abcd");
    assert_eq!(buf.capacity(), 4);
    assert!(buf.invariants());
    assert!(buf.try_extend((0..100u8).filter(|_| true)).is_err());
    assert_eq!(buf, b"abcd");
    assert_eq!(buf.capacity(), 4);
    assert_eq!(alloc.live(), 1);
    assert!(alloc.released().iter().all(|block| all_zero(block)));

    buf.insert_iter(1, (0..3u8).filter(|_| true));
    assert_eq!(buf, b"a\x00\x01\x02bcd");
    assert!(buf.invariants());
}

#[test]
fn failed_string_updates_leave_string_intact() {
    let alloc = TestAlloc::with_limit(8);
    let mut s = SecureString::<u8, _>::from_slice_in(b"secret", alloc.clone());
    let capacity = s.capacity();
    let unchanged = |s: &SecureString<u8, TestAlloc>| {
        assert_eq!(*s, "secret");
        assert_eq!(s.len(), 6);
        assert_eq!(s.capacity(), capacity);
        assert!(s.invariants());
    };

    assert!(matches!(
        s.try_append("-extended"),
        Err(StorageError::AllocError(_))
    ));
    unchanged(&s);
    assert!(s.try_insert_chars(0, "prefix-").is_err());
    unchanged(&s);
    assert!(s.try_resize(20, b'x').is_err());
    unchanged(&s);
    assert!(s.try_assign("a much longer secret").is_err());
    unchanged(&s);
    assert!(s.try_insert_iter(3, b"inserted".iter().copied().filter(|_| true)).is_err());
    unchanged(&s);
    assert!(s.try_assign_iter(b"0123456789".iter().copied()).is_err());
    unchanged(&s);
    assert!(alloc.released().is_empty());
    assert_eq!(alloc.live(), 1);

    // the donor lives in another arena, so its contents must be copied
    let other = TestAlloc::new();
    let mut donor = SecureString::<u8, _>::from_slice_in(b"a donor string", other.clone());
    assert!(s.try_replace_from(&mut donor).is_err());
    unchanged(&s);
    assert_eq!(donor, "a donor string");
    assert!(donor.invariants());
    assert!(alloc.released().is_empty());
    assert_eq!(other.live(), 1);

    let small = TestAlloc::with_limit(4);
    assert!(s.try_take_in(small.clone()).is_err());
    unchanged(&s);
    assert_eq!(small.live(), 0);
    assert!(small.released().is_empty());
    assert!(alloc.released().iter().all(|block| all_zero(block)));
    assert_eq!(alloc.live(), 1);
}

#[test]
fn stateful_take_between_arenas() {
    let first = TestAlloc::new();
    let second = TestAlloc::new();
    let mut buf = SecureBuffer::from_slice_in(b"moving", first.clone());

    // same arena: storage is handed over
    let moved = buf.take_in(first.clone());
    assert!(first.released().is_empty());
    assert_eq!(buf.capacity(), 0);
    assert_eq!(moved, b"moving");

    // different arena: copied, then wiped and released by the donor arena
    let mut moved = moved;
    let copied = moved.take_in(second.clone());
    assert_eq!(copied, b"moving");
    assert_eq!(first.released(), &[vec![0u8; 6]]);
    assert_eq!(first.live(), 0);
    assert_eq!(second.live(), 1);
    assert!(moved.is_empty());
}

#[test]
fn stateful_replace_from_other_arena() {
    let first = TestAlloc::new();
    let second = TestAlloc::new();
    let mut receiver = SecureBuffer::from_slice_in(b"receiver data", first.clone());
    let mut donor = SecureBuffer::from_slice_in(b"donor", second.clone());
    receiver.replace_from(&mut donor);
    assert_eq!(receiver, b"donor");
    assert!(receiver.invariants());
    assert!(donor.is_empty());
    assert_eq!(donor.capacity(), 0);
    assert_eq!(second.released(), &[vec![0u8; 5]]);
    assert!(first.released().is_empty());
}

#[test]
fn stateful_replace_from_same_arena() {
    let alloc = TestAlloc::new();
    let mut receiver = SecureBuffer::from_slice_in(b"receiver", alloc.clone());
    let mut donor = SecureBuffer::from_slice_in(b"donor", alloc.clone());
    receiver.replace_from(&mut donor);
    assert_eq!(receiver, b"donor");
    assert_eq!(receiver.capacity(), 5);
    // only the receiver's previous block is released
    assert_eq!(alloc.released(), &[vec![0u8; 8]]);
    assert_eq!(alloc.live(), 1);
}

#[test]
fn stateless_transfer() {
    let mut buf = SecureBuffer::<u8, SharedAlloc>::from_slice(b"shared");
    let moved = buf.take_in(SharedAlloc);
    assert!(SharedAlloc::take_released().is_empty());
    assert_eq!(SharedAlloc::live(), 1);
    let mut receiver = SecureBuffer::<u8, SharedAlloc>::from_slice(b"prior");
    let mut moved = moved;
    receiver.replace_from(&mut moved);
    assert_eq!(receiver, b"shared");
    assert_eq!(SharedAlloc::take_released(), &[vec![0u8; 5]]);
    drop(receiver);
    assert_eq!(SharedAlloc::take_released(), &[vec![0u8; 6]]);
    assert_eq!(SharedAlloc::live(), 0);
}

#[test]
fn into_iter_wipes_on_drop() {
    let alloc = TestAlloc::new();
    let buf = SecureBuffer::from_slice_in(&[7u16, 8, 9], alloc.clone());
    let mut iter = buf.into_iter();
    assert_eq!(iter.next(), Some(7));
    drop(iter);
    assert_eq!(alloc.released(), &[vec![0u8; 6]]);
}

#[test]
fn zeroize_releases() {
    let alloc = TestAlloc::new();
    let mut buf = SecureBuffer::from_slice_in(b"key material", alloc.clone());
    buf.zeroize();
    assert_eq!(buf.capacity(), 0);
    assert!(buf.is_empty());
    assert_eq!(alloc.released(), &[vec![0u8; 12]]);
}

#[test]
fn string_drop_wipes_terminator() {
    let alloc = TestAlloc::new();
    let mut s = SecureString::<u8, _>::new_in(alloc.clone());
    s.append("password");
    s.erase(0, 4);
    assert!(s.invariants());
    let capacity = s.capacity();
    drop(s);
    let released = alloc.released();
    assert_eq!(released.last().map(Vec::len), Some(capacity + 1));
    assert!(released.iter().all(|block| all_zero(block)));
}

#[test]
fn string_take_between_arenas() {
    let first = TestAlloc::new();
    let second = TestAlloc::new();
    let mut s = SecureString::<u8, _>::from_slice_in(b"token", first.clone());
    let moved = s.take_in(second.clone());
    assert_eq!(moved, "token");
    assert!(s.is_empty() && s.invariants());
    assert_eq!(first.released(), &[vec![0u8; 6]]);
    assert_eq!(moved.allocator().live(), 1);
}

#[test]
fn random_buffer_operations() {
    let mut rng = StdRng::seed_from_u64(0x5ec_b0ff);
    let alloc = TestAlloc::new();
    let mut buf = SecureBuffer::new_in(alloc.clone());
    let mut model: Vec<u8> = Vec::new();

    for _ in 0..2000 {
        match rng.gen_range(0..9) {
            0 | 1 => {
                let value = rng.gen_range(1..=255u8);
                buf.push(value);
                model.push(value);
            }
            2 => {
                assert_eq!(buf.pop(), model.pop());
            }
            3 => {
                let index = rng.gen_range(0..=model.len());
                let count = rng.gen_range(0..8);
                buf.insert_elem(index, count, 0xaa);
                model.splice(index..index, core::iter::repeat(0xaa).take(count));
            }
            4 if !model.is_empty() => {
                let index = rng.gen_range(0..model.len());
                assert_eq!(buf.remove(index), model.remove(index));
            }
            5 => {
                let start = rng.gen_range(0..=model.len());
                let end = rng.gen_range(start..=model.len());
                buf.remove_range(start..end);
                model.drain(start..end);
            }
            6 => {
                let len = rng.gen_range(0..=model.len() + 4);
                buf.resize(len, 0x55);
                model.resize(len, 0x55);
            }
            7 => {
                buf.shrink_to_fit();
            }
            8 => {
                let index = rng.gen_range(0..=model.len());
                let data: Vec<u8> = (0..rng.gen_range(0..5)).map(|_| rng.gen()).collect();
                buf.insert_slice(index, &data);
                model.splice(index..index, data);
            }
            _ => {
                buf.truncate(model.len() / 2);
                model.truncate(model.len() / 2);
            }
        }
        assert_eq!(buf.as_slice(), model.as_slice());
        assert!(buf.invariants());
    }

    drop(buf);
    assert_eq!(alloc.live(), 0);
    assert!(alloc.released().iter().all(|block| all_zero(block)));
}

#[test]
fn random_string_operations() {
    let mut rng = StdRng::seed_from_u64(42);
    let alloc = TestAlloc::new();
    let mut s = SecureString::<u8, _>::new_in(alloc.clone());
    let mut model: Vec<u8> = Vec::new();

    for _ in 0..1000 {
        match rng.gen_range(0..5) {
            0 => {
                let c = rng.gen_range(b'a'..=b'z');
                s.push(c);
                model.push(c);
            }
            1 => {
                let index = rng.gen_range(0..=model.len());
                s.insert_chars(index, "xyz");
                model.splice(index..index, b"xyz".iter().copied());
            }
            2 => {
                let index = rng.gen_range(0..=model.len());
                let count = rng.gen_range(0..6);
                s.erase(index, count);
                let end = model.len().min(index + count);
                model.drain(index..end);
            }
            3 => {
                let pos = rng.gen_range(0..=model.len());
                let sub = s.substr(pos, 3);
                s.append(&sub);
                let end = model.len().min(pos + 3);
                model.extend_from_within(pos..end);
            }
            _ => {
                s.assign_substr("abcdefgh", rng.gen_range(0..=8), rng.gen_range(0..8));
                s.truncate(s.len().min(model.len()));
                model.clear();
                model.extend_from_slice(s.as_slice());
            }
        }
        assert_eq!(s.as_slice(), model.as_slice());
        assert!(s.invariants());
    }

    drop(s);
    assert_eq!(alloc.live(), 0);
    assert!(alloc.released().iter().all(|block| all_zero(block)));
}
