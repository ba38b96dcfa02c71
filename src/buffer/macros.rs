/// Create a [`SecureBuffer`](crate::SecureBuffer) containing the arguments.
///
/// Accepts the same forms as `vec!`, optionally prefixed with
/// `in <allocator>;`.
#[macro_export]
macro_rules! secure_vec {
    (in $alloc:expr $(;)?) => (
        $crate::buffer::SecureBuffer::new_in($alloc)
    );
    (in $alloc:expr; $elem:expr; $n:expr) => (
        $crate::buffer::from_elem_in($elem, $n, $alloc)
    );
    (in $alloc:expr; $($x:expr),+ $(,)?) => (
        $crate::buffer::SecureBuffer::from_slice_in(&[$($x),+], $alloc)
    );
    () => (
        $crate::buffer::SecureBuffer::<_, $crate::alloc::Global>::new()
    );
    ($elem:expr; $n:expr) => (
        $crate::buffer::from_elem($elem, $n)
    );
    ($($x:expr),+ $(,)?) => (
        $crate::buffer::SecureBuffer::<_, $crate::alloc::Global>::from_slice(&[$($x),+])
    );
}
