use std::mem;

/// Alignment of every header and payload offset in the heap.
///
/// This is the most restrictive scalar alignment the allocator promises:
/// whichever of `f64` and `usize` is stricter on the target.
pub const ALIGNMENT: usize = if mem::align_of::<f64>() > mem::align_of::<usize>() {
  mem::align_of::<f64>()
} else {
  mem::align_of::<usize>()
};

/// Rounds the given byte count up to the next multiple of [`ALIGNMENT`].
///
/// Usable in const context. The caller must make sure `$value` cannot
/// overflow when padded; see [`checked_align`] for untrusted sizes.
///
/// # Examples
///
/// ```rust
/// use firstfit::align;
/// use firstfit::align::ALIGNMENT;
///
/// match ALIGNMENT {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Same as [`align!`], but returns `None` instead of wrapping around.
pub fn checked_align(value: usize) -> Option<usize> {
  value
    .checked_add(ALIGNMENT - 1)
    .map(|padded| padded & !(ALIGNMENT - 1))
}
