use std::mem;

use crate::align;

const WORD: usize = mem::size_of::<usize>();

/// Bytes reserved in front of every payload: `size` and `next`, padded to
/// [`ALIGNMENT`](crate::align::ALIGNMENT).
pub const HEADER_SIZE: usize = align!(2 * WORD);

/// On-heap encoding of "no successor".
const NIL: usize = usize::MAX;

/// Block metadata as stored at the front of every block.
///
/// `next` is the header offset of the following free block and only means
/// something while the block sits in the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  pub size: usize,
  pub next: Option<usize>,
}

impl Header {
  pub fn new(
    size: usize,
    next: Option<usize>,
  ) -> Self {
    Self { size, next }
  }

  pub fn read(
    heap: &[u8],
    at: usize,
  ) -> Self {
    let size = read_word(heap, at);
    let next = match read_word(heap, at + WORD) {
      NIL => None,
      offset => Some(offset),
    };

    Self { size, next }
  }

  pub fn write(
    self,
    heap: &mut [u8],
    at: usize,
  ) {
    write_word(heap, at, self.size);
    write_word(heap, at + WORD, self.next.unwrap_or(NIL));
  }
}

/// Rewrites only the `next` field of the header at `at`.
pub fn set_next(
  heap: &mut [u8],
  at: usize,
  next: Option<usize>,
) {
  write_word(heap, at + WORD, next.unwrap_or(NIL));
}

/// Payload offset of the block whose header starts at `header`.
pub fn payload_of(header: usize) -> usize {
  header + HEADER_SIZE
}

/// Header offset of the block whose payload starts at `payload`.
pub fn header_of(payload: usize) -> usize {
  debug_assert!(payload >= HEADER_SIZE, "payload offset {payload} precedes the heap");
  debug_assert!(
    payload % crate::align::ALIGNMENT == 0,
    "payload offset {payload} is misaligned"
  );
  payload - HEADER_SIZE
}

/// First byte past the payload of the block at `header`.
pub fn end_of(
  header: usize,
  size: usize,
) -> usize {
  header + HEADER_SIZE + size
}

fn read_word(
  heap: &[u8],
  at: usize,
) -> usize {
  let mut word = [0u8; WORD];
  word.copy_from_slice(&heap[at..at + WORD]);
  usize::from_ne_bytes(word)
}

fn write_word(
  heap: &mut [u8],
  at: usize,
  value: usize,
) {
  heap[at..at + WORD].copy_from_slice(&value.to_ne_bytes());
}
