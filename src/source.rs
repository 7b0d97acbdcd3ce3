//! Where heap memory comes from.
//!
//! A [`HeapSource`] owns one contiguous region that only ever grows at its
//! end, exactly like the program break. The heap addresses that region by
//! offset, so the same allocator logic runs on top of `sbrk(2)` or on top of
//! an owned buffer.

use std::{ptr, slice};

use libc::{c_void, intptr_t, sbrk};
use log::warn;

use crate::{align::ALIGNMENT, error::AllocError};

/// A monotonically growing, contiguous byte region.
pub trait HeapSource {
  /// Extends the region by `increment` bytes and returns the offset of the
  /// first new byte. On failure nothing changes.
  fn grow(
    &mut self,
    increment: usize,
  ) -> Result<usize, AllocError>;

  /// Current extent of the region in bytes.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The whole region. Its first byte is aligned to [`ALIGNMENT`].
  fn bytes(&self) -> &[u8];

  fn bytes_mut(&mut self) -> &mut [u8];
}

/// Grows the real program break with `sbrk(2)`.
///
/// The region starts at the first break observed (rounded up to
/// [`ALIGNMENT`]). If anyone else moves the break in between two growths the
/// region would no longer be contiguous, so that growth is refused.
pub struct SbrkSource {
  base: *mut u8,
  len: usize,
}

impl SbrkSource {
  pub fn new() -> Self {
    Self {
      base: ptr::null_mut(),
      len: 0,
    }
  }

  /// Current program break, as reported by `sbrk(0)`.
  pub fn program_break() -> *mut u8 {
    // SAFETY: `sbrk(0)` only queries the break.
    unsafe { sbrk(0) as *mut u8 }
  }

  fn extend(increment: usize) -> Result<*mut u8, AllocError> {
    let refused = AllocError::OutOfMemory {
      requested: increment,
    };
    let delta = intptr_t::try_from(increment).map_err(|_| refused)?;

    // SAFETY: the bytes between the old and the new break are handed to us
    // and nobody else; we never shrink the break.
    let previous = unsafe { sbrk(delta) };

    if previous == usize::MAX as *mut c_void {
      warn!("sbrk refused to grow by {increment} bytes");
      return Err(refused);
    }

    Ok(previous as *mut u8)
  }
}

impl Default for SbrkSource {
  fn default() -> Self {
    Self::new()
  }
}

impl HeapSource for SbrkSource {
  fn grow(
    &mut self,
    increment: usize,
  ) -> Result<usize, AllocError> {
    let refused = AllocError::OutOfMemory {
      requested: increment,
    };

    if self.base.is_null() {
      let previous = Self::extend(increment)?;
      let padding = previous.align_offset(ALIGNMENT);

      // The region is shifted up to the first aligned address, so the
      // padding has to be claimed right behind the bytes just obtained.
      if padding != 0 {
        let tail = Self::extend(padding)?;

        if tail != previous.wrapping_add(increment) {
          warn!("program break moved while aligning the heap, refusing to grow");
          return Err(refused);
        }
      }

      self.base = previous.wrapping_add(padding);
      self.len = increment;

      return Ok(0);
    }

    let end = self.base.wrapping_add(self.len);

    if Self::program_break() != end {
      warn!("program break moved outside of the heap, refusing to grow");
      return Err(refused);
    }

    // Someone may still move the break between the check above and this
    // call; only the address sbrk hands back is authoritative.
    let previous = Self::extend(increment)?;

    if previous != end {
      warn!("program break moved outside of the heap, refusing to grow");
      return Err(refused);
    }

    let offset = self.len;
    self.len += increment;

    Ok(offset)
  }

  fn len(&self) -> usize {
    self.len
  }

  fn bytes(&self) -> &[u8] {
    if self.base.is_null() {
      return &[];
    }

    // SAFETY: `base..base + len` was obtained from sbrk and is never released.
    unsafe { slice::from_raw_parts(self.base, self.len) }
  }

  fn bytes_mut(&mut self) -> &mut [u8] {
    if self.base.is_null() {
      return &mut [];
    }

    // SAFETY: as in `bytes`, and `&mut self` makes the view exclusive.
    unsafe { slice::from_raw_parts_mut(self.base, self.len) }
  }
}

/// An owned buffer standing in for the program break.
///
/// The backing memory is reserved once, so payload addresses never move;
/// growing past `capacity` fails the same way a refused `sbrk` does.
pub struct ArenaSource {
  buf: Vec<u8>,
  start: usize,
  capacity: usize,
  brk: usize,
}

impl ArenaSource {
  pub fn with_capacity(capacity: usize) -> Self {
    let buf = vec![0u8; capacity + ALIGNMENT];
    let start = match buf.as_ptr().align_offset(ALIGNMENT) {
      offset if offset < ALIGNMENT => offset,
      _ => 0,
    };

    Self {
      buf,
      start,
      capacity,
      brk: 0,
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }
}

impl HeapSource for ArenaSource {
  fn grow(
    &mut self,
    increment: usize,
  ) -> Result<usize, AllocError> {
    if increment > self.capacity - self.brk {
      warn!(
        "arena exhausted: {} of {} bytes in use, {increment} requested",
        self.brk, self.capacity
      );
      return Err(AllocError::OutOfMemory {
        requested: increment,
      });
    }

    let offset = self.brk;
    self.brk += increment;

    Ok(offset)
  }

  fn len(&self) -> usize {
    self.brk
  }

  fn bytes(&self) -> &[u8] {
    &self.buf[self.start..self.start + self.brk]
  }

  fn bytes_mut(&mut self) -> &mut [u8] {
    &mut self.buf[self.start..self.start + self.brk]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_arena_grows_contiguously() {
    let mut arena = ArenaSource::with_capacity(4096);

    assert!(arena.is_empty());
    assert_eq!(arena.grow(1040), Ok(0));
    assert_eq!(arena.grow(1040), Ok(1040));
    assert_eq!(arena.len(), 2080);
    assert_eq!(arena.bytes().len(), 2080);
    assert_eq!(arena.bytes().as_ptr() as usize % ALIGNMENT, 0);

    arena.bytes_mut()[2079] = 0xAB;
    assert_eq!(arena.bytes()[2079], 0xAB);
  }

  #[test]
  fn test_arena_refusal_leaves_region_untouched() {
    let mut arena = ArenaSource::with_capacity(2048);

    arena.grow(1040).unwrap();

    assert_eq!(
      arena.grow(1040),
      Err(AllocError::OutOfMemory { requested: 1040 })
    );
    assert_eq!(arena.len(), 1040);
    assert_eq!(arena.grow(1008), Ok(1040));
    assert_eq!(arena.len(), arena.capacity());
  }

  // Everything touching the real program break lives in this one test so
  // that no two tests move the break concurrently.
  #[test]
  fn test_sbrk_source_and_heap() {
    let mut source = SbrkSource::new();

    assert!(source.bytes().is_empty());

    if let Ok(offset) = source.grow(256) {
      assert_eq!(offset, 0);
      assert_eq!(source.bytes().as_ptr() as usize % ALIGNMENT, 0);

      source.bytes_mut().fill(0x5A);
      assert!(source.bytes().iter().all(|&b| b == 0x5A));

      // SAFETY: moves the break past the region; the 64 bytes are never used.
      let foreign = unsafe { sbrk(64) };

      if foreign != usize::MAX as *mut c_void {
        assert_eq!(
          source.grow(256),
          Err(AllocError::OutOfMemory { requested: 256 })
        );
        assert_eq!(source.len(), 256);
        assert!(source.bytes().iter().all(|&b| b == 0x5A));
      }
    }

    let mut heap = crate::Heap::sbrk();

    let Ok(ptr) = heap.allocate(100) else {
      return;
    };

    assert_eq!(heap.as_ptr(ptr) as usize % ALIGNMENT, 0);

    heap.bytes_mut(ptr).fill(0x42);
    assert!(heap.bytes(ptr).iter().all(|&byte| byte == 0x42));

    heap.deallocate(Some(ptr));
    assert_eq!(heap.allocate(100).ok(), Some(ptr));
  }
}
