use log::{debug, trace};

use crate::{
  align::checked_align,
  block::{self, HEADER_SIZE, Header},
  config::HeapConfig,
  error::AllocError,
  source::{ArenaSource, HeapSource, SbrkSource},
  stats::{FreeBlockInfo, FreeListDump, HeapStats},
};

/// Handle to an allocated payload: its offset inside the heap region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ptr(usize);

impl Ptr {
  /// Offset of the payload's first byte from the start of the heap.
  pub fn offset(self) -> usize {
    self.0
  }
}

/// First-fit free-list allocator over a single growing region.
///
/// Every block starts with a fixed-size header. Free blocks are threaded into a
/// singly linked list kept in address order, which turns coalescing into a
/// check against the immediate list neighbours.
pub struct Heap<S: HeapSource> {
  source: S,
  config: HeapConfig,
  free_head: Option<usize>,
  stats: HeapStats,
}

impl Heap<ArenaSource> {
  /// A heap backed by an owned buffer of at most `capacity` bytes.
  pub fn with_arena(capacity: usize) -> Self {
    Self::from_parts(ArenaSource::with_capacity(capacity), HeapConfig::default())
  }
}

impl Heap<SbrkSource> {
  /// A heap living on top of the process' program break.
  pub fn sbrk() -> Self {
    Self::from_parts(SbrkSource::new(), HeapConfig::default())
  }
}

impl<S: HeapSource> Heap<S> {
  pub fn new(
    source: S,
    config: HeapConfig,
  ) -> Result<Self, AllocError> {
    Ok(Self::from_parts(source, config.validate()?))
  }

  fn from_parts(
    source: S,
    config: HeapConfig,
  ) -> Self {
    Self {
      source,
      config,
      free_head: None,
      stats: HeapStats::default(),
    }
  }

  pub fn config(&self) -> HeapConfig {
    self.config
  }

  pub fn stats(&self) -> HeapStats {
    self.stats
  }

  /// Bytes obtained from the source so far, headers included.
  pub fn heap_len(&self) -> usize {
    self.source.len()
  }

  /// Payload size recorded for `ptr`; at least what was asked for.
  pub fn usable_size(
    &self,
    ptr: Ptr,
  ) -> usize {
    Header::read(self.source.bytes(), block::header_of(ptr.0)).size
  }

  pub fn bytes(
    &self,
    ptr: Ptr,
  ) -> &[u8] {
    let size = self.usable_size(ptr);
    &self.source.bytes()[ptr.0..ptr.0 + size]
  }

  pub fn bytes_mut(
    &mut self,
    ptr: Ptr,
  ) -> &mut [u8] {
    let size = self.usable_size(ptr);
    &mut self.source.bytes_mut()[ptr.0..ptr.0 + size]
  }

  /// Absolute address of the payload behind `ptr`.
  pub fn as_ptr(
    &mut self,
    ptr: Ptr,
  ) -> *mut u8 {
    self.bytes_mut(ptr).as_mut_ptr()
  }

  /// Walks the free list and reports every node in list order.
  pub fn free_list(&self) -> FreeListDump {
    let heap = self.source.bytes();
    let mut blocks = Vec::new();
    let mut current = self.free_head;

    while let Some(offset) = current {
      let header = Header::read(heap, offset);
      blocks.push(FreeBlockInfo {
        offset,
        size: header.size,
        next: header.next,
      });
      current = header.next;
    }

    FreeListDump { blocks }
  }

  /// Hands out at least `size` bytes, aligned to
  /// [`ALIGNMENT`](crate::align::ALIGNMENT).
  ///
  /// ```text
  ///   free list ──► [A: 24] ──► [B: 908] ──► nil      allocate(100)
  ///                    too small    first fit
  ///
  ///   free list ──► [A: 24] ──► [B': 788] ──► nil     B = [104 used][hdr][788]
  /// ```
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Result<Ptr, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidSize);
    }

    let size = checked_align(size).ok_or(AllocError::OutOfMemory { requested: size })?;
    let growth = self.config.increment.max(size);

    if self.source.is_empty() {
      self.extend_heap(None, growth)?;
    }

    let block = match self.search(size) {
      (Some(block), _) => block,
      (None, last) => self.extend_heap(last, growth)?,
    };

    self.split(block, size);
    self.unlink(block);

    self.stats.allocations += 1;
    trace!("allocate({size}) -> header {block:#x}");

    Ok(Ptr(block::payload_of(block)))
  }

  /// Returns a block to the free list. `None` is a no-op.
  ///
  /// `ptr` must be a live allocation of this heap; double frees and foreign
  /// handles are not detected.
  pub fn deallocate(
    &mut self,
    ptr: Option<Ptr>,
  ) {
    let Some(ptr) = ptr else {
      return;
    };

    let block = block::header_of(ptr.0);
    debug_assert!(
      block::payload_of(block) <= self.source.len(),
      "pointer {:#x} lies outside the heap",
      ptr.0
    );

    self.insert_free(block);

    self.stats.deallocations += 1;
    debug!("deallocate(header {block:#x})");
  }

  /// `calloc`: room for `count` elements of `element_size` bytes, zeroed.
  pub fn allocate_zeroed(
    &mut self,
    count: usize,
    element_size: usize,
  ) -> Result<Ptr, AllocError> {
    if count == 0 || element_size == 0 {
      return Err(AllocError::InvalidSize);
    }

    let total = count
      .checked_mul(element_size)
      .ok_or(AllocError::Overflow {
        count,
        element_size,
      })?;

    let ptr = self.allocate(total)?;
    self.bytes_mut(ptr).fill(0);

    Ok(ptr)
  }

  /// `realloc`.
  ///
  /// - `None` behaves like [`allocate`](Self::allocate).
  /// - `new_size == 0` frees `ptr` and returns `Ok(None)`.
  /// - Shrinking keeps the block in place and releases the surplus if it is
  ///   big enough to stand on its own.
  /// - Growing moves the contents to a fresh block. If that fails, `ptr` is
  ///   left untouched and still owned by the caller.
  pub fn resize(
    &mut self,
    ptr: Option<Ptr>,
    new_size: usize,
  ) -> Result<Option<Ptr>, AllocError> {
    let Some(ptr) = ptr else {
      return self.allocate(new_size).map(Some);
    };

    if new_size == 0 {
      self.deallocate(Some(ptr));
      return Ok(None);
    }

    let block = block::header_of(ptr.0);
    let current = self.usable_size(ptr);
    let wanted = checked_align(new_size).ok_or(AllocError::OutOfMemory {
      requested: new_size,
    })?;

    if current >= wanted {
      if let Some(surplus) = self.split(block, wanted) {
        self.insert_free(surplus);
      }

      return Ok(Some(ptr));
    }

    let moved = self.allocate(new_size)?;
    self
      .source
      .bytes_mut()
      .copy_within(ptr.0..ptr.0 + current, moved.0);
    self.deallocate(Some(ptr));

    trace!("resize: header {block:#x} moved to {:#x}", block::header_of(moved.0));

    Ok(Some(moved))
  }

  /// First fit. Returns the block found, plus the last node visited so a
  /// subsequent growth can be linked behind it.
  fn search(
    &self,
    size: usize,
  ) -> (Option<usize>, Option<usize>) {
    let heap = self.source.bytes();
    let mut last = None;
    let mut current = self.free_head;

    while let Some(offset) = current {
      let header = Header::read(heap, offset);

      if header.size >= size {
        return (Some(offset), last);
      }

      last = Some(offset);
      current = header.next;
    }

    (None, last)
  }

  /// Asks the source for `size + HEADER_SIZE` bytes and appends the new
  /// block to the free list, after `last`.
  fn extend_heap(
    &mut self,
    last: Option<usize>,
    size: usize,
  ) -> Result<usize, AllocError> {
    let span = size
      .checked_add(HEADER_SIZE)
      .ok_or(AllocError::OutOfMemory { requested: size })?;
    let block = self.source.grow(span)?;
    let heap = self.source.bytes_mut();

    Header::new(size, None).write(heap, block);

    match last {
      Some(tail) => block::set_next(heap, tail, Some(block)),
      None => self.free_head = Some(block),
    }

    self.stats.growths += 1;
    debug!(
      "heap grown by {span} bytes: block {block:#x}, heap is now {} bytes",
      self.source.len()
    );

    Ok(block)
  }

  /// Shrinks `block` to `size` and turns the tail into a new block that
  /// takes over `block`'s successor. Returns the new block, or `None` if the
  /// tail would be too small to be useful.
  fn split(
    &mut self,
    block: usize,
    size: usize,
  ) -> Option<usize> {
    let heap = self.source.bytes_mut();
    let header = Header::read(heap, block);

    if header.size - size < HEADER_SIZE + self.config.min_payload {
      return None;
    }

    let rest = block::end_of(block, size);
    let rest_size = header.size - size - HEADER_SIZE;

    Header::new(rest_size, header.next).write(heap, rest);
    Header::new(size, Some(rest)).write(heap, block);

    trace!("split {block:#x}: {size} + {rest_size} at {rest:#x}");

    Some(rest)
  }

  /// Removes `block` from the free list; it must be in it.
  fn unlink(
    &mut self,
    block: usize,
  ) {
    let heap = self.source.bytes_mut();
    let next = Header::read(heap, block).next;

    if self.free_head == Some(block) {
      self.free_head = next;
      return;
    }

    let mut current = self.free_head;
    let mut found = false;

    while let Some(offset) = current {
      let header = Header::read(heap, offset);

      if header.next == Some(block) {
        block::set_next(heap, offset, next);
        found = true;
        break;
      }

      current = header.next;
    }

    debug_assert!(found, "block {block:#x} is not on the free list");
  }

  /// Inserts `block` at its address-ordered position and merges it with
  /// whichever neighbours are physically adjacent.
  fn insert_free(
    &mut self,
    block: usize,
  ) {
    let Some(head) = self.free_head else {
      block::set_next(self.source.bytes_mut(), block, None);
      self.free_head = Some(block);
      return;
    };

    debug_assert_ne!(head, block, "block {block:#x} freed twice");

    if block < head {
      block::set_next(self.source.bytes_mut(), block, Some(head));
      self.free_head = Some(block);
      self.coalesce(block);
      return;
    }

    let heap = self.source.bytes_mut();
    let mut prev = head;

    loop {
      match Header::read(heap, prev).next {
        Some(next) if next < block => prev = next,
        next => {
          debug_assert_ne!(next, Some(block), "block {block:#x} freed twice");
          block::set_next(heap, block, next);
          block::set_next(heap, prev, Some(block));
          break;
        }
      }
    }

    self.coalesce(block);
    self.coalesce(prev);
  }

  /// Merges `block` with its list successor when the two touch.
  fn coalesce(
    &mut self,
    block: usize,
  ) -> bool {
    let heap = self.source.bytes_mut();
    let header = Header::read(heap, block);

    let Some(next) = header.next else {
      return false;
    };

    if block::end_of(block, header.size) != next {
      return false;
    }

    let absorbed = Header::read(heap, next);
    let size = header.size + HEADER_SIZE + absorbed.size;
    Header::new(size, absorbed.next).write(heap, block);

    trace!("coalesced {block:#x} with {next:#x} into {size} bytes");

    true
  }
}
