use std::fmt;

/// Call counters. Purely informational; the heap never reads them back.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
  pub allocations: usize,
  pub deallocations: usize,
  pub growths: usize,
}

/// One node of the free list, as seen by [`Heap::free_list`](crate::Heap::free_list).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlockInfo {
  /// Header offset of the block.
  pub offset: usize,
  /// Payload size of the block.
  pub size: usize,
  /// Header offset of the next free block.
  pub next: Option<usize>,
}

/// Snapshot of the free list in list (address) order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FreeListDump {
  pub blocks: Vec<FreeBlockInfo>,
}

impl FreeListDump {
  /// Sum of the payload sizes of all free blocks.
  pub fn free_bytes(&self) -> usize {
    self.blocks.iter().map(|block| block.size).sum()
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }
}

impl fmt::Display for FreeListDump {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    if self.blocks.is_empty() {
      return writeln!(f, "free list: <empty>");
    }

    writeln!(f, "free list: {} block(s), {} bytes", self.len(), self.free_bytes())?;

    for block in &self.blocks {
      match block.next {
        Some(next) => writeln!(
          f,
          "  {:#08x}  size = {:>8}  next = {:#08x}",
          block.offset, block.size, next
        )?,
        None => writeln!(
          f,
          "  {:#08x}  size = {:>8}  next = nil",
          block.offset, block.size
        )?,
      }
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_dump_display() {
    let dump = FreeListDump {
      blocks: vec![
        FreeBlockInfo {
          offset: 0x10,
          size: 64,
          next: Some(0x78),
        },
        FreeBlockInfo {
          offset: 0x78,
          size: 904,
          next: None,
        },
      ],
    };

    let text = dump.to_string();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(dump.free_bytes(), 968);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "free list: 2 block(s), 968 bytes");
    assert!(lines[1].contains("next = 0x000078"));
    assert!(lines[2].ends_with("next = nil"));
  }

  #[test]
  fn test_empty_dump_display() {
    assert_eq!(FreeListDump::default().to_string(), "free list: <empty>\n");
  }
}
