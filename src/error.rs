use thiserror::Error;

/// Why a heap operation produced no memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  #[error("requested size must be non-zero")]
  InvalidSize,
  #[error("{count} elements of {element_size} bytes overflow the address space")]
  Overflow { count: usize, element_size: usize },
  #[error("heap source refused to grow by {requested} bytes")]
  OutOfMemory { requested: usize },
  #[error("invalid heap configuration: {0}")]
  InvalidConfig(&'static str),
}

impl AllocError {
  /// `true` for the errors caused by the request itself rather than by
  /// memory pressure. A `calloc` overflow counts as an invalid size.
  pub fn is_invalid_size(&self) -> bool {
    matches!(self, Self::InvalidSize | Self::Overflow { .. })
  }
}
