use crate::{align, align::checked_align, error::AllocError};

/// Payload bytes added to the heap whenever no free block fits.
pub const DEFAULT_INCREMENT: usize = 1024;

/// Smallest payload worth carving off as a separate free block.
pub const DEFAULT_MIN_PAYLOAD: usize = 4;

/// Tunables of a [`Heap`](crate::Heap).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
  /// Payload size of each heap growth. Requests larger than this grow the
  /// heap by exactly their own size instead.
  pub increment: usize,
  /// A split only happens when the leftover can hold a header plus this
  /// many payload bytes.
  pub min_payload: usize,
}

impl Default for HeapConfig {
  /// The defaults, already in the form [`validate`](Self::validate) returns.
  fn default() -> Self {
    Self {
      increment: align!(DEFAULT_INCREMENT),
      min_payload: align!(DEFAULT_MIN_PAYLOAD),
    }
  }
}

impl HeapConfig {
  pub fn with_increment(
    mut self,
    increment: usize,
  ) -> Self {
    self.increment = increment;
    self
  }

  pub fn with_min_payload(
    mut self,
    min_payload: usize,
  ) -> Self {
    self.min_payload = min_payload;
    self
  }

  /// Checks the configuration and rounds both sizes up to the heap alignment.
  pub fn validate(self) -> Result<Self, AllocError> {
    if self.increment == 0 {
      return Err(AllocError::InvalidConfig("increment must be non-zero"));
    }

    let increment =
      checked_align(self.increment).ok_or(AllocError::InvalidConfig("increment is too large"))?;
    // A split must leave at least one aligned word of payload behind.
    let min_payload = checked_align(self.min_payload.max(1))
      .ok_or(AllocError::InvalidConfig("min_payload is too large"))?;

    Ok(Self {
      increment,
      min_payload,
    })
  }
}
