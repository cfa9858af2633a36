use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rewrite the high bits of addresses inside `[from, from + size)` to the
/// matching offset inside `[to, to + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemapRange {
  pub from: u64,
  pub to: u64,
  pub size: u64,
}

impl RemapRange {
  pub fn new(from: u64, to: u64, size: u64) -> Self {
    Self { from, to, size }
  }

  fn offset_mask(&self) -> u64 {
    self.size - 1
  }

  fn matches(&self, address: u64) -> bool {
    address & !self.offset_mask() == self.from
  }
}

/// Stateless address translation in front of a master.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressRemapper {
  ranges: Vec<RemapRange>,
}

impl AddressRemapper {
  pub fn new(ranges: Vec<RemapRange>) -> Result<Self, ConfigError> {
    for (index, range) in ranges.iter().enumerate() {
      let reason = if !range.size.is_power_of_two() {
        Some(format!("size {:#x} is not a power of two", range.size))
      } else if range.from & range.offset_mask() != 0 || range.to & range.offset_mask() != 0 {
        Some(format!(
          "from {:#x} / to {:#x} not aligned to size {:#x}",
          range.from, range.to, range.size
        ))
      } else {
        None
      };
      if let Some(reason) = reason {
        return Err(ConfigError::RemapRange { index, reason });
      }
    }
    Ok(Self { ranges })
  }

  pub fn ranges(&self) -> &[RemapRange] {
    &self.ranges
  }

  /// First matching range wins; no match passes the address through.
  pub fn remap(&self, address: u64) -> u64 {
    self
      .ranges
      .iter()
      .find(|r| r.matches(address))
      .map_or(address, |r| r.to | (address & r.offset_mask()))
  }
}
