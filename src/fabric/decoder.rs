use serde::{Deserialize, Serialize};

use crate::bus::BusConfig;
use crate::error::ConfigError;

/// One slave window. `size` is a power of two; the low `log2(size)` address
/// bits belong to the slave, the rest are compared against `base_address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMapEntry {
  pub base_address: u64,
  pub size: u64,
}

impl MemoryMapEntry {
  pub fn new(base_address: u64, size: u64) -> Self {
    Self { base_address, size }
  }

  /// Number of low-order address bits owned by the slave.
  pub fn offset_bits(&self) -> u32 {
    self.size.trailing_zeros()
  }

  pub fn contains(&self, address: u64) -> bool {
    let shift = self.offset_bits();
    if shift >= 64 {
      return true;
    }
    (address >> shift) == (self.base_address >> shift)
  }
}

/// Result of an address decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
  Slave(usize),
  Unmapped,
}

/// Static memory map, indexed identically to the slave port array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMap {
  entries: Vec<MemoryMapEntry>,
  bus: BusConfig,
}

impl MemoryMap {
  pub fn new(entries: Vec<MemoryMapEntry>, bus: BusConfig) -> Result<Self, ConfigError> {
    bus.validate()?;
    for (index, entry) in entries.iter().enumerate() {
      if !entry.size.is_power_of_two() {
        return Err(ConfigError::SizeNotPowerOfTwo {
          index,
          size: entry.size,
        });
      }
      if entry.base_address & (entry.size - 1) != 0 {
        return Err(ConfigError::BaseNotAligned {
          index,
          base: entry.base_address,
          size: entry.size,
        });
      }
      let last = entry.base_address.checked_add(entry.size - 1);
      if last.map_or(true, |last| last & !bus.address_mask() != 0) {
        return Err(ConfigError::WindowOutOfRange {
          index,
          base: entry.base_address,
          size: entry.size,
          width: bus.address_width,
        });
      }
    }
    Ok(Self { entries, bus })
  }

  pub fn entries(&self) -> &[MemoryMapEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn bus(&self) -> &BusConfig {
    &self.bus
  }

  pub fn decode(&self, address: u64) -> Target {
    decode(address & self.bus.address_mask(), &self.entries)
  }
}

/// Map an address to a slave index. Every entry is checked and the last
/// match in map order wins, so a later window may shadow an earlier one.
pub fn decode(address: u64, entries: &[MemoryMapEntry]) -> Target {
  let mut target = Target::Unmapped;
  for (index, entry) in entries.iter().enumerate() {
    if entry.contains(address) {
      target = Target::Slave(index);
    }
  }
  target
}
