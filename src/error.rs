use thiserror::Error;

/// Construction-time configuration errors. None of these can be recovered
/// from at run time: the fabric refuses to build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("address width {0} is out of range (1..=64)")]
  AddressWidth(u32),

  #[error("data width {0} is not one of 8, 16, 32, 64")]
  DataWidth(u32),

  #[error("memory map entry {index}: size {size:#x} is not a power of two")]
  SizeNotPowerOfTwo { index: usize, size: u64 },

  #[error("memory map entry {index}: base {base:#x} is not aligned to size {size:#x}")]
  BaseNotAligned { index: usize, base: u64, size: u64 },

  #[error("memory map entry {index}: window {base:#x}+{size:#x} exceeds the {width}-bit address space")]
  WindowOutOfRange { index: usize, base: u64, size: u64, width: u32 },

  #[error("{slaves} slave ports configured but the memory map has {entries} entries")]
  PortCountMismatch { slaves: usize, entries: usize },

  #[error("{0} masters requested, the crossbar supports 1..=64")]
  MasterCount(usize),

  #[error("remap range {index}: {reason}")]
  RemapRange { index: usize, reason: String },

  #[error("slave '{name}': {reason}")]
  Slave { name: String, reason: String },
}
