use serde::{Deserialize, Serialize};

use super::channel::Request;
use crate::error::ConfigError;

/// Field widths of the bus. Built once at construction and threaded through
/// every component that needs to mask values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
  #[serde(default = "default_address_width")]
  pub address_width: u32,
  #[serde(default = "default_data_width")]
  pub data_width: u32,
}

fn default_address_width() -> u32 {
  32
}

fn default_data_width() -> u32 {
  32
}

impl Default for BusConfig {
  fn default() -> Self {
    Self {
      address_width: default_address_width(),
      data_width: default_data_width(),
    }
  }
}

fn width_mask(bits: u32) -> u64 {
  if bits >= 64 {
    u64::MAX
  } else {
    (1u64 << bits) - 1
  }
}

impl BusConfig {
  pub fn new(address_width: u32, data_width: u32) -> Result<Self, ConfigError> {
    let config = Self {
      address_width,
      data_width,
    };
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.address_width == 0 || self.address_width > 64 {
      return Err(ConfigError::AddressWidth(self.address_width));
    }
    if !matches!(self.data_width, 8 | 16 | 32 | 64) {
      return Err(ConfigError::DataWidth(self.data_width));
    }
    Ok(())
  }

  pub fn address_mask(&self) -> u64 {
    width_mask(self.address_width)
  }

  pub fn data_mask(&self) -> u64 {
    width_mask(self.data_width)
  }

  /// One select bit per byte lane.
  pub fn byte_lanes(&self) -> u32 {
    self.data_width / 8
  }

  pub fn byte_select_mask(&self) -> u8 {
    width_mask(self.byte_lanes()) as u8
  }

  /// Byte offset of a word address, i.e. log2 of the lane count.
  pub fn word_shift(&self) -> u32 {
    self.byte_lanes().trailing_zeros()
  }

  /// Clip every field of a request to the configured widths.
  pub fn mask_request(&self, req: &Request) -> Request {
    Request {
      address: req.address & self.address_mask(),
      write_data: req.write_data & self.data_mask(),
      byte_select: req.byte_select & self.byte_select_mask(),
      ..*req
    }
  }
}
