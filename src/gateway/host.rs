use serde::{Deserialize, Serialize};

/// Which part of an LR/SC pair a host access is, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomicKind {
  #[default]
  Plain,
  LoadReserved,
  StoreConditional,
}

/// Single-outstanding host bus request. `strobe` is high for exactly one tick
/// per transaction; the other fields are only sampled on that tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRequest {
  pub address: u64,
  pub write_data: u64,
  pub byte_select: u8,
  pub write_enable: bool,
  pub strobe: bool,
  pub atomic: AtomicKind,
}

impl HostRequest {
  pub fn idle() -> Self {
    Self::default()
  }

  pub fn read(address: u64) -> Self {
    Self {
      address,
      byte_select: 0xff,
      strobe: true,
      ..Self::default()
    }
  }

  pub fn write(address: u64, write_data: u64) -> Self {
    Self {
      address,
      write_data,
      byte_select: 0xff,
      write_enable: true,
      strobe: true,
      ..Self::default()
    }
  }

  pub fn load_reserved(address: u64) -> Self {
    Self {
      atomic: AtomicKind::LoadReserved,
      ..Self::read(address)
    }
  }

  pub fn store_conditional(address: u64, write_data: u64) -> Self {
    Self {
      atomic: AtomicKind::StoreConditional,
      ..Self::write(address, write_data)
    }
  }

  pub fn with_byte_select(self, byte_select: u8) -> Self {
    Self { byte_select, ..self }
  }
}

/// Host bus response: exactly one `ack` or `err` per transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResponse {
  pub ack: bool,
  pub err: bool,
  pub read_data: u64,
}

impl HostResponse {
  pub fn is_done(&self) -> bool {
    self.ack || self.err
  }
}
