use serde::{Deserialize, Serialize};

/// Master to slave. `strobe` only means something while `cycle_active` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
  pub address: u64,
  pub write_data: u64,
  pub byte_select: u8,
  pub write_enable: bool,
  pub strobe: bool,
  pub cycle_active: bool,
}

impl Request {
  /// Nothing on the wires.
  pub fn idle() -> Self {
    Self::default()
  }

  pub fn read(address: u64, byte_select: u8) -> Self {
    Self {
      address,
      byte_select,
      strobe: true,
      cycle_active: true,
      ..Self::default()
    }
  }

  pub fn write(address: u64, write_data: u64, byte_select: u8) -> Self {
    Self {
      address,
      write_data,
      byte_select,
      write_enable: true,
      strobe: true,
      cycle_active: true,
    }
  }

  /// A transfer attempt this tick.
  pub fn is_strobe(&self) -> bool {
    self.cycle_active && self.strobe
  }
}

/// Slave to master. `stall` is forced low on a simple channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
  pub stall: bool,
  pub ack: bool,
  pub err: bool,
  pub read_data: u64,
}

impl Response {
  pub fn idle() -> Self {
    Self::default()
  }

  /// What a requester that lost arbitration sees.
  pub fn stalled() -> Self {
    Self {
      stall: true,
      ..Self::default()
    }
  }

  pub fn acked(read_data: u64) -> Self {
    Self {
      ack: true,
      read_data,
      ..Self::default()
    }
  }

  pub fn error() -> Self {
    Self {
      err: true,
      ..Self::default()
    }
  }

  /// The beat completed, one way or the other.
  pub fn is_done(&self) -> bool {
    self.ack || self.err
  }
}

/// The two channel shapes used at every boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
  /// No `stall`; a requester waiting for a busy slave sees nothing.
  Simple,
  /// `stall` present; a requester waiting for a busy slave is stalled.
  #[default]
  Pipelined,
}

impl ChannelKind {
  /// Response shown to a requester that is not (yet) connected.
  pub fn waiting(&self) -> Response {
    match self {
      ChannelKind::Simple => Response::idle(),
      ChannelKind::Pipelined => Response::stalled(),
    }
  }

  /// Strip what this channel shape cannot carry.
  pub fn shape(&self, resp: Response) -> Response {
    match self {
      ChannelKind::Simple => Response { stall: false, ..resp },
      ChannelKind::Pipelined => resp,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_strobe_requires_cycle() {
    let mut req = Request::read(0x100, 0xf);
    assert!(req.is_strobe());
    req.cycle_active = false;
    assert!(!req.is_strobe());
  }

  #[test]
  fn test_simple_channel_drops_stall() {
    let resp = ChannelKind::Simple.shape(Response::stalled());
    assert!(!resp.stall);
    assert_eq!(ChannelKind::Simple.waiting(), Response::idle());
    assert!(ChannelKind::Pipelined.waiting().stall);
  }
}
