use super::Slave;
use crate::builtin::{Module, Reg};
use crate::bus::{Request, Response};

/// Answers every read with the same word one tick after the strobe; writes
/// are acked and dropped. Used to tell which physical port a request landed on.
pub struct Constant {
  name: String,
  value: u64,
  ack: Reg<bool>,
}

impl Constant {
  pub fn new(name: impl Into<String>, value: u64) -> Self {
    Self {
      name: name.into(),
      value,
      ack: Reg::new(false),
    }
  }

  pub fn value(&self) -> u64 {
    self.value
  }
}

impl Slave for Constant {
  fn respond(&self, req: &Request) -> Response {
    if *self.ack.get() && req.cycle_active {
      Response::acked(self.value)
    } else {
      Response::idle()
    }
  }

  fn clock(&mut self, req: &Request) {
    // a simple-channel master keeps strobe up through the ack tick
    self.ack.set(req.is_strobe() && !*self.ack.get());
  }
}

impl Module for Constant {
  fn name(&self) -> &str {
    &self.name
  }

  fn commit(&mut self) {
    self.ack.commit();
  }

  fn reset(&mut self) {
    self.ack.reset();
  }
}
