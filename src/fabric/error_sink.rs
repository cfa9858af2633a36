use crate::builtin::{Module, Reg};
use crate::bus::{Request, Response};

/// Where unmapped addresses go. Answers every accepted strobe with exactly
/// one tick of `err`, the tick after the strobe. Holding `cycle_active`
/// without a new strobe does not produce another error.
#[derive(Debug, Clone)]
pub struct ErrorSink {
  name: String,
  err: Reg<bool>,
}

impl ErrorSink {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      err: Reg::new(false),
    }
  }

  /// Never stalls; `err` comes from the register only.
  pub fn respond(&self, req: &Request) -> Response {
    if *self.err.get() && req.cycle_active {
      Response::error()
    } else {
      Response::idle()
    }
  }

  /// Sample this tick's request into next-state.
  pub fn clock(&mut self, req: &Request) {
    self.err.set(req.is_strobe() && !*self.err.get());
  }
}

impl Module for ErrorSink {
  fn name(&self) -> &str {
    &self.name
  }

  fn commit(&mut self) {
    self.err.commit();
  }

  fn reset(&mut self) {
    self.err.reset();
  }
}
