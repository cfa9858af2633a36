/// Bus slaves: the trait the fabric talks to, plus the models used to
/// exercise it
pub mod constant;
pub mod memory;

pub use constant::Constant;
pub use memory::Memory;

use crate::builtin::Module;
use crate::bus::{Request, Response};

/// A slave port.
///
/// `ack`, `err` and `read_data` must come from registered state only, so a
/// response can never complete on the tick its strobe was first raised.
/// `stall` may look at the current request.
pub trait Slave: Module {
  fn respond(&self, req: &Request) -> Response;

  /// Sample this tick's request into next-state.
  fn clock(&mut self, req: &Request);
}
