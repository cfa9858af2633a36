use super::decoder::{MemoryMap, Target};
use super::error_sink::ErrorSink;
use crate::builtin::Module;
use crate::bus::{ChannelKind, Request, Response};
use crate::error::ConfigError;

/// Single master fan-out. Same decode as the crossbar but nothing to
/// arbitrate: the selected slave gets the request, every other slave port
/// sees an idle request, unmapped addresses go to the error sink.
pub struct StaticMux {
  name: String,
  kind: ChannelKind,
  map: MemoryMap,
  sink: ErrorSink,

  selected: Target,
  input: Request,
}

impl StaticMux {
  pub fn new(name: impl Into<String>, num_slaves: usize, map: MemoryMap, kind: ChannelKind) -> Result<Self, ConfigError> {
    if num_slaves != map.len() {
      return Err(ConfigError::PortCountMismatch {
        slaves: num_slaves,
        entries: map.len(),
      });
    }
    let name = name.into();
    Ok(Self {
      sink: ErrorSink::new(format!("{}.error_sink", name)),
      name,
      kind,
      map,
      selected: Target::Unmapped,
      input: Request::idle(),
    })
  }

  pub fn map(&self) -> &MemoryMap {
    &self.map
  }

  /// Slave the current request decodes to.
  pub fn selected(&self) -> Target {
    self.selected
  }

  pub fn route(&mut self, master: &Request) -> Vec<Request> {
    self.input = self.map.bus().mask_request(master);
    self.selected = self.map.decode(self.input.address);
    (0..self.map.len())
      .map(|s| {
        if self.input.cycle_active && self.selected == Target::Slave(s) {
          self.input
        } else {
          Request::idle()
        }
      })
      .collect()
  }

  pub fn respond(&self, slaves: &[Response]) -> Response {
    if !self.input.cycle_active {
      return Response::idle();
    }
    match self.selected {
      Target::Slave(s) => self.kind.shape(slaves.get(s).copied().unwrap_or_default()),
      Target::Unmapped => self.sink.respond(&self.input),
    }
  }

  fn sink_request(&self) -> Request {
    match self.selected {
      Target::Unmapped => self.input,
      Target::Slave(_) => Request::idle(),
    }
  }
}

impl Module for StaticMux {
  fn name(&self) -> &str {
    &self.name
  }

  fn commit(&mut self) {
    let req = self.sink_request();
    self.sink.clock(&req);
    self.sink.commit();
  }

  fn reset(&mut self) {
    self.sink.reset();
    self.selected = Target::Unmapped;
    self.input = Request::idle();
  }
}
