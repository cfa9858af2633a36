use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::gateway::{HostRequest, HostResponse};

/// One step of a core's program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
  Read { address: u64 },
  Write { address: u64, data: u64 },
  LoadReserved { address: u64 },
  StoreConditional { address: u64, data: u64 },
  /// Stay off the bus for a number of ticks.
  Idle { ticks: u32 },
}

impl HostOp {
  fn request(&self) -> HostRequest {
    match *self {
      HostOp::Read { address } => HostRequest::read(address),
      HostOp::Write { address, data } => HostRequest::write(address, data),
      HostOp::LoadReserved { address } => HostRequest::load_reserved(address),
      HostOp::StoreConditional { address, data } => HostRequest::store_conditional(address, data),
      HostOp::Idle { .. } => HostRequest::idle(),
    }
  }
}

/// What a core saw for one of its transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Completion {
  pub op: HostOp,
  pub ack: bool,
  pub err: bool,
  pub read_data: u64,
  pub issued: u64,
  pub completed: u64,
}

impl Completion {
  /// Ticks from strobe to response.
  pub fn latency(&self) -> u64 {
    self.completed - self.issued
  }
}

/// Scripted host: strobes one op, waits for its response, strobes the next
/// one on the following tick.
pub struct HostCore {
  name: String,
  program: Vec<HostOp>,
  pc: usize,
  waited: u32,
  outstanding: Option<(HostOp, u64)>,
  completions: Vec<Completion>,
}

impl HostCore {
  pub fn new(name: impl Into<String>, program: Vec<HostOp>) -> Self {
    Self {
      name: name.into(),
      program,
      pc: 0,
      waited: 0,
      outstanding: None,
      completions: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn completions(&self) -> &[Completion] {
    &self.completions
  }

  pub fn last_completion(&self) -> Option<&Completion> {
    self.completions.last()
  }

  pub fn is_waiting(&self) -> bool {
    self.outstanding.is_some()
  }

  /// Program finished and nothing in flight.
  pub fn is_done(&self) -> bool {
    self.outstanding.is_none() && self.pc >= self.program.len()
  }

  /// Host request for tick `now`.
  pub fn request(&mut self, now: u64) -> HostRequest {
    if self.outstanding.is_some() {
      return HostRequest::idle();
    }
    while let Some(op) = self.program.get(self.pc).copied() {
      if let HostOp::Idle { ticks } = op {
        if self.waited < ticks {
          self.waited += 1;
          return HostRequest::idle();
        }
        self.waited = 0;
        self.pc += 1;
        continue;
      }
      debug!("{}: t={} issue {:?}", self.name, now, op);
      self.outstanding = Some((op, now));
      self.pc += 1;
      return op.request();
    }
    HostRequest::idle()
  }

  /// Host response of tick `now`.
  pub fn observe(&mut self, resp: &HostResponse, now: u64) -> Option<Completion> {
    if !resp.is_done() {
      return None;
    }
    match self.outstanding.take() {
      Some((op, issued)) => {
        let completion = Completion {
          op,
          ack: resp.ack,
          err: resp.err,
          read_data: resp.read_data,
          issued,
          completed: now,
        };
        debug!("{}: t={} done {:?}", self.name, now, completion);
        self.completions.push(completion);
        Some(completion)
      },
      None => {
        warn!("{}: t={} response without a transaction in flight", self.name, now);
        None
      },
    }
  }

  pub fn reset(&mut self) {
    self.pc = 0;
    self.waited = 0;
    self.outstanding = None;
    self.completions.clear();
  }
}
