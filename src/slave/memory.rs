use std::collections::HashMap;

use log::trace;

use super::Slave;
use crate::builtin::{Module, Reg};
use crate::bus::{BusConfig, Request, Response};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Job {
  remaining: u32,
  resp: Response,
}

/// Word-organised RAM (or ROM) window.
///
/// A strobe is accepted after `stall_ticks` stalled attempts, and is answered
/// `latency` ticks after it was accepted. Dropping `cycle_active` aborts
/// whatever is in flight. Storage is sparse so large windows cost nothing.
pub struct Memory {
  name: String,
  bus: BusConfig,
  size: u64,
  latency: u32,
  stall_ticks: u32,
  read_only: bool,
  words: HashMap<u64, u64>,

  job: Reg<Option<Job>>,
  stalled: Reg<u32>,
}

impl Memory {
  pub fn new(name: impl Into<String>, bus: BusConfig, size: u64) -> Self {
    Self {
      name: name.into(),
      bus,
      size,
      latency: 1,
      stall_ticks: 0,
      read_only: false,
      words: HashMap::new(),
      job: Reg::new(None),
      stalled: Reg::new(0),
    }
  }

  pub fn with_latency(mut self, latency: u32) -> Result<Self, ConfigError> {
    if latency == 0 {
      return Err(ConfigError::Slave {
        name: self.name,
        reason: "latency must be at least one tick".to_string(),
      });
    }
    self.latency = latency;
    Ok(self)
  }

  pub fn with_stall(mut self, stall_ticks: u32) -> Self {
    self.stall_ticks = stall_ticks;
    self
  }

  /// Writes answer `err`.
  pub fn read_only(mut self) -> Self {
    self.read_only = true;
    self
  }

  fn word_index(&self, address: u64) -> u64 {
    (address & self.size.wrapping_sub(1)) >> self.bus.word_shift()
  }

  /// Backdoor read, by address within the window.
  pub fn peek(&self, address: u64) -> u64 {
    self.words.get(&self.word_index(address)).copied().unwrap_or(0)
  }

  /// Backdoor write, by address within the window.
  pub fn poke(&mut self, address: u64, value: u64) {
    let index = self.word_index(address);
    self.words.insert(index, value & self.bus.data_mask());
  }

  pub fn load(&mut self, address: u64, words: &[u64]) {
    let step = self.bus.byte_lanes() as u64;
    for (i, word) in words.iter().enumerate() {
      self.poke(address + i as u64 * step, *word);
    }
  }

  fn busy(&self) -> bool {
    self.job.get().is_some()
  }

  fn accepts(&self, req: &Request) -> bool {
    req.is_strobe() && !self.busy() && *self.stalled.get() >= self.stall_ticks
  }

  fn access(&mut self, req: &Request) -> Response {
    if req.write_enable {
      if self.read_only {
        return Response::error();
      }
      let old = self.peek(req.address);
      let mut new = old;
      for lane in 0..self.bus.byte_lanes() {
        if req.byte_select & (1 << lane) != 0 {
          let mask = 0xffu64 << (lane * 8);
          new = (new & !mask) | (req.write_data & mask);
        }
      }
      self.poke(req.address, new);
      trace!("{}: write {:#x} <- {:#x}", self.name, req.address, new);
      Response::acked(0)
    } else {
      let data = self.peek(req.address);
      trace!("{}: read {:#x} -> {:#x}", self.name, req.address, data);
      Response::acked(data)
    }
  }
}

impl Slave for Memory {
  fn respond(&self, req: &Request) -> Response {
    let mut resp = match *self.job.get() {
      Some(job) if job.remaining == 0 && req.cycle_active => job.resp,
      _ => Response::idle(),
    };
    resp.stall = req.is_strobe() && !self.accepts(req);
    resp
  }

  fn clock(&mut self, req: &Request) {
    match *self.job.get() {
      Some(_) if !req.cycle_active => {
        self.job.set(None);
        self.stalled.set(0);
      },
      Some(job) if job.remaining == 0 => self.job.set(None),
      Some(job) => self.job.set(Some(Job {
        remaining: job.remaining - 1,
        ..job
      })),
      None if self.accepts(req) => {
        let resp = self.access(req);
        self.job.set(Some(Job {
          remaining: self.latency - 1,
          resp,
        }));
        self.stalled.set(0);
      },
      None if req.is_strobe() => {
        let stalled = *self.stalled.get() + 1;
        self.stalled.set(stalled);
      },
      None => self.stalled.set(0),
    }
  }
}

impl Module for Memory {
  fn name(&self) -> &str {
    &self.name
  }

  fn commit(&mut self) {
    self.job.commit();
    self.stalled.commit();
  }

  fn reset(&mut self) {
    self.job.reset();
    self.stalled.reset();
  }
}
