//! N masters to M slaves with address routing, round-robin arbitration and
//! grant locking.
//!
//! Per tick: `route` (decode, arbitrate, mux requests to slave ports), the
//! slaves respond, `respond` (mux responses back), then `commit`. Port `M`
//! (one past the last slave) is the error sink for unmapped addresses and is
//! arbitrated like any other port.
//!
//! A port whose owner drops `cycle_active` sits idle for that tick and is
//! re-arbitrated on the next one, so the slave sees the abort before it sees
//! a new master.

use log::{debug, trace};

use super::arbiter::{one_hot_index, RoundRobinArbiter};
use super::decoder::{MemoryMap, Target};
use super::error_sink::ErrorSink;
use crate::builtin::{Module, Reg};
use crate::bus::{ChannelKind, Request, Response};
use crate::error::ConfigError;

pub const MAX_MASTERS: usize = 64;

pub struct Crossbar {
  name: String,
  kind: ChannelKind,
  map: MemoryMap,
  num_masters: usize,

  // registered, one per port (slaves + error sink)
  held: Vec<Reg<Option<usize>>>,
  arbiters: Vec<RoundRobinArbiter>,
  sink: ErrorSink,

  // combinational, valid between route() and commit()
  inputs: Vec<Request>,
  requesters: Vec<u64>,
  grants: Vec<Option<usize>>,
  fresh: Vec<bool>,
  connected: Vec<Option<usize>>,
  sink_req: Request,
}

impl Crossbar {
  pub fn new(
    name: impl Into<String>,
    num_masters: usize,
    num_slaves: usize,
    map: MemoryMap,
    kind: ChannelKind,
  ) -> Result<Self, ConfigError> {
    let name = name.into();
    if num_masters == 0 || num_masters > MAX_MASTERS {
      return Err(ConfigError::MasterCount(num_masters));
    }
    if num_slaves != map.len() {
      return Err(ConfigError::PortCountMismatch {
        slaves: num_slaves,
        entries: map.len(),
      });
    }
    let ports = map.len() + 1;
    debug!(
      "{}: {} masters, {} slaves, {:?} channel",
      name, num_masters, num_slaves, kind
    );
    Ok(Self {
      sink: ErrorSink::new(format!("{}.error_sink", name)),
      name,
      kind,
      map,
      num_masters,
      held: (0..ports).map(|_| Reg::new(None)).collect(),
      arbiters: (0..ports).map(|_| RoundRobinArbiter::new(num_masters)).collect(),
      inputs: vec![Request::idle(); num_masters],
      requesters: vec![0; ports],
      grants: vec![None; ports],
      fresh: vec![false; ports],
      connected: vec![None; num_masters],
      sink_req: Request::idle(),
    })
  }

  pub fn num_masters(&self) -> usize {
    self.num_masters
  }

  pub fn num_slaves(&self) -> usize {
    self.map.len()
  }

  /// Port index of the unmapped-address sink.
  pub fn error_port(&self) -> usize {
    self.map.len()
  }

  pub fn map(&self) -> &MemoryMap {
    &self.map
  }

  pub fn kind(&self) -> ChannelKind {
    self.kind
  }

  /// Master wired to `port` this tick.
  pub fn grant(&self, port: usize) -> Option<usize> {
    self.grants.get(port).copied().flatten()
  }

  /// Master recorded as owner of `port` at the last clock edge.
  pub fn held(&self, port: usize) -> Option<usize> {
    self.held.get(port).and_then(|r| *r.get())
  }

  /// Port a master is wired to this tick.
  pub fn connection(&self, master: usize) -> Option<usize> {
    self.connected.get(master).copied().flatten()
  }

  /// Requester bitmap of `port` this tick (locked owners excluded).
  pub fn requesters(&self, port: usize) -> u64 {
    self.requesters.get(port).copied().unwrap_or(0)
  }

  /// Grants arbitrated this tick, as (port, master).
  pub fn fresh_grants(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
    self
      .grants
      .iter()
      .zip(self.fresh.iter())
      .enumerate()
      .filter_map(|(port, (grant, fresh))| if *fresh { grant.map(|m| (port, m)) } else { None })
  }

  fn port_of(&self, address: u64) -> usize {
    match self.map.decode(address) {
      Target::Slave(s) => s,
      Target::Unmapped => self.error_port(),
    }
  }

  /// Decode, arbitrate and mux. Returns the request seen by every slave
  /// port; ports without a grant see an idle request.
  pub fn route(&mut self, masters: &[Request]) -> Vec<Request> {
    debug_assert_eq!(masters.len(), self.num_masters);
    let bus = *self.map.bus();
    let ports = self.held.len();

    for m in 0..self.num_masters {
      self.inputs[m] = masters.get(m).map(|r| bus.mask_request(r)).unwrap_or_default();
    }

    // A held grant stays with its master for as long as cycle_active does.
    let mut locked_to = vec![None; self.num_masters];
    for port in 0..ports {
      if let Some(m) = *self.held[port].get() {
        if self.inputs[m].cycle_active {
          locked_to[m] = Some(port);
        }
      }
    }

    self.requesters.iter_mut().for_each(|r| *r = 0);
    for m in 0..self.num_masters {
      let req = self.inputs[m];
      if req.cycle_active && locked_to[m].is_none() {
        let port = self.port_of(req.address);
        self.requesters[port] |= 1u64 << m;
      }
    }

    self.connected.iter_mut().for_each(|c| *c = None);
    for port in 0..ports {
      let (grant, fresh) = match *self.held[port].get() {
        Some(m) if locked_to[m] == Some(port) => (Some(m), false),
        Some(m) => {
          trace!("{}: port {} released by master {}", self.name, port, m);
          (None, false)
        },
        None => {
          let grant = one_hot_index(self.arbiters[port].peek(self.requesters[port]));
          (grant, grant.is_some())
        },
      };
      self.grants[port] = grant;
      self.fresh[port] = fresh;
      self.held[port].set(grant);
      if let Some(m) = grant {
        self.connected[m] = Some(port);
        if fresh {
          trace!("{}: port {} granted to master {}", self.name, port, m);
        }
      }
    }

    let sink = self.error_port();
    self.sink_req = self.grants[sink].map(|m| self.inputs[m]).unwrap_or_default();
    (0..self.map.len())
      .map(|port| self.grants[port].map(|m| self.inputs[m]).unwrap_or_default())
      .collect()
  }

  /// Mux slave responses back to masters. Masters waiting on a busy port
  /// see the channel's waiting response.
  pub fn respond(&self, slaves: &[Response]) -> Vec<Response> {
    debug_assert_eq!(slaves.len(), self.map.len());
    (0..self.num_masters)
      .map(|m| match self.connected[m] {
        Some(port) if port == self.error_port() => self.sink.respond(&self.sink_req),
        Some(port) => self.kind.shape(slaves.get(port).copied().unwrap_or_default()),
        None if self.inputs[m].cycle_active => self.kind.waiting(),
        None => Response::idle(),
      })
      .collect()
  }
}

impl Module for Crossbar {
  fn name(&self) -> &str {
    &self.name
  }

  fn commit(&mut self) {
    for port in 0..self.held.len() {
      self.held[port].commit();
      if self.fresh[port] {
        if let Some(m) = self.grants[port] {
          self.arbiters[port].update(1u64 << m);
        }
      }
    }
    let sink_req = self.sink_req;
    self.sink.clock(&sink_req);
    self.sink.commit();
  }

  fn reset(&mut self) {
    self.held.iter_mut().for_each(|r| r.reset());
    self.arbiters.iter_mut().for_each(|a| a.reset());
    self.sink.reset();
    self.inputs.iter_mut().for_each(|r| *r = Request::idle());
    self.requesters.iter_mut().for_each(|r| *r = 0);
    self.grants.iter_mut().for_each(|g| *g = None);
    self.fresh.iter_mut().for_each(|f| *f = false);
    self.connected.iter_mut().for_each(|c| *c = None);
    self.sink_req = Request::idle();
  }
}
