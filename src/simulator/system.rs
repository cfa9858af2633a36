//! Cores, remappers, gateways, crossbar and slaves wired into one clock
//! domain.
//!
//! Evaluation order inside a tick is fixed and acyclic:
//! host request → remap → gateway drive → crossbar route → slave respond →
//! crossbar respond → gateway complete → core observe → commit everything.

use log::info;
use serde::Serialize;

use super::config::config::{AppConfig, SlaveKind};
use super::sim::records::Record;
use crate::builtin::Module;
use crate::bus::{BusConfig, ChannelKind, Request, Response};
use crate::error::ConfigError;
use crate::fabric::{AddressRemapper, Crossbar, MemoryMap, MemoryMapEntry};
use crate::gateway::{HostRequest, HostResponse, ProtocolGateway};
use crate::master::{HostCore, HostOp};
use crate::record;
use crate::slave::{Constant, Memory, Slave};

/// One fabric master: scripted core, optional remap, gateway.
pub struct MasterPort {
  pub core: HostCore,
  pub remap: AddressRemapper,
  pub gateway: ProtocolGateway,
}

impl MasterPort {
  pub fn new(name: &str, program: Vec<HostOp>, remap: AddressRemapper, map: MemoryMap, kind: ChannelKind) -> Self {
    Self {
      core: HostCore::new(name, program),
      remap,
      gateway: ProtocolGateway::new(format!("{}.gateway", name), map, kind),
    }
  }
}

/// Every signal of one tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickView {
  pub tick: u64,
  pub host_requests: Vec<HostRequest>,
  pub master_requests: Vec<Request>,
  pub slave_requests: Vec<Request>,
  /// Per port, the error sink last.
  pub grants: Vec<Option<usize>>,
  pub slave_responses: Vec<Response>,
  pub master_responses: Vec<Response>,
  pub host_responses: Vec<HostResponse>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SystemStats {
  pub ticks: u64,
  pub grants: u64,
  pub completed: u64,
  pub errors: u64,
  pub sc_local_failures: u64,
  pub stall_repeats: u64,
  pub pauses: u64,
}

pub struct System {
  bus: BusConfig,
  crossbar: Crossbar,
  masters: Vec<MasterPort>,
  slaves: Vec<Box<dyn Slave>>,

  tick: u64,
  grants: u64,
  records: Vec<Record>,
  view: TickView,
}

impl System {
  pub fn new(crossbar: Crossbar, masters: Vec<MasterPort>, slaves: Vec<Box<dyn Slave>>) -> Result<Self, ConfigError> {
    if masters.len() != crossbar.num_masters() {
      return Err(ConfigError::MasterCount(masters.len()));
    }
    if slaves.len() != crossbar.num_slaves() {
      return Err(ConfigError::PortCountMismatch {
        slaves: slaves.len(),
        entries: crossbar.num_slaves(),
      });
    }
    Ok(Self {
      bus: *crossbar.map().bus(),
      crossbar,
      masters,
      slaves,
      tick: 0,
      grants: 0,
      records: Vec::new(),
      view: TickView::default(),
    })
  }

  pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
    let bus = BusConfig::new(config.bus.address_width, config.bus.data_width)?;
    let entries = config
      .slave
      .iter()
      .map(|s| MemoryMapEntry::new(s.base, s.size))
      .collect();
    let map = MemoryMap::new(entries, bus)?;

    let mut slaves: Vec<Box<dyn Slave>> = Vec::with_capacity(config.slave.len());
    for s in &config.slave {
      let slave: Box<dyn Slave> = match s.kind {
        SlaveKind::Constant => Box::new(Constant::new(&s.name, s.value)),
        SlaveKind::Memory | SlaveKind::Rom => {
          let mut mem = Memory::new(&s.name, bus, s.size)
            .with_latency(s.latency)?
            .with_stall(s.stall);
          if s.kind == SlaveKind::Rom {
            mem = mem.read_only();
          }
          mem.load(0, &s.preload);
          Box::new(mem)
        },
      };
      slaves.push(slave);
    }

    let mut masters = Vec::with_capacity(config.master.len());
    for m in &config.master {
      let remap = AddressRemapper::new(m.remap.clone())?;
      masters.push(MasterPort::new(
        &m.name,
        m.program.clone(),
        remap,
        map.clone(),
        config.bus.channel,
      ));
    }

    let crossbar = Crossbar::new("xbar", masters.len(), slaves.len(), map, config.bus.channel)?;
    info!(
      "system: {} masters, {} slaves, {:?} channel",
      masters.len(),
      slaves.len(),
      config.bus.channel
    );
    Self::new(crossbar, masters, slaves)
  }

  pub fn bus(&self) -> &BusConfig {
    &self.bus
  }

  pub fn now(&self) -> u64 {
    self.tick
  }

  pub fn crossbar(&self) -> &Crossbar {
    &self.crossbar
  }

  pub fn masters(&self) -> &[MasterPort] {
    &self.masters
  }

  pub fn master(&self, index: usize) -> &MasterPort {
    &self.masters[index]
  }

  pub fn slave_names(&self) -> Vec<String> {
    self.slaves.iter().map(|s| s.name().to_string()).collect()
  }

  pub fn records(&self) -> &[Record] {
    &self.records
  }

  /// Records accumulated since the last call.
  pub fn take_records(&mut self) -> Vec<Record> {
    std::mem::take(&mut self.records)
  }

  /// Signals of the most recent tick.
  pub fn view(&self) -> &TickView {
    &self.view
  }

  pub fn is_done(&self) -> bool {
    self.masters.iter().all(|m| m.core.is_done())
  }

  pub fn stats(&self) -> SystemStats {
    let mut stats = SystemStats {
      ticks: self.tick,
      grants: self.grants,
      ..SystemStats::default()
    };
    for m in &self.masters {
      let g = m.gateway.stats();
      stats.completed += g.completed + g.sc_local_failures;
      stats.errors += g.errors;
      stats.sc_local_failures += g.sc_local_failures;
      stats.stall_repeats += g.stall_repeats;
      stats.pauses += g.pauses;
    }
    stats
  }

  /// Advance one clock.
  pub fn tick(&mut self) -> &TickView {
    let now = self.tick;

    let host_requests: Vec<HostRequest> = self
      .masters
      .iter_mut()
      .map(|m| {
        let mut req = m.core.request(now);
        if req.strobe {
          req.address = m.remap.remap(req.address);
        }
        req
      })
      .collect();

    let master_requests: Vec<Request> = self
      .masters
      .iter_mut()
      .zip(host_requests.iter())
      .map(|(m, host)| m.gateway.drive(host))
      .collect();

    let slave_requests = self.crossbar.route(&master_requests);
    let slave_responses: Vec<Response> = self
      .slaves
      .iter()
      .zip(slave_requests.iter())
      .map(|(s, req)| s.respond(req))
      .collect();
    let master_responses = self.crossbar.respond(&slave_responses);

    let host_responses: Vec<HostResponse> = self
      .masters
      .iter_mut()
      .zip(master_responses.iter())
      .map(|(m, resp)| m.gateway.complete(resp))
      .collect();

    let fresh: Vec<(usize, usize)> = self.crossbar.fresh_grants().collect();
    for (port, master) in fresh {
      self.grants += 1;
      let target = if port == self.crossbar.error_port() {
        "error_sink".to_string()
      } else {
        self.slaves[port].name().to_string()
      };
      let subject = format!("{} -> {}", self.masters[master].core.name(), target);
      record!(self, "xbar", "grant", subject);
    }

    for (i, resp) in host_responses.iter().enumerate() {
      if let Some(done) = self.masters[i].core.observe(resp, now) {
        let component = self.masters[i].core.name().to_string();
        let action = match (done.err, done.op) {
          (true, _) => "error",
          (false, HostOp::StoreConditional { .. }) if done.read_data & 1 != 0 => "sc_fail",
          (false, HostOp::StoreConditional { .. }) => "sc_ok",
          _ => "done",
        };
        record!(self, component, action, format!("{:?} data={:#x}", done.op, done.read_data));
      }
    }

    let grants = (0..=self.crossbar.num_slaves()).map(|p| self.crossbar.grant(p)).collect();

    self.crossbar.commit();
    for (slave, req) in self.slaves.iter_mut().zip(slave_requests.iter()) {
      slave.clock(req);
      slave.commit();
    }
    for m in &mut self.masters {
      m.gateway.commit();
    }

    self.view = TickView {
      tick: now,
      host_requests,
      master_requests,
      slave_requests,
      grants,
      slave_responses,
      master_responses,
      host_responses,
    };
    self.tick += 1;
    &self.view
  }

  /// Tick until every core is done or `max_ticks` have elapsed in total.
  pub fn run_until_done(&mut self, max_ticks: u64) -> u64 {
    while !self.is_done() && self.tick < max_ticks {
      self.tick();
    }
    self.tick
  }

  pub fn reset(&mut self) {
    self.crossbar.reset();
    for s in &mut self.slaves {
      s.reset();
    }
    for m in &mut self.masters {
      m.gateway.reset();
      m.core.reset();
    }
    self.tick = 0;
    self.grants = 0;
    self.records.clear();
    self.view = TickView::default();
  }
}
