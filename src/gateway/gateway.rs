//! Single-outstanding host bus to the fabric.
//!
//! The host strobes once and waits for ack/err. The fabric wants
//! `cycle_active` for the whole transaction. On a pipelined channel `strobe`
//! is repeated on every tick the slave stalled the previous one; on a simple
//! channel it stays high until ack/err. Per tick: `drive` produces the
//! fabric request, the fabric answers, `complete` produces the host response
//! and stages next-state, `commit` is the clock edge.

use log::{debug, warn};
use serde::Serialize;

use super::host::{AtomicKind, HostRequest, HostResponse};
use super::state::{Pacing, Reservation};
use crate::builtin::{Module, Reg};
use crate::bus::{ChannelKind, Request, Response};
use crate::fabric::{MemoryMap, Target};

/// Result code of a store-conditional, in bit 0 of `read_data`.
pub const SC_SUCCESS: u64 = 0;
pub const SC_FAILURE: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
  req: HostRequest,
  // put on the fabric yet (false only while pacing holds it back)
  issued: bool,
  // strobe wanted this tick: first issue, stall repeat, or simple-channel hold
  strobe: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GatewayStats {
  pub forwarded: u64,
  pub completed: u64,
  pub errors: u64,
  pub sc_local_failures: u64,
  pub stall_repeats: u64,
  pub pauses: u64,
  pub dropped_strobes: u64,
}

// next-state computed by drive(), finished by complete()
#[derive(Debug, Clone, Copy)]
struct Staged {
  pending: Option<Pending>,
  pacing: Pacing,
  reservation: Reservation,
  last_select: Option<Target>,
  local_reply: bool,
}

pub struct ProtocolGateway {
  name: String,
  map: MemoryMap,
  kind: ChannelKind,

  pending: Reg<Option<Pending>>,
  pacing: Reg<Pacing>,
  reservation: Reg<Reservation>,
  last_select: Reg<Option<Target>>,
  local_reply: Reg<bool>,

  out: Request,
  staged: Staged,
  stats: GatewayStats,
}

impl ProtocolGateway {
  /// `map` is the fabric's memory map; two addresses that decode to the same
  /// window count as the same slave for back-to-back pacing.
  pub fn new(name: impl Into<String>, map: MemoryMap, kind: ChannelKind) -> Self {
    Self {
      name: name.into(),
      map,
      kind,
      pending: Reg::new(None),
      pacing: Reg::new(Pacing::Idle),
      reservation: Reg::new(Reservation::Clear),
      last_select: Reg::new(None),
      local_reply: Reg::new(false),
      out: Request::idle(),
      staged: Staged {
        pending: None,
        pacing: Pacing::Idle,
        reservation: Reservation::Clear,
        last_select: None,
        local_reply: false,
      },
      stats: GatewayStats::default(),
    }
  }

  pub fn pacing(&self) -> Pacing {
    *self.pacing.get()
  }

  pub fn reservation(&self) -> Reservation {
    *self.reservation.get()
  }

  /// A host transaction is open (forwarded or answered locally next tick).
  pub fn busy(&self) -> bool {
    self.pending.get().is_some() || *self.local_reply.get()
  }

  pub fn stats(&self) -> &GatewayStats {
    &self.stats
  }

  /// Fabric request of the current tick.
  pub fn output(&self) -> &Request {
    &self.out
  }

  fn slave_select(&self, address: u64) -> Target {
    self.map.decode(address)
  }

  fn fabric_request(&self, req: &HostRequest, strobe: bool) -> Request {
    Request {
      address: req.address,
      write_data: req.write_data,
      byte_select: req.byte_select,
      write_enable: req.write_enable,
      strobe,
      cycle_active: true,
    }
  }

  /// Host side in, fabric request out.
  pub fn drive(&mut self, host: &HostRequest) -> Request {
    let pending = *self.pending.get();
    let pacing = *self.pacing.get();
    let mut staged = Staged {
      pending,
      pacing,
      reservation: *self.reservation.get(),
      last_select: *self.last_select.get(),
      local_reply: false,
    };
    let mut strobe_event = None;

    let accept = host.strobe && !self.busy();
    if host.strobe && !accept {
      warn!("{}: host strobe at {:#x} while a transaction is open, ignored", self.name, host.address);
      self.stats.dropped_strobes += 1;
    }

    self.out = if accept {
      let bus = self.map.bus();
      let req = HostRequest {
        address: host.address & bus.address_mask(),
        write_data: host.write_data & bus.data_mask(),
        byte_select: host.byte_select & bus.byte_select_mask(),
        ..*host
      };
      let reserved = staged.reservation.covers(req.address);
      staged.reservation = match req.atomic {
        AtomicKind::LoadReserved => Reservation::Armed(req.address),
        _ => Reservation::Clear,
      };

      if req.atomic == AtomicKind::StoreConditional && !reserved {
        debug!("{}: sc at {:#x} without reservation, failing locally", self.name, req.address);
        staged.local_reply = true;
        self.stats.sc_local_failures += 1;
        Request::idle()
      } else {
        self.stats.forwarded += 1;
        let same_slave = staged.last_select == Some(self.slave_select(req.address));
        strobe_event = Some(same_slave);
        if pacing.must_pause(same_slave) {
          self.stats.pauses += 1;
          staged.pending = Some(Pending {
            req,
            issued: false,
            strobe: true,
          });
          Request::idle()
        } else {
          staged.pending = Some(Pending {
            req,
            issued: true,
            strobe: true,
          });
          self.fabric_request(&req, true)
        }
      }
    } else {
      match pending {
        Some(p) if !p.issued => {
          staged.pending = Some(Pending { issued: true, ..p });
          self.fabric_request(&p.req, true)
        },
        Some(p) => {
          if p.strobe && self.kind == ChannelKind::Pipelined {
            self.stats.stall_repeats += 1;
          }
          self.fabric_request(&p.req, p.strobe)
        },
        None => Request::idle(),
      }
    };

    staged.pacing = pacing.next(strobe_event, false);
    self.staged = staged;
    self.out
  }

  /// Fabric response in, host response out.
  pub fn complete(&mut self, resp: &Response) -> HostResponse {
    let mut host = HostResponse::default();

    if self.out.cycle_active {
      if let Some(mut p) = self.staged.pending {
        if self.out.strobe {
          p.strobe = self.kind == ChannelKind::Simple || resp.stall;
        }
        if resp.is_done() {
          host = HostResponse {
            ack: resp.ack,
            err: resp.err,
            read_data: resp.read_data,
          };
          if p.req.atomic == AtomicKind::StoreConditional && resp.ack {
            host.read_data = (host.read_data & !1) | SC_SUCCESS;
          }
          if resp.err {
            self.stats.errors += 1;
            self.staged.reservation = Reservation::Clear;
          }
          self.stats.completed += 1;
          self.staged.last_select = Some(self.slave_select(p.req.address));
          self.staged.pacing = Pacing::JustAcked;
          self.staged.pending = None;
        } else {
          self.staged.pending = Some(p);
        }
      }
    }

    if *self.local_reply.get() {
      host = HostResponse {
        ack: true,
        err: false,
        read_data: SC_FAILURE,
      };
    }

    let staged = self.staged;
    self.pending.set(staged.pending);
    self.pacing.set(staged.pacing);
    self.reservation.set(staged.reservation);
    self.last_select.set(staged.last_select);
    self.local_reply.set(staged.local_reply);
    host
  }
}

impl Module for ProtocolGateway {
  fn name(&self) -> &str {
    &self.name
  }

  fn commit(&mut self) {
    self.pending.commit();
    self.pacing.commit();
    self.reservation.commit();
    self.last_select.commit();
    self.local_reply.commit();
  }

  fn reset(&mut self) {
    self.pending.reset();
    self.pacing.reset();
    self.reservation.reset();
    self.last_select.reset();
    self.local_reply.reset();
    self.out = Request::idle();
    self.stats = GatewayStats::default();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bus::BusConfig;
  use crate::fabric::MemoryMapEntry;

  fn map() -> MemoryMap {
    MemoryMap::new(
      vec![
        MemoryMapEntry::new(0x0000_0000, 0x1000),
        MemoryMapEntry::new(0x0000_2000, 0x1000),
        MemoryMapEntry::new(0x5000_0000, 0x100),
        MemoryMapEntry::new(0x8000_0000, 0x0200_0000),
      ],
      BusConfig::default(),
    )
    .unwrap()
  }

  fn gateway() -> ProtocolGateway {
    ProtocolGateway::new("gw", map(), ChannelKind::Pipelined)
  }

  fn tick(gw: &mut ProtocolGateway, host: HostRequest, resp: Response) -> (Request, HostResponse) {
    let out = gw.drive(&host);
    let host_resp = gw.complete(&resp);
    gw.commit();
    (out, host_resp)
  }

  const IDLE: HostRequest = HostRequest {
    address: 0,
    write_data: 0,
    byte_select: 0,
    write_enable: false,
    strobe: false,
    atomic: AtomicKind::Plain,
  };

  #[test]
  fn test_holds_cycle_and_repeats_stalled_strobe() {
    let mut gw = gateway();
    let (out, _) = tick(&mut gw, HostRequest::read(0x100), Response::stalled());
    assert!(out.is_strobe());
    let (out, _) = tick(&mut gw, IDLE, Response::stalled());
    assert!(out.is_strobe());
    let (out, _) = tick(&mut gw, IDLE, Response::idle());
    assert!(out.is_strobe());
    let (out, resp) = tick(&mut gw, IDLE, Response::idle());
    assert!(out.cycle_active && !out.strobe);
    assert!(!resp.is_done());
    let (out, resp) = tick(&mut gw, IDLE, Response::acked(0x55));
    assert!(out.cycle_active);
    assert_eq!(resp, HostResponse { ack: true, err: false, read_data: 0x55 });
    let (out, _) = tick(&mut gw, IDLE, Response::idle());
    assert!(!out.cycle_active);
    assert_eq!(gw.stats().stall_repeats, 2);
  }

  #[test]
  fn test_same_slave_back_to_back() {
    let mut gw = gateway();
    tick(&mut gw, HostRequest::read(0x100), Response::idle());
    tick(&mut gw, IDLE, Response::acked(1));
    assert_eq!(gw.pacing(), Pacing::JustAcked);
    let (out, _) = tick(&mut gw, HostRequest::read(0x104), Response::idle());
    assert!(out.is_strobe());
    assert_eq!(gw.stats().pauses, 0);
  }

  #[test]
  fn test_large_window_is_one_slave() {
    let mut gw = gateway();
    tick(&mut gw, HostRequest::read(0x8000_0000), Response::idle());
    tick(&mut gw, IDLE, Response::acked(1));
    let (out, _) = tick(&mut gw, HostRequest::read(0x8000_1000), Response::idle());
    assert!(out.is_strobe());
    assert_eq!(gw.stats().pauses, 0);
  }

  #[test]
  fn test_unmapped_after_mapped_pauses() {
    let mut gw = gateway();
    tick(&mut gw, HostRequest::read(0x100), Response::idle());
    tick(&mut gw, IDLE, Response::acked(1));
    let (out, _) = tick(&mut gw, HostRequest::read(0x1100), Response::idle());
    assert!(!out.cycle_active);
    assert_eq!(gw.stats().pauses, 1);
  }

  #[test]
  fn test_simple_channel_holds_strobe_until_ack() {
    let mut gw = ProtocolGateway::new("gw", map(), ChannelKind::Simple);
    let (out, _) = tick(&mut gw, HostRequest::read(0x100), Response::idle());
    assert!(out.is_strobe());
    for _ in 0..3 {
      let (out, resp) = tick(&mut gw, IDLE, Response::idle());
      assert!(out.is_strobe());
      assert!(!resp.is_done());
    }
    let (out, resp) = tick(&mut gw, IDLE, Response::acked(0x42));
    assert!(out.is_strobe());
    assert_eq!(resp.read_data, 0x42);
    let (out, _) = tick(&mut gw, IDLE, Response::idle());
    assert!(!out.cycle_active);
    assert_eq!(gw.stats().stall_repeats, 0);
  }

  #[test]
  fn test_different_slave_pauses_one_tick() {
    let mut gw = gateway();
    tick(&mut gw, HostRequest::read(0x100), Response::idle());
    tick(&mut gw, IDLE, Response::acked(1));
    let (out, _) = tick(&mut gw, HostRequest::read(0x2000), Response::idle());
    assert!(!out.cycle_active);
    assert_eq!(gw.pacing(), Pacing::Delay);
    let (out, _) = tick(&mut gw, IDLE, Response::idle());
    assert!(out.is_strobe());
    assert_eq!(out.address, 0x2000);
    assert_eq!(gw.pacing(), Pacing::Idle);
    assert_eq!(gw.stats().pauses, 1);
  }

  #[test]
  fn test_lr_then_matching_sc_is_forwarded() {
    let mut gw = gateway();
    tick(&mut gw, HostRequest::load_reserved(0x200), Response::idle());
    tick(&mut gw, IDLE, Response::acked(7));
    assert!(gw.reservation().covers(0x200));
    let (out, _) = tick(&mut gw, HostRequest::store_conditional(0x200, 9), Response::idle());
    assert!(out.is_strobe() && out.write_enable);
    let (_, resp) = tick(&mut gw, IDLE, Response::acked(0xffff_ffff));
    assert!(resp.ack);
    assert_eq!(resp.read_data & 1, SC_SUCCESS);
    assert!(!gw.reservation().is_armed());
  }

  #[test]
  fn test_lone_sc_fails_locally() {
    let mut gw = gateway();
    let (out, resp) = tick(&mut gw, HostRequest::store_conditional(0x200, 9), Response::idle());
    assert!(!out.cycle_active);
    assert!(!resp.is_done());
    let (out, resp) = tick(&mut gw, IDLE, Response::idle());
    assert!(!out.cycle_active);
    assert_eq!(resp, HostResponse { ack: true, err: false, read_data: SC_FAILURE });
    assert_eq!(gw.stats().sc_local_failures, 1);
    assert_eq!(gw.stats().forwarded, 0);
  }

  #[test]
  fn test_sc_to_other_address_fails() {
    let mut gw = gateway();
    tick(&mut gw, HostRequest::load_reserved(0x200), Response::idle());
    tick(&mut gw, IDLE, Response::acked(0));
    let (out, _) = tick(&mut gw, HostRequest::store_conditional(0x204, 1), Response::idle());
    assert!(!out.cycle_active);
    let (_, resp) = tick(&mut gw, IDLE, Response::idle());
    assert_eq!(resp.read_data, SC_FAILURE);
  }

  #[test]
  fn test_intervening_access_breaks_reservation() {
    let mut gw = gateway();
    tick(&mut gw, HostRequest::load_reserved(0x200), Response::idle());
    tick(&mut gw, IDLE, Response::acked(0));
    let (out, _) = tick(&mut gw, HostRequest::read(0x300), Response::idle());
    assert!(out.is_strobe());
    let (_, resp) = tick(&mut gw, IDLE, Response::acked(3));
    assert_eq!(resp.read_data, 3);
    assert!(!gw.reservation().is_armed());
  }

  #[test]
  fn test_err_passes_through_and_clears_reservation() {
    let mut gw = gateway();
    tick(&mut gw, HostRequest::load_reserved(0x200), Response::idle());
    let (_, resp) = tick(&mut gw, IDLE, Response::error());
    assert!(resp.err && !resp.ack);
    assert!(!gw.reservation().is_armed());
    assert_eq!(gw.stats().errors, 1);
  }

  #[test]
  fn test_strobe_while_busy_is_dropped() {
    let mut gw = gateway();
    tick(&mut gw, HostRequest::read(0x100), Response::idle());
    let (out, _) = tick(&mut gw, HostRequest::read(0x2000), Response::idle());
    assert_eq!(out.address, 0x100);
    assert_eq!(gw.stats().dropped_strobes, 1);
  }
}
