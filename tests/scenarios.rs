use wbfabric::gateway::{SC_FAILURE, SC_SUCCESS};
use wbfabric::master::HostOp;
use wbfabric::simulator::config::config::parse_config;
use wbfabric::System;

const PORT0_ID: u64 = 0x1111_0000;
const PORT1_ID: u64 = 0x2222_0000;

fn system(toml: &str) -> System {
  let config = parse_config(toml).unwrap();
  System::from_config(&config).unwrap()
}

const MEMORIES: &str = r#"
  [[slave]]
  name = "sram"
  base = 0x2000_0000
  size = 0x1000

  [[slave]]
  name = "gpio"
  base = 0x5000_0000
  size = 0x100

  [[slave]]
  name = "sdram"
  base = 0x8000_0000
  size = 0x0200_0000
"#;

fn with_masters(masters: &str) -> System {
  system(&format!("{}\n{}", MEMORIES, masters))
}

fn address_of(op: &HostOp) -> u64 {
  match *op {
    HostOp::Read { address }
    | HostOp::Write { address, .. }
    | HostOp::LoadReserved { address }
    | HostOp::StoreConditional { address, .. } => address,
    HostOp::Idle { .. } => unreachable!(),
  }
}

#[test]
fn test_dual_port_routing_three_masters() {
  let mut sys = system(
    r#"
    [[slave]]
    name = "port0"
    kind = "constant"
    base = 0x0000_0000
    size = 0x1000
    value = 0x1111_0000

    [[slave]]
    name = "port1"
    kind = "constant"
    base = 0x8000_0000
    size = 0x0200_0000
    value = 0x2222_0000

    [[master]]
    name = "m0"
    program = [{ op = "read", address = 0x0000_0000 }, { op = "read", address = 0x8000_0100 }]

    [[master]]
    name = "m1"
    program = [{ op = "read", address = 0x8000_0000 }, { op = "read", address = 0x0000_0010 }]

    [[master]]
    name = "m2"
    program = [{ op = "read", address = 0x0000_0000 }, { op = "read", address = 0x81ff_fffc }]
    "#,
  );

  sys.run_until_done(200);
  assert!(sys.is_done());

  for port in sys.masters() {
    let done = port.core.completions();
    assert_eq!(done.len(), 2, "{}", port.core.name());
    for c in done {
      assert!(c.ack && !c.err);
      let expected = if address_of(&c.op) >= 0x8000_0000 { PORT1_ID } else { PORT0_ID };
      assert_eq!(c.read_data, expected, "{} {:?}", port.core.name(), c.op);
    }
  }
}

#[test]
fn test_lr_sc_without_interruption_succeeds() {
  let mut sys = with_masters(
    r#"
    [[master]]
    name = "hart"
    program = [
      { op = "load_reserved", address = 0x2000_0000 },
      { op = "store_conditional", address = 0x2000_0000, data = 0x77 },
      { op = "read", address = 0x2000_0000 },
    ]
    "#,
  );

  sys.run_until_done(100);
  let done = sys.master(0).core.completions();
  assert_eq!(done.len(), 3);
  assert!(done[1].ack);
  assert_eq!(done[1].read_data & 1, SC_SUCCESS);
  assert_eq!(done[2].read_data, 0x77);
  assert_eq!(sys.stats().sc_local_failures, 0);
}

#[test]
fn test_intervening_read_fails_store_conditional() {
  let mut sys = with_masters(
    r#"
    [[master]]
    name = "hart"
    program = [
      { op = "load_reserved", address = 0x2000_0000 },
      { op = "read", address = 0x5000_0000 },
      { op = "store_conditional", address = 0x2000_0000, data = 0x77 },
      { op = "read", address = 0x2000_0000 },
    ]
    "#,
  );

  sys.run_until_done(100);
  let done = sys.master(0).core.completions();
  assert_eq!(done.len(), 4);
  assert!(done[2].ack && !done[2].err);
  assert_eq!(done[2].read_data, SC_FAILURE);
  assert_eq!(done[2].latency(), 1);
  // the store never reached memory
  assert_eq!(done[3].read_data, 0);
  assert_eq!(sys.stats().sc_local_failures, 1);
}

#[test]
fn test_lone_and_mismatched_store_conditional_fail() {
  let mut sys = with_masters(
    r#"
    [[master]]
    name = "hart"
    program = [
      { op = "store_conditional", address = 0x2000_0000, data = 1 },
      { op = "load_reserved", address = 0x2000_0000 },
      { op = "store_conditional", address = 0x2000_0004, data = 1 },
    ]
    "#,
  );

  sys.run_until_done(100);
  let done = sys.master(0).core.completions();
  assert_eq!(done[0].read_data, SC_FAILURE);
  assert_eq!(done[2].read_data, SC_FAILURE);
  assert_eq!(sys.stats().sc_local_failures, 2);
}

#[test]
fn test_window_edge_and_unmapped_error() {
  let mut sys = with_masters(
    r#"
    [[master]]
    name = "past"
    program = [{ op = "read", address = 0x8200_0000 }]

    [[master]]
    name = "last"
    program = [{ op = "read", address = 0x81ff_fffc }]
    "#,
  );

  let view = sys.tick().clone();
  let sink = sys.crossbar().error_port();
  assert_eq!(view.grants[sink], Some(0));
  assert_eq!(view.grants[2], Some(1));

  let view = sys.tick().clone();
  assert!(view.master_responses[0].err);
  assert!(view.master_responses[1].ack);

  sys.run_until_done(20);
  let past = sys.master(0).core.completions()[0];
  assert!(past.err && !past.ack);
  assert_eq!(past.latency(), 1);
  let last = sys.master(1).core.completions()[0];
  assert!(last.ack && !last.err);
}

#[test]
fn test_remapped_master_reaches_translated_window() {
  let mut sys = with_masters(
    r#"
    [[master]]
    name = "remapped"
    remap = [{ from = 0x8000_0000, to = 0x8100_0000, size = 0x0100_0000 }]
    program = [{ op = "write", address = 0x8000_0010, data = 0xabcd }]

    [[master]]
    name = "direct"
    program = [
      { op = "idle", ticks = 6 },
      { op = "read", address = 0x8100_0010 },
      { op = "read", address = 0x8000_0010 },
    ]
    "#,
  );

  sys.run_until_done(100);
  let done = sys.master(1).core.completions();
  assert_eq!(done[0].read_data, 0xabcd);
  assert_eq!(done[1].read_data, 0);
}

#[test]
fn test_simple_channel_contention_completes() {
  let mut sys = system(
    r#"
    [bus]
    channel = "simple"

    [[slave]]
    name = "id"
    kind = "constant"
    base = 0x0
    size = 0x1000
    value = 0x5a

    [[slave]]
    name = "ram"
    base = 0x1000
    size = 0x1000
    latency = 2
    stall = 1

    [[master]]
    name = "m0"
    program = [
      { op = "read", address = 0x0 },
      { op = "write", address = 0x1000, data = 9 },
      { op = "read", address = 0x1000 },
    ]

    [[master]]
    name = "m1"
    program = [
      { op = "read", address = 0x0 },
      { op = "write", address = 0x1004, data = 5 },
      { op = "read", address = 0x1004 },
    ]
    "#,
  );

  sys.run_until_done(200);
  assert!(sys.is_done());
  for (port, written) in sys.masters().iter().zip([9, 5]) {
    let done = port.core.completions();
    assert_eq!(done.len(), 3, "{}", port.core.name());
    assert!(done.iter().all(|c| c.ack && !c.err));
    assert_eq!(done[0].read_data, 0x5a);
    assert_eq!(done[2].read_data, written);
  }
  assert_eq!(sys.stats().stall_repeats, 0);
}

#[test]
fn test_adjacent_windows_read_their_own_slave() {
  let mut sys = system(
    r#"
    [[slave]]
    name = "a"
    kind = "constant"
    base = 0x0
    size = 0x1000
    value = 0xaaaa

    [[slave]]
    name = "b"
    kind = "constant"
    base = 0x1000
    size = 0x1000
    value = 0xbbbb

    [[master]]
    name = "m"
    program = [{ op = "read", address = 0x0 }, { op = "read", address = 0x1000 }]
    "#,
  );

  sys.run_until_done(20);
  let done = sys.master(0).core.completions();
  assert_eq!(done[0].read_data, 0xaaaa);
  assert_eq!(done[1].read_data, 0xbbbb);
  assert_eq!(sys.stats().pauses, 1);
}
