use crate::simulator::sim::records::Record;
use crate::simulator::system::System;

pub fn print_simulation_records(records: &[Record]) {
  println!("\n--- Simulation Records ---");

  let mut sorted: Vec<&Record> = records.iter().collect();
  sorted.sort_by(|a, b| a.component.cmp(&b.component));

  let mut component = "";
  for record in sorted {
    if record.component != component {
      component = &record.component;
      println!("\n[{}]", component);
    }
    println!("  Tick {}: {} {}", record.tick, record.action, record.subject);
  }

  println!("--- End Records ---\n");
}

pub fn print_completions(system: &System) {
  for master in system.masters() {
    println!("[{}]", master.core.name());
    for c in master.core.completions() {
      let outcome = if c.err { "err" } else { "ack" };
      println!(
        "  {:>5} -> {:>5} ({} ticks) {} data={:#x} {:?}",
        c.issued,
        c.completed,
        c.latency(),
        outcome,
        c.read_data,
        c.op
      );
    }
  }
}

pub fn print_stats(system: &System) {
  let stats = system.stats();
  println!(
    "ticks={} grants={} completed={} errors={} sc_local_failures={} stall_repeats={} pauses={}",
    stats.ticks,
    stats.grants,
    stats.completed,
    stats.errors,
    stats.sc_local_failures,
    stats.stall_repeats,
    stats.pauses
  );
}
