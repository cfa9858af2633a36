#![cfg(feature = "smoke-tests")]

use std::fs;
use wbfabric::simulator::config::config::load_default_config;
use wbfabric::simulator::utils::log::init_log;
use wbfabric::Simulator;

#[test]
fn smoke_default_workload_with_trace() {
  init_log(true);
  let trace = std::env::temp_dir().join("wbfabric-smoke-trace.jsonl");

  let mut config = load_default_config().unwrap();
  config.simulation.quiet = true;
  config.simulation.trace_file = trace.to_string_lossy().to_string();

  let mut sim = Simulator::new(&config).unwrap();
  sim.run().unwrap();
  assert!(sim.system().is_done());

  let content = fs::read_to_string(&trace).unwrap();
  let lines: Vec<serde_json::Value> = content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
  assert_eq!(lines.len(), sim.records().len());
  assert!(lines.iter().all(|v| v["tick"].is_u64() && v["action"].is_string()));
  let _ = fs::remove_file(&trace);
}
