use clap::Parser;
use std::env;
use wbfabric::simulator::config::config::load_and_merge_configs;
use wbfabric::simulator::utils::log::init_log;
use wbfabric::simulator::Simulator;

/// wbfabric - cycle model of a pipelined bus fabric
#[derive(Parser, Debug)]
#[command(name = "wbfabric")]
#[command(version = "0.1.0")]
#[command(about = "Cycle-accurate crossbar, gateway and slave model", long_about = None)]
struct Args {
  /// System description (TOML), merged over the bundled default
  #[arg(short, long, value_name = "FILE")]
  config: Option<String>,

  /// Enable step mode (interactive stepping)
  #[arg(short, long)]
  step: bool,

  /// Quiet mode (suppress log messages and the record dump)
  #[arg(short, long)]
  quiet: bool,

  /// Output trace file path (JSON lines)
  #[arg(long, value_name = "FILE")]
  trace_file: Option<String>,

  /// Stop after this many ticks
  #[arg(long, value_name = "N")]
  max_ticks: Option<u64>,
}

fn main() -> std::io::Result<()> {
  let args = Args::parse();

  let root = env::current_dir()?;
  let config = load_and_merge_configs(
    args.config.as_deref(),
    &root,
    args.quiet,
    args.step,
    args.trace_file.as_deref(),
    args.max_ticks,
  )?;
  // after the merge so a config file can ask for quiet too
  init_log(config.simulation.quiet);

  let mut simulator = Simulator::new(&config)?;
  simulator.run()
}
