use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::bus::ChannelKind;
use crate::fabric::RemapRange;
use crate::master::HostOp;
use crate::simulator::system::System;

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Bus section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusSection {
  #[serde(default = "default_address_width")]
  pub address_width: u32,
  #[serde(default = "default_data_width")]
  pub data_width: u32,
  #[serde(default)]
  pub channel: ChannelKind,
}

fn default_address_width() -> u32 {
  32
}

fn default_data_width() -> u32 {
  32
}

impl Default for BusSection {
  fn default() -> Self {
    Self {
      address_width: default_address_width(),
      data_width: default_data_width(),
      channel: ChannelKind::default(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlaveKind {
  #[default]
  Memory,
  Rom,
  Constant,
}

/// One `[[slave]]` entry; its position is its crossbar port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SlaveSection {
  pub name: String,
  pub base: u64,
  pub size: u64,
  #[serde(default)]
  pub kind: SlaveKind,
  #[serde(default = "default_latency")]
  pub latency: u32,
  #[serde(default)]
  pub stall: u32,
  /// Read value of a `constant` slave.
  #[serde(default)]
  pub value: u64,
  /// Words loaded from the window base up.
  #[serde(default)]
  pub preload: Vec<u64>,
}

fn default_latency() -> u32 {
  1
}

/// One `[[master]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MasterSection {
  pub name: String,
  #[serde(default)]
  pub remap: Vec<RemapRange>,
  #[serde(default)]
  pub program: Vec<HostOp>,
}

/// Simulation section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulationSection {
  #[serde(default)]
  pub quiet: bool,
  #[serde(default)]
  pub step_mode: bool,
  #[serde(default)]
  pub trace_file: String,
  #[serde(default = "default_max_ticks")]
  pub max_ticks: u64,
}

fn default_max_ticks() -> u64 {
  10_000
}

impl Default for SimulationSection {
  fn default() -> Self {
    Self {
      quiet: false,
      step_mode: false,
      trace_file: String::new(),
      max_ticks: default_max_ticks(),
    }
  }
}

/// Whole system description
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
  #[serde(default)]
  pub bus: BusSection,
  #[serde(default)]
  pub simulation: SimulationSection,
  #[serde(default)]
  pub slave: Vec<SlaveSection>,
  #[serde(default)]
  pub master: Vec<MasterSection>,
}

pub fn parse_config(content: &str) -> io::Result<AppConfig> {
  toml::from_str::<AppConfig>(content)
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("failed to parse TOML config: {}", e)))
}

/// The bundled system description.
pub fn load_default_config() -> io::Result<AppConfig> {
  parse_config(DEFAULT_CONFIG)
}

pub fn load_config_file(path: &Path) -> io::Result<AppConfig> {
  let content = fs::read_to_string(path)
    .map_err(|e| io::Error::new(io::ErrorKind::NotFound, format!("cannot read config file {:?}: {}", path, e)))?;
  parse_config(&content)
}

/// Merge two configs, the second one wins.
///
/// A user file that lists any slave replaces the whole slave list, the same
/// for masters; port numbers are positional so lists are never spliced.
pub fn merge_config(mut base: AppConfig, override_config: AppConfig) -> AppConfig {
  if override_config.bus != BusSection::default() {
    base.bus = override_config.bus;
  }

  if override_config.simulation.quiet {
    base.simulation.quiet = true;
  }
  if override_config.simulation.step_mode {
    base.simulation.step_mode = true;
  }
  if !override_config.simulation.trace_file.is_empty() {
    base.simulation.trace_file = override_config.simulation.trace_file;
  }
  if override_config.simulation.max_ticks != default_max_ticks() {
    base.simulation.max_ticks = override_config.simulation.max_ticks;
  }

  if !override_config.slave.is_empty() {
    base.slave = override_config.slave;
  }
  if !override_config.master.is_empty() {
    base.master = override_config.master;
  }

  base
}

pub fn apply_cli_overrides(
  config: &mut AppConfig,
  quiet: bool,
  step: bool,
  trace_file: Option<&str>,
  max_ticks: Option<u64>,
) {
  if quiet {
    config.simulation.quiet = true;
  }
  if step {
    config.simulation.step_mode = true;
  }
  if let Some(file) = trace_file {
    config.simulation.trace_file = file.to_string();
  }
  if let Some(ticks) = max_ticks {
    config.simulation.max_ticks = ticks;
  }
}

pub fn validate_config(config: &AppConfig) -> io::Result<()> {
  if config.slave.is_empty() {
    return Err(invalid("at least one [[slave]] is required"));
  }
  if config.master.is_empty() {
    return Err(invalid("at least one [[master]] is required"));
  }

  let mut names = HashSet::new();
  for name in config
    .slave
    .iter()
    .map(|s| &s.name)
    .chain(config.master.iter().map(|m| &m.name))
  {
    if name.trim().is_empty() {
      return Err(invalid("component names cannot be empty"));
    }
    if !names.insert(name) {
      return Err(invalid(&format!("duplicate component name '{}'", name)));
    }
  }

  if config.simulation.max_ticks == 0 {
    return Err(invalid("max_ticks must be greater than 0"));
  }

  // Everything the models check themselves: widths, windows, remap ranges.
  System::from_config(config).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

  Ok(())
}

fn invalid(msg: &str) -> io::Error {
  io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

/// Make relative paths relative to `root`.
pub fn resolve_paths(config: &mut AppConfig, root: &Path) -> io::Result<()> {
  if !config.simulation.trace_file.is_empty() {
    config.simulation.trace_file = resolve_single_path(&config.simulation.trace_file, root)?;
  }
  Ok(())
}

fn resolve_single_path(path_str: &str, root: &Path) -> io::Result<String> {
  if path_str.is_empty() {
    return Ok(path_str.to_string());
  }
  let path = Path::new(path_str);
  if path.is_absolute() {
    return Ok(path_str.to_string());
  }
  Ok(root.join(path).to_string_lossy().to_string())
}

/// Load and merge configs
///
/// 1. bundled default
/// 2. user file on top, if given
/// 3. CLI overrides
/// 4. relative paths
/// 5. validation
pub fn load_and_merge_configs(
  custom_config_path: Option<&str>,
  root: &Path,
  quiet: bool,
  step: bool,
  trace_file: Option<&str>,
  max_ticks: Option<u64>,
) -> io::Result<AppConfig> {
  let mut config = load_default_config()?;

  if let Some(custom_path) = custom_config_path {
    let custom_path_buf = PathBuf::from(custom_path);
    let custom_path_abs = if custom_path_buf.is_absolute() {
      custom_path_buf
    } else {
      root.join(&custom_path_buf)
    };
    let custom_config = load_config_file(&custom_path_abs)?;
    config = merge_config(config, custom_config);
  }

  apply_cli_overrides(&mut config, quiet, step, trace_file, max_ticks);
  resolve_paths(&mut config, root)?;
  validate_config(&config)?;

  Ok(config)
}
