use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Result};

use super::config::config::AppConfig;
use super::sim::mode::{SimConfig, StepMode};
use super::sim::model::model_step;
use super::sim::records::Record;
use super::sim::shell::{Command, Shell};
use super::system::System;
use super::utils::report::{print_completions, print_simulation_records, print_stats};

pub struct Simulator {
  config: SimConfig,
  system: System,
  trace_writer: Option<BufWriter<File>>,
  history: Vec<Record>,
}

impl Simulator {
  pub fn new(app: &AppConfig) -> Result<Self> {
    let config = SimConfig::from(app);
    let system = System::from_config(app).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let trace_writer = match &config.trace_file {
      Some(path) => {
        info!("writing trace to {}", path);
        Some(BufWriter::new(File::create(path)?))
      },
      None => None,
    };

    Ok(Self {
      config,
      system,
      trace_writer,
      history: Vec::new(),
    })
  }

  pub fn system(&self) -> &System {
    &self.system
  }

  /// Every record produced so far.
  pub fn records(&self) -> &[Record] {
    &self.history
  }

  pub fn run(&mut self) -> Result<()> {
    match self.config.step_mode {
      StepMode::Continuous => self.run_continuous()?,
      StepMode::Step => self.run_step_mode()?,
    }
    if !self.config.quiet {
      print_simulation_records(&self.history);
      print_completions(&self.system);
    }
    print_stats(&self.system);
    Ok(())
  }

  fn finished(&self) -> bool {
    self.system.is_done() || self.system.now() >= self.config.max_ticks
  }

  pub fn run_continuous(&mut self) -> Result<()> {
    while !self.finished() {
      self.step()?;
    }
    if !self.system.is_done() {
      warn!("stopped at tick limit {} with work outstanding", self.config.max_ticks);
    }
    Ok(())
  }

  fn run_step_mode(&mut self) -> Result<()> {
    println!("Step mode - Enter to step, 'si N' to step N ticks, 'c' to continue, 'q' to quit\n");
    let mut shell = Shell::new()?;
    while !self.finished() {
      match shell.read_command()? {
        Command::Step(n) => {
          for _ in 0..n {
            if self.finished() {
              break;
            }
            self.step()?;
          }
        },
        Command::Continue => return self.run_continuous(),
        Command::Quit => break,
      }
    }
    Ok(())
  }

  pub fn step(&mut self) -> Result<()> {
    let records = model_step(&mut self.system, &mut self.trace_writer)?;
    self.history.extend(records);
    Ok(())
  }
}
