use log::LevelFilter;
use std::fs::File;
use std::io::{BufWriter, Result, Write};

use super::records::Record;
use crate::simulator::system::System;

/// Advance the system by one tick, print what happened and append it to the
/// trace. Returns the records of that tick.
pub fn model_step(system: &mut System, trace_writer: &mut Option<BufWriter<File>>) -> Result<Vec<Record>> {
  system.tick();
  let records = system.take_records();

  if log::max_level() >= LevelFilter::Info {
    for record in records.iter() {
      println!(
        "[REC] t={} {}:{} | {}",
        record.tick, record.component, record.action, record.subject
      );
    }
  }

  if let Some(writer) = trace_writer {
    for record in records.iter() {
      writeln!(writer, "{}", serde_json::to_string(record)?)?;
    }
    writer.flush()?;
  }

  Ok(records)
}
