#![warn(missing_docs)]
//! Deterministic testing surfaces: scripted rolls, event logs and snapshots.

mod micro_worldtest;
mod rolls;
mod snapshot;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use voxelhooks_core::SimTick;

pub use micro_worldtest::*;
pub use rolls::*;
pub use snapshot::*;

/// One line of a headless event log.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Simulation tick when the event was dispatched.
    pub tick: SimTick,
    /// Event kind label (`block_place`, `broadcast`, ...).
    pub kind: &'a str,
    /// Structured payload.
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct LogHeader<'a> {
    kind: &'a str,
    started_at: DateTime<Utc>,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    writer: BufWriter<File>,
    lines: usize,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent directories.
    ///
    /// The first line is a header carrying the wall-clock start time; every
    /// following line is an [`EventRecord`].
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        let mut sink = Self {
            writer: BufWriter::new(file),
            lines: 0,
        };
        sink.write_line(&LogHeader {
            kind: "log_start",
            started_at: Utc::now(),
        })?;
        Ok(sink)
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &EventRecord<'_>) -> Result<()> {
        self.write_line(event)
    }

    /// Number of event records written (the header isn't counted).
    pub fn records_written(&self) -> usize {
        self.lines.saturating_sub(1)
    }

    /// Flush buffered lines to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let line = serde_json::to_string(value)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn jsonl_sink_writes_header_and_records() {
        let path = std::env::temp_dir().join(format!(
            "voxelhooks-events-{}.jsonl",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let mut sink = JsonlSink::create(&path).expect("sink create");
        sink.write(&EventRecord {
            tick: SimTick(3),
            kind: "broadcast",
            payload: serde_json::json!({"message": "hello"}),
        })
        .expect("write succeeds");
        assert_eq!(sink.records_written(), 1);
        sink.flush().expect("flush");

        let contents = fs::read_to_string(&path).expect("file readable");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("log_start"));
        let record: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(record["tick"], 3);
        assert_eq!(record["payload"]["message"], "hello");
        let _ = fs::remove_file(&path);
    }
}
