//! JSONL event store - append-only writer

use crate::error::EventError;
use crate::log::EventRecord;
use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only JSONL event store, one file per day
pub struct EventStore {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
    last_sequence: u64,
}

impl EventStore {
    /// Create a new event store at the given path.
    ///
    /// `last_sequence` is the highest sequence already journaled; appends at
    /// or below it are rejected.
    pub fn new(base_path: impl AsRef<Path>, last_sequence: u64) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
            last_sequence,
        })
    }

    /// Append an event record to the store
    pub fn append(&mut self, record: &EventRecord) -> Result<(), EventError> {
        if record.sequence <= self.last_sequence {
            return Err(EventError::OutOfOrder {
                last: self.last_sequence,
                got: record.sequence,
            });
        }

        let date = record.timestamp.format("%Y-%m-%d").to_string();

        // Rotate file if date changed
        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        self.last_sequence = record.sequence;
        Ok(())
    }

    /// Append every record, in order
    pub fn append_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a EventRecord>,
    ) -> Result<usize, EventError> {
        let mut written = 0;
        for record in records {
            self.append(record)?;
            written += 1;
        }
        if written > 0 {
            tracing::debug!(written, last_sequence = self.last_sequence, "Journal appended");
        }
        Ok(written)
    }

    fn rotate_file(&mut self, date: &str) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    /// Get the path to today's file
    pub fn today_file_path(&self) -> PathBuf {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        self.base_path.join(format!("{}.jsonl", date))
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl Drop for EventStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
