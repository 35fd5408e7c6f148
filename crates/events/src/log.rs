//! In-memory event log carried by the protocol state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::ProtocolEvent;

/// A sequenced event, stamped with the block it was emitted in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonic sequence number, starting at 1
    pub sequence: u64,
    /// Host block number at emission
    pub block: u64,
    /// Wall-clock time at emission (used for journal file rotation)
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ProtocolEvent,
}

/// Log of emitted events not yet handed to the journal.
///
/// Pruned records are gone from memory but their sequence numbers are never
/// reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
    /// Highest sequence ever emitted, pruned records included
    #[serde(default)]
    last_sequence: u64,
    /// Block stamped onto new records; set by the host before each call
    #[serde(skip)]
    block: u64,
}

/// Position in an `EventLog` to roll back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMark {
    len: usize,
    last_sequence: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block(&mut self, block: u64) {
        self.block = block;
    }

    /// Append an event and return its sequence number
    pub fn emit(&mut self, event: ProtocolEvent) -> u64 {
        let sequence = self.last_sequence() + 1;
        self.last_sequence = sequence;
        let block = self.block;
        tracing::debug!(sequence, block, event = event.name(), "Event emitted");
        self.records.push(EventRecord {
            sequence,
            block,
            timestamp: Utc::now(),
            event,
        });
        sequence
    }

    /// Sequence of the latest record, 0 when empty
    pub fn last_sequence(&self) -> u64 {
        self.records
            .last()
            .map_or(self.last_sequence, |r| r.sequence.max(self.last_sequence))
    }

    pub fn mark(&self) -> EventMark {
        EventMark {
            len: self.records.len(),
            last_sequence: self.last_sequence(),
        }
    }

    /// Drop every record emitted after `mark`
    pub fn rollback(&mut self, mark: EventMark) {
        self.records.truncate(mark.len);
        self.last_sequence = mark.last_sequence;
    }

    /// Drop records up to and including `sequence`; returns how many went
    pub fn prune_through(&mut self, sequence: u64) -> usize {
        let end = self.records.partition_point(|r| r.sequence <= sequence);
        self.last_sequence = self.last_sequence();
        self.records.drain(..end);
        end
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with a sequence strictly greater than `sequence`
    pub fn since(&self, sequence: u64) -> &[EventRecord] {
        let start = self.records.partition_point(|r| r.sequence <= sequence);
        &self.records[start..]
    }

    /// Events only, in emission order
    pub fn events(&self) -> impl Iterator<Item = &ProtocolEvent> {
        self.records.iter().map(|r| &r.event)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
