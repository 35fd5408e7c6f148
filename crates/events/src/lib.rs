//! Iron Bank Events - domain events and JSONL event store
//!
//! Every state-changing protocol call emits `ProtocolEvent`s into the
//! in-memory `EventLog`. The operator CLI journals them to date-rotated JSONL
//! files through `EventStore` and replays them with `EventReader`.

pub mod error;
pub mod event;
pub mod log;
pub mod reader;
pub mod store;

pub use error::EventError;
pub use event::ProtocolEvent;
pub use log::{EventLog, EventMark, EventRecord};
pub use reader::EventReader;
pub use store::EventStore;
