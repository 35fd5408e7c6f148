//! Application context - loads, journals and saves a protocol instance
//!
//! Layout of the data directory:
//! - `config.json`: optional `ProtocolConfig`, defaults when absent
//! - `state.json`: serialized `ProtocolState`
//! - `prices.json`: mock oracle prices
//! - `journal/`: JSONL event journal

use ironbank_events::{EventError, EventReader, EventStore};
use ironbank_ledger::{LendingError, Protocol, ProtocolConfig, ProtocolState};
use ironbank_oracle::{MockOracle, OracleError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Application context - wires the protocol to its files
pub struct AppContext {
    pub protocol: Protocol,
    pub oracle: Arc<MockOracle>,
    pub config: ProtocolConfig,
    event_store: EventStore,
    state_path: PathBuf,
    prices_path: PathBuf,
    journal_path: PathBuf,
}

impl AppContext {
    /// Open the data directory, creating it when missing
    pub fn new(data_path: impl AsRef<Path>) -> Result<Self, ContextError> {
        let data_path = data_path.as_ref();
        let journal_path = data_path.join("journal");
        let state_path = data_path.join("state.json");
        let prices_path = data_path.join("prices.json");
        let config_path = data_path.join("config.json");

        std::fs::create_dir_all(&journal_path)?;

        let config = if config_path.exists() {
            ProtocolConfig::from_file(&config_path)?
        } else {
            ProtocolConfig::default()
        };

        let state = if state_path.exists() {
            ProtocolState::load(&state_path)?
        } else {
            ProtocolState::new(&config)?
        };

        let oracle = if prices_path.exists() {
            Arc::new(MockOracle::load(&prices_path)?)
        } else {
            Arc::new(MockOracle::new())
        };

        let last_journaled = EventReader::from_directory(&journal_path)?.last_sequence()?;
        let event_store = EventStore::new(&journal_path, last_journaled)?;

        tracing::debug!(
            data = %data_path.display(),
            block = state.block,
            last_journaled,
            "Context loaded"
        );

        Ok(Self {
            protocol: Protocol::from_state(state, oracle.clone()),
            oracle,
            config,
            event_store,
            state_path,
            prices_path,
            journal_path,
        })
    }

    /// Journal new events, drop them from the state, then persist state and
    /// prices.
    ///
    /// Returns the number of events journaled.
    pub fn commit(&mut self) -> Result<usize, ContextError> {
        let pending = self.protocol.events().since(self.event_store.last_sequence());
        let written = self.event_store.append_all(pending)?;
        self.protocol.prune_events(self.event_store.last_sequence());

        let state = self.protocol.state();
        state.save(&self.state_path)?;
        self.oracle.save(&self.prices_path)?;

        tracing::info!(written, block = state.block, "State committed");
        Ok(written)
    }

    /// True once `init` has written a state file
    pub fn is_initialized(&self) -> bool {
        self.state_path.exists()
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Highest journaled event sequence
    pub fn last_sequence(&self) -> u64 {
        self.event_store.last_sequence()
    }
}

/// Errors while loading or committing the data directory
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Lending(#[from] LendingError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Event store error: {0}")]
    Event(#[from] EventError),
}
