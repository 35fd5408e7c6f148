//! Round trip of the in-memory log through the JSONL journal

use ironbank_core::{AccountId, Amount, MarketId};
use ironbank_events::{EventError, EventLog, EventReader, EventStore, ProtocolEvent};

fn mint(minter: &str, amount: u128) -> ProtocolEvent {
    ProtocolEvent::Mint {
        market: MarketId::new("crUSDC"),
        minter: AccountId::new(minter),
        mint_amount: Amount::new(amount),
        mint_tokens: Amount::new(amount * 50),
    }
}

#[test]
fn test_store_and_replay() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let mut log = EventLog::new();
    log.emit(mint("alice", 100));
    log.emit(mint("bob", 200));

    {
        let mut store = EventStore::new(dir.path(), 0)?;
        assert_eq!(store.append_all(log.records())?, 2);
    }

    let reader = EventReader::from_directory(dir.path())?;
    let records = reader.read_all()?;
    assert_eq!(records, log.records());
    assert_eq!(reader.last_sequence()?, 2);
    assert_eq!(reader.count()?, 2);
    Ok(())
}

#[test]
fn test_incremental_append() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut log = EventLog::new();
    log.emit(mint("alice", 100));

    EventStore::new(dir.path(), 0)?.append_all(log.records())?;

    log.emit(mint("bob", 200));
    let journaled = EventReader::from_directory(dir.path())?.last_sequence()?;
    let mut store = EventStore::new(dir.path(), journaled)?;
    assert_eq!(store.append_all(log.since(journaled))?, 1);
    drop(store);

    assert_eq!(EventReader::from_directory(dir.path())?.count()?, 2);
    Ok(())
}

#[test]
fn test_rejects_replayed_sequence() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut log = EventLog::new();
    log.emit(mint("alice", 100));

    let mut store = EventStore::new(dir.path(), 1)?;
    let result = store.append(&log.records()[0]);
    assert!(matches!(result, Err(EventError::OutOfOrder { last: 1, got: 1 })));
    Ok(())
}

#[test]
fn test_empty_directory() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let reader = EventReader::from_directory(dir.path().join("missing"))?;
    assert!(reader.read_all()?.is_empty());
    assert_eq!(reader.last_sequence()?, 0);
    Ok(())
}
