//! Iron Bank RPC - operator CLI
//!
//! This crate provides the `ironbank` binary and command orchestration over
//! a protocol instance persisted in a data directory.

pub mod commands;
pub mod context;

pub use context::{AppContext, ContextError};
