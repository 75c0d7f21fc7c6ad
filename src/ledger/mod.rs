//! Durable record of members, books and transactions.
//!
//! The ledger is one sequential task that owns every row. Callers talk to it
//! through a cloneable [`LedgerClient`], which implements the [`LedgerStore`]
//! boundary consumed by the lending engine and the query facade.
//!
//! # Main Components
//!
//! - [`LedgerStore`] - The storage contract: keyed reads plus atomic commits
//! - [`LedgerActor`] - The in-memory implementation, processing requests one at a time
//! - [`LedgerClient`] - Type-safe handle to a running actor
//! - [`UnitOfWork`] - Stages writes and commits them as one [`ChangeSet`]
//! - [`LedgerError`] - Store-level failures
//!
//! # Testing
//!
//! See the [`mock`] module for utilities to test ledger consumers without spawning
//! the actor.

mod actor;
mod client;
mod error;
mod message;
pub mod mock;
mod store;
mod tables;
mod unit_of_work;

pub use actor::LedgerActor;
pub use client::LedgerClient;
pub use error::LedgerError;
pub use message::{LedgerRequest, Response};
pub use store::{Change, ChangeSet, LedgerStore};
pub use tables::Tables;
pub use unit_of_work::UnitOfWork;

/// Creates a ledger actor and its client. Spawn [`LedgerActor::run`] to start serving.
pub fn new(buffer_size: usize) -> (LedgerActor, LedgerClient) {
    LedgerActor::new(buffer_size)
}
