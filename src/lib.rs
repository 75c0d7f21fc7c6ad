//! # Library Lending
//!
//! > **The concurrency-safe core of a library's checkout desk.**
//!
//! This crate tracks members, books with a finite number of copies, and the loans
//! between them. It guarantees that:
//!
//! - a book's `copies_available` stays within `0..=copies_total`,
//! - a member never holds two active loans of the same book,
//! - a checkout or return is applied completely or not at all,
//!
//! no matter how many callers race for the same book.
//!
//! ## Architecture Notes
//!
//! ### 1. One Owner for All Rows
//! The [`ledger`] is a single Tokio task that owns every member, book and
//! transaction. It processes requests one at a time, so its state needs no locks.
//! Writes arrive as one [`ChangeSet`](ledger::ChangeSet) per unit of work and are
//! validated as a whole before any row changes.
//!
//! ### 2. Per-Book Exclusion
//! The [`guard`] serializes checkout and return on the same book, first come first
//! served, while different books proceed in parallel. The ledger's commit-time
//! checks back it up for callers that do not share the guard.
//!
//! ### 3. Type-Safe Error Handling
//! Each layer defines its own error type. [`LendingError::kind`](lending::LendingError::kind)
//! classifies outcomes into expected refusals (`Unavailable`, `AlreadyCheckedOut`, ...)
//! and faults that should alert an operator.
//!
//! ### 4. Observability
//! Everything logs through `tracing` with structured ids. See [`lifecycle::tracing`].
//!
//! ## Module Tour
//!
//! - [`model`]: `Member`, `Book`, `Transaction` and their ids.
//! - [`ledger`]: the store boundary, its in-memory actor, units of work and the mock.
//! - [`guard`]: the keyed mutex table.
//! - [`lending`]: checkout and return.
//! - [`query`]: read-only projections.
//! - [`lifecycle`]: [`LibrarySystem`](lifecycle::LibrarySystem) wiring and shutdown.
//! - [`config`]: environment-driven settings.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the demo with info logs
//! RUST_LOG=info cargo run
//! ```

pub mod config;
pub mod guard;
pub mod ledger;
pub mod lending;
pub mod lifecycle;
pub mod model;
pub mod query;
