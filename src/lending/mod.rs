//! # Lending
//!
//! The checkout and return workflow.
//!
//! ## Structure
//!
//! - [`engine`] - [`LendingEngine`], the state machine run under the inventory guard
//! - [`error`] - [`LendingError`] and its [`ErrorKind`] classification
//!
//! ## Usage
//!
//! ```rust,ignore
//! let engine = LendingEngine::new(ledger_client, InventoryGuard::new());
//!
//! let tx = engine.checkout(member_id, book_id).await?;
//! let closed = engine.return_book(member_id, book_id).await?;
//!
//! match engine.checkout(member_id, book_id).await {
//!     Err(e) if e.kind() == ErrorKind::Unavailable => { /* try later */ }
//!     other => { /* ... */ }
//! }
//! ```

pub mod engine;
pub mod error;

pub use engine::LendingEngine;
pub use error::{ErrorKind, LendingError};
