//! Error types for the ledger store.

use crate::model::{BookId, MemberId, TransactionId};
use thiserror::Error;

/// Errors that can occur while reading from or committing to the ledger.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    /// The requested book does not exist.
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// The requested member does not exist.
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    /// The requested transaction does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// A return was recorded twice for the same transaction.
    #[error("Transaction already closed: {0}")]
    AlreadyClosed(TransactionId),

    /// A uniqueness rule was broken (ISBN, one active loan per member and book).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A row would leave the ledger in an impossible state
    /// (e.g. more copies available than exist).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A registration or maintenance payload was rejected.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The ledger task has stopped accepting requests.
    #[error("Ledger closed")]
    ActorClosed,

    /// The ledger task dropped the response channel.
    #[error("Ledger dropped response channel")]
    ActorDropped,
}
