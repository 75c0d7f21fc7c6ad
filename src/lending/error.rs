//! Error types for the lending engine and the query facade.

use crate::guard::GuardError;
use crate::ledger::LedgerError;
use crate::model::{BookId, MemberId, TransactionId};
use thiserror::Error;

/// Errors returned by checkout, return and the read-only queries.
///
/// Every variant maps onto an [`ErrorKind`] via [`LendingError::kind`], which is
/// what a calling layer should switch on when choosing a status code.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LendingError {
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// The caller is not an active member, or does not own the transaction.
    #[error("Forbidden: {0} may not perform this operation")]
    Forbidden(MemberId),

    /// No copy of the book is on the shelf.
    #[error("No copies of {0} are available")]
    Unavailable(BookId),

    #[error("{member} already has {book} checked out")]
    AlreadyCheckedOut { member: MemberId, book: BookId },

    #[error("{member} has no active checkout of {book}")]
    NoActiveCheckout { member: MemberId, book: BookId },

    #[error("Transaction already closed: {0}")]
    AlreadyClosed(TransactionId),

    /// Waiting for the book's guard took longer than the configured timeout.
    #[error("{0} is busy, try again")]
    Busy(BookId),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The ledger is unreachable or answered with something it never should.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`LendingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Unavailable,
    AlreadyCheckedOut,
    NoActiveCheckout,
    AlreadyClosed,
    ConstraintViolation,
    InvariantViolation,
    Busy,
    Internal,
}

impl ErrorKind {
    /// Kinds that indicate a fault in the system rather than a refused request.
    /// These should reach an operator.
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            ErrorKind::ConstraintViolation | ErrorKind::InvariantViolation | ErrorKind::Internal
        )
    }
}

impl LendingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingError::BookNotFound(_)
            | LendingError::MemberNotFound(_)
            | LendingError::TransactionNotFound(_) => ErrorKind::NotFound,
            LendingError::Forbidden(_) => ErrorKind::Forbidden,
            LendingError::Unavailable(_) => ErrorKind::Unavailable,
            LendingError::AlreadyCheckedOut { .. } => ErrorKind::AlreadyCheckedOut,
            LendingError::NoActiveCheckout { .. } => ErrorKind::NoActiveCheckout,
            LendingError::AlreadyClosed(_) => ErrorKind::AlreadyClosed,
            LendingError::Busy(_) => ErrorKind::Busy,
            LendingError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            LendingError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            LendingError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<LedgerError> for LendingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::BookNotFound(id) => LendingError::BookNotFound(id),
            LedgerError::MemberNotFound(id) => LendingError::MemberNotFound(id),
            LedgerError::TransactionNotFound(id) => LendingError::TransactionNotFound(id),
            LedgerError::AlreadyClosed(id) => LendingError::AlreadyClosed(id),
            LedgerError::ConstraintViolation(msg) => LendingError::ConstraintViolation(msg),
            LedgerError::InvariantViolation(msg) => LendingError::InvariantViolation(msg),
            // Lending never sends registration payloads, so this is a fault
            LedgerError::Validation(msg) => LendingError::Internal(msg),
            LedgerError::ActorClosed | LedgerError::ActorDropped => {
                LendingError::Internal(err.to_string())
            }
        }
    }
}

impl From<GuardError> for LendingError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Timeout { book_id, .. } => LendingError::Busy(book_id),
        }
    }
}
