//! A single loan of one book to one member.
//!
//! A transaction is *active* while `return_date` is `None`. It is created by a
//! checkout, closed by a return, and never deleted.
use crate::model::{BookId, MemberId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Type-safe identifier for Transactions.
///
/// Transaction ids are time-ordered UUIDs minted by the unit of work that
/// creates the loan, so they are known before the ledger commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub member_id: MemberId,
    pub book_id: BookId,
    pub checkout_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Opens a new active loan.
    pub fn open(member_id: MemberId, book_id: BookId, checkout_date: DateTime<Utc>) -> Self {
        Self {
            id: TransactionId::new(),
            member_id,
            book_id,
            checkout_date,
            return_date: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// Key of the one-active-loan-per-pair constraint.
    pub fn pair(&self) -> (MemberId, BookId) {
        (self.member_id, self.book_id)
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.is_active() { "active" } else { "returned" };
        write!(f, "{} → {} ({})", self.member_id, self.book_id, status)
    }
}
