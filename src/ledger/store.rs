//! # The Ledger Boundary
//!
//! [`LedgerStore`] is the contract the lending engine and the query facade consume.
//! Reads go straight to the store; writes are never issued one by one. They are
//! staged in a [`UnitOfWork`](crate::ledger::UnitOfWork) and handed over as a single
//! [`ChangeSet`] that the store applies all-or-nothing.
//!
//! The store re-validates every change at commit time (copy bounds, one active loan
//! per member and book, closed loans stay closed). Book counters travel as relative
//! moves and are applied to the row as it is at commit time, never to the copy a
//! caller read earlier. This is what keeps the ledger consistent when callers do
//! not share an in-process guard.

use crate::ledger::LedgerError;
use crate::model::{Book, BookId, Member, MemberId, Transaction, TransactionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A single staged write.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Move a book's available copies by `delta` (negative for a checkout).
    /// Rejected if the stored counter would leave `0..=copies_total`.
    AdjustCopies { book_id: BookId, delta: i64 },
    /// Insert a new, active transaction.
    CreateTransaction(Transaction),
    /// Set the return time of an active transaction.
    CloseTransaction {
        id: TransactionId,
        return_date: DateTime<Utc>,
    },
}

/// An ordered batch of writes committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }
}

impl FromIterator<Change> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Self {
            changes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Durable, key-addressed storage for members, books and transactions.
///
/// Implementations must apply [`LedgerStore::commit`] atomically: either every
/// change in the set becomes visible, or none does and an error explains the
/// first change that was rejected.
#[async_trait]
pub trait LedgerStore: Clone + Send + Sync + 'static {
    async fn get_member(&self, id: MemberId) -> Result<Member, LedgerError>;

    async fn get_book(&self, id: BookId) -> Result<Book, LedgerError>;

    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError>;

    /// The active transaction for a member and book, if any.
    async fn find_active_transaction(
        &self,
        member_id: MemberId,
        book_id: BookId,
    ) -> Result<Option<Transaction>, LedgerError>;

    /// All books ordered by title then author, optionally only those with a copy on the shelf.
    async fn list_books(&self, available_only: bool) -> Result<Vec<Book>, LedgerError>;

    /// A member's transactions, newest checkout first.
    async fn list_transactions(
        &self,
        member_id: MemberId,
        active_only: bool,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Applies a change set all-or-nothing.
    async fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError>;
}
