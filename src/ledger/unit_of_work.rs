//! # Unit of Work
//!
//! A [`UnitOfWork`] stages writes against a [`LedgerStore`] and hands them over as a
//! single [`ChangeSet`] on [`UnitOfWork::commit`]. Until then nothing leaves the
//! process: reads made through the unit of work see its own staged rows first and
//! the store second, and dropping it (explicitly via [`UnitOfWork::rollback`], or by
//! cancelling the surrounding future) discards every staged change.
//!
//! A saved book is staged as a move of its available copies relative to the row
//! this unit read. The store applies that move to whatever the row holds at commit
//! time, so a unit that read a stale counter cannot overwrite a newer one.
//!
//! ```ignore
//! let mut uow = UnitOfWork::begin(&store);
//! let mut book = uow.get_book(book_id).await?;
//! let tx = uow.create_transaction(member_id, book_id, Utc::now()).await?;
//! book.copies_available -= 1;
//! uow.save_book(book)?;
//! uow.commit().await?;
//! ```

use crate::ledger::{Change, ChangeSet, LedgerError, LedgerStore};
use crate::model::{Book, BookId, MemberId, Transaction, TransactionId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

pub struct UnitOfWork<'a, S: LedgerStore> {
    store: &'a S,
    changes: ChangeSet,
    // Book rows as this unit sees them, store reads plus staged moves
    books: HashMap<BookId, Book>,
    transactions: HashMap<TransactionId, Transaction>,
    // `None` marks a pair known to have no active loan
    active: HashMap<(MemberId, BookId), Option<TransactionId>>,
    finished: bool,
}

impl<'a, S: LedgerStore> UnitOfWork<'a, S> {
    pub fn begin(store: &'a S) -> Self {
        Self {
            store,
            changes: ChangeSet::new(),
            books: HashMap::new(),
            transactions: HashMap::new(),
            active: HashMap::new(),
            finished: false,
        }
    }

    pub async fn get_book(&mut self, id: BookId) -> Result<Book, LedgerError> {
        if let Some(book) = self.books.get(&id) {
            return Ok(book.clone());
        }
        let book = self.store.get_book(id).await?;
        self.books.insert(id, book.clone());
        Ok(book)
    }

    /// Stages new counters for a book read through this unit.
    ///
    /// Only `copies_available` may differ from the row as read; catalogue fields
    /// change through ledger maintenance. The copy bounds are checked here and
    /// again by the store, against its current row, at commit time.
    pub fn save_book(&mut self, book: Book) -> Result<(), LedgerError> {
        let current = self.books.get(&book.id).ok_or_else(|| {
            LedgerError::InvariantViolation(format!("{} saved without being read", book.id))
        })?;
        let catalogue_changed = Book {
            copies_available: current.copies_available,
            ..book.clone()
        } != *current;
        if catalogue_changed {
            return Err(LedgerError::ConstraintViolation(format!(
                "only the available copies of {} can change in a unit of work",
                book.id
            )));
        }
        if !book.copies_within_bounds() {
            return Err(LedgerError::InvariantViolation(format!(
                "{} would have {} of {} copies available",
                book.id, book.copies_available, book.copies_total
            )));
        }
        let delta = i64::from(book.copies_available) - i64::from(current.copies_available);
        if delta != 0 {
            self.changes.push(Change::AdjustCopies {
                book_id: book.id,
                delta,
            });
        }
        self.books.insert(book.id, book);
        Ok(())
    }

    /// The active transaction for the pair, as this unit of work sees it.
    ///
    /// The answer is remembered, so later lookups and a following
    /// [`close_transaction`](Self::close_transaction) do not go back to the store.
    pub async fn find_active_transaction(
        &mut self,
        member_id: MemberId,
        book_id: BookId,
    ) -> Result<Option<Transaction>, LedgerError> {
        let pair = (member_id, book_id);
        match self.active.get(&pair) {
            Some(Some(id)) => return Ok(self.transactions.get(id).cloned()),
            Some(None) => return Ok(None),
            None => {}
        }
        let found = self.store.find_active_transaction(member_id, book_id).await?;
        if let Some(tx) = &found {
            self.transactions.insert(tx.id, tx.clone());
        }
        self.active.insert(pair, found.as_ref().map(|tx| tx.id));
        Ok(found)
    }

    /// Stages a new active transaction for the pair.
    pub async fn create_transaction(
        &mut self,
        member_id: MemberId,
        book_id: BookId,
        checkout_date: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        if let Some(existing) = self.find_active_transaction(member_id, book_id).await? {
            return Err(LedgerError::ConstraintViolation(format!(
                "{} already has {} active for {}",
                member_id, existing.id, book_id
            )));
        }
        let tx = Transaction::open(member_id, book_id, checkout_date);
        self.active.insert(tx.pair(), Some(tx.id));
        self.transactions.insert(tx.id, tx.clone());
        self.changes.push(Change::CreateTransaction(tx.clone()));
        Ok(tx)
    }

    /// Stages the return of an active transaction and yields the closed row.
    pub async fn close_transaction(
        &mut self,
        id: TransactionId,
        return_date: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let mut tx = match self.transactions.get(&id) {
            Some(staged) => staged.clone(),
            None => self.store.get_transaction(id).await?,
        };
        if !tx.is_active() {
            return Err(LedgerError::AlreadyClosed(id));
        }
        tx.return_date = Some(return_date);
        self.active.insert(tx.pair(), None);
        self.transactions.insert(id, tx.clone());
        self.changes.push(Change::CloseTransaction { id, return_date });
        Ok(tx)
    }

    /// The changes staged so far.
    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Sends every staged change to the store as one change set.
    pub async fn commit(mut self) -> Result<(), LedgerError> {
        self.finished = true;
        if self.changes.is_empty() {
            return Ok(());
        }
        let changes = std::mem::take(&mut self.changes);
        self.store.commit(changes).await
    }

    /// Discards every staged change.
    pub fn rollback(mut self) {
        self.finished = true;
        debug!(changes = self.changes.len(), "Rolled back");
    }
}

impl<S: LedgerStore> Drop for UnitOfWork<'_, S> {
    fn drop(&mut self) {
        if !self.finished && !self.changes.is_empty() {
            debug!(changes = self.changes.len(), "Discarding uncommitted changes");
        }
    }
}
