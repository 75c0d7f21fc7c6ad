//! # Lending Engine
//!
//! Checkout and return, composed from ledger reads and one unit of work under the
//! book's guard.
//!
//! ## Checkout
//!
//! Preconditions run first and fail fast, before anything is locked:
//!
//! 1. the member must exist and be active (`Forbidden`),
//! 2. the book must exist (`BookNotFound`).
//!
//! Then, holding the book's guard, the engine re-reads the book and decides on
//! that fresh copy only. A read taken before the guard may be stale by the time
//! the guard is granted:
//!
//! 1. no copy on the shelf → `Unavailable`,
//! 2. an active loan for the member and book → `AlreadyCheckedOut`,
//! 3. open a transaction and take one copy off the shelf, committed together.
//!
//! ## Return
//!
//! Under the book's guard: locate the member's active loan (`NoActiveCheckout`),
//! close it, and put the copy back. A return that would lift `copies_available`
//! above `copies_total` is refused with `InvariantViolation`; the counter is never
//! clamped.
//!
//! Any failure after the unit of work has begun drops it, so nothing reaches the
//! ledger. Faults (`ConstraintViolation`, `InvariantViolation`, an unreachable
//! ledger) are logged at `error` level; refused requests at `warn`.

use crate::guard::{BookLease, InventoryGuard};
use crate::ledger::{LedgerClient, LedgerError, LedgerStore, UnitOfWork};
use crate::lending::LendingError;
use crate::model::{BookId, Member, MemberId, Transaction, TransactionId};
use chrono::Utc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// The lending state machine. Holds no state of its own beyond the shared guard.
#[derive(Clone)]
pub struct LendingEngine<S: LedgerStore = LedgerClient> {
    store: S,
    guard: InventoryGuard,
    guard_timeout: Option<Duration>,
}

impl<S: LedgerStore> LendingEngine<S> {
    pub fn new(store: S, guard: InventoryGuard) -> Self {
        Self {
            store,
            guard,
            guard_timeout: None,
        }
    }

    /// Bounds how long a call waits for a contended book. `None` waits indefinitely.
    pub fn with_guard_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.guard_timeout = timeout;
        self
    }

    pub fn guard(&self) -> &InventoryGuard {
        &self.guard
    }

    /// Lends one copy of `book_id` to `member_id` and returns the new, active transaction.
    #[instrument(skip(self))]
    pub async fn checkout(&self, member_id: MemberId, book_id: BookId) -> Result<Transaction, LendingError> {
        self.try_checkout(member_id, book_id).await.inspect_err(report)
    }

    /// Returns the member's active loan of `book_id` and yields the closed transaction.
    #[instrument(skip(self))]
    pub async fn return_book(&self, member_id: MemberId, book_id: BookId) -> Result<Transaction, LendingError> {
        self.try_return(member_id, book_id).await.inspect_err(report)
    }

    /// Returns a loan by transaction id. Only the member who holds the loan may return it.
    #[instrument(skip(self))]
    pub async fn return_transaction(
        &self,
        member_id: MemberId,
        transaction_id: TransactionId,
    ) -> Result<Transaction, LendingError> {
        self.try_return_transaction(member_id, transaction_id)
            .await
            .inspect_err(report)
    }

    async fn try_checkout(&self, member_id: MemberId, book_id: BookId) -> Result<Transaction, LendingError> {
        let member = self.member(member_id).await?;
        if !member.is_active_member {
            return Err(LendingError::Forbidden(member_id));
        }
        self.store.get_book(book_id).await?;

        let _lease = self.lock(book_id).await?;
        let mut uow = UnitOfWork::begin(&self.store);

        let mut book = uow.get_book(book_id).await?;
        if book.copies_available == 0 {
            return Err(LendingError::Unavailable(book_id));
        }
        if uow.find_active_transaction(member_id, book_id).await?.is_some() {
            return Err(LendingError::AlreadyCheckedOut {
                member: member_id,
                book: book_id,
            });
        }

        let tx = uow.create_transaction(member_id, book_id, Utc::now()).await?;
        book.copies_available -= 1;
        let remaining = book.copies_available;
        uow.save_book(book)?;
        uow.commit().await?;

        info!(tx_id = %tx.id, remaining, "Checked out");
        Ok(tx)
    }

    async fn try_return(&self, member_id: MemberId, book_id: BookId) -> Result<Transaction, LendingError> {
        // Inactive members may still bring books back
        self.member(member_id).await?;

        let _lease = self.lock(book_id).await?;
        let mut uow = UnitOfWork::begin(&self.store);

        let active = uow
            .find_active_transaction(member_id, book_id)
            .await?
            .ok_or(LendingError::NoActiveCheckout {
                member: member_id,
                book: book_id,
            })?;
        self.close_loan(uow, active.id, book_id).await
    }

    async fn try_return_transaction(
        &self,
        member_id: MemberId,
        transaction_id: TransactionId,
    ) -> Result<Transaction, LendingError> {
        self.member(member_id).await?;
        let tx = self.store.get_transaction(transaction_id).await?;
        if tx.member_id != member_id {
            return Err(LendingError::Forbidden(member_id));
        }

        let _lease = self.lock(tx.book_id).await?;
        let uow = UnitOfWork::begin(&self.store);
        self.close_loan(uow, transaction_id, tx.book_id).await
    }

    /// Closes a loan and puts the copy back, inside an already held guard.
    async fn close_loan(
        &self,
        mut uow: UnitOfWork<'_, S>,
        transaction_id: TransactionId,
        book_id: BookId,
    ) -> Result<Transaction, LendingError> {
        let closed = uow.close_transaction(transaction_id, Utc::now()).await?;

        let mut book = uow.get_book(book_id).await?;
        if book.copies_available >= book.copies_total {
            return Err(LendingError::InvariantViolation(format!(
                "return of {} would exceed {} copies of {}",
                transaction_id, book.copies_total, book_id
            )));
        }
        book.copies_available += 1;
        let remaining = book.copies_available;
        uow.save_book(book)?;
        uow.commit().await?;

        info!(tx_id = %closed.id, remaining, "Returned");
        Ok(closed)
    }

    /// Loads the acting member. An unknown member is refused, not reported missing.
    async fn member(&self, member_id: MemberId) -> Result<Member, LendingError> {
        match self.store.get_member(member_id).await {
            Ok(member) => Ok(member),
            Err(LedgerError::MemberNotFound(_)) => Err(LendingError::Forbidden(member_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn lock(&self, book_id: BookId) -> Result<BookLease, LendingError> {
        match self.guard_timeout {
            Some(timeout) => Ok(self.guard.acquire_timeout(book_id, timeout).await?),
            None => Ok(self.guard.acquire(book_id).await),
        }
    }
}

fn report(err: &LendingError) {
    let kind = err.kind();
    if kind.is_internal() {
        error!(error = %err, ?kind, "Lending fault");
    } else {
        warn!(error = %err, ?kind, "Request refused");
    }
}
