//! # Inventory Guard
//!
//! A keyed mutex table that serializes checkout and return calls on the same book.
//!
//! Each book id maps to its own `tokio::sync::Mutex<()>`, created on first use and
//! removed once nobody holds or waits for it, so the table only ever contains the
//! books that are currently contended. Calls on different books never touch the
//! same mutex.
//!
//! ## Ordering
//!
//! Waiters on the same book are admitted first-in, first-out: the tokio mutex hands
//! the lock to the longest waiting task.
//!
//! ## Release
//!
//! A [`BookLease`] releases the book when dropped. That covers normal return, `?`
//! error propagation, a panic unwinding through the critical section, and a caller
//! whose future is cancelled while waiting.
//!
//! The guard is an in-process primitive. The ledger applies counter moves to its
//! current rows and re-validates every commit, so two processes sharing a store
//! still cannot break the copy bounds.

use crate::model::BookId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, trace};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GuardError {
    #[error("Timed out after {waited:?} waiting for {book_id}")]
    Timeout { book_id: BookId, waited: Duration },
}

struct Entry {
    lock: Arc<AsyncMutex<()>>,
    // Leases plus pending waiters
    holders: usize,
}

type LockTable = HashMap<BookId, Entry>;

fn lock_table(table: &Mutex<LockTable>) -> MutexGuard<'_, LockTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-book exclusion shared by every caller of the lending engine.
#[derive(Clone, Default)]
pub struct InventoryGuard {
    table: Arc<Mutex<LockTable>>,
}

impl InventoryGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the book is free and returns a lease that holds it.
    pub async fn acquire(&self, book_id: BookId) -> BookLease {
        let slot = self.slot(book_id);
        trace!(%book_id, "Waiting for book guard");
        let permit = slot.lock.clone().lock_owned().await;
        debug!(%book_id, "Book guard acquired");
        BookLease {
            _permit: permit,
            slot,
        }
    }

    /// Like [`acquire`](Self::acquire), giving up after `timeout`.
    ///
    /// A caller that times out leaves the queue; nothing is held afterwards.
    pub async fn acquire_timeout(&self, book_id: BookId, timeout: Duration) -> Result<BookLease, GuardError> {
        tokio::time::timeout(timeout, self.acquire(book_id))
            .await
            .map_err(|_| GuardError::Timeout {
                book_id,
                waited: timeout,
            })
    }

    /// Runs `f` while holding the book, releasing it on every exit path.
    pub async fn with_book_lock<F, Fut>(&self, book_id: BookId, f: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let _lease = self.acquire(book_id).await;
        f().await
    }

    /// Number of books currently held or waited on.
    pub fn tracked_books(&self) -> usize {
        lock_table(&self.table).len()
    }

    pub fn is_locked(&self, book_id: BookId) -> bool {
        lock_table(&self.table)
            .get(&book_id)
            .is_some_and(|entry| entry.lock.try_lock().is_err())
    }

    fn slot(&self, book_id: BookId) -> Slot {
        let mut table = lock_table(&self.table);
        let entry = table.entry(book_id).or_insert_with(|| Entry {
            lock: Arc::default(),
            holders: 0,
        });
        entry.holders += 1;
        Slot {
            book_id,
            lock: entry.lock.clone(),
            table: self.table.clone(),
        }
    }
}

/// A registration in the lock table, held by waiters and leases alike.
struct Slot {
    book_id: BookId,
    lock: Arc<AsyncMutex<()>>,
    table: Arc<Mutex<LockTable>>,
}

impl Drop for Slot {
    fn drop(&mut self) {
        let mut table = lock_table(&self.table);
        if let Some(entry) = table.get_mut(&self.book_id) {
            entry.holders = entry.holders.saturating_sub(1);
            if entry.holders == 0 {
                table.remove(&self.book_id);
            }
        }
    }
}

/// Exclusive hold on one book. Dropping it admits the next waiter.
pub struct BookLease {
    // Dropped before `slot`, so the mutex is unlocked before the entry can go away
    _permit: OwnedMutexGuard<()>,
    slot: Slot,
}

impl BookLease {
    pub fn book_id(&self) -> BookId {
        self.slot.book_id
    }
}

impl Drop for BookLease {
    fn drop(&mut self) {
        debug!(book_id = %self.slot.book_id, "Book guard released");
    }
}

impl std::fmt::Debug for BookLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookLease")
            .field("book_id", &self.slot.book_id)
            .finish_non_exhaustive()
    }
}
