//! # Query Facade
//!
//! Read-only projections over the ledger. Queries never take the inventory guard;
//! each one is answered from a single ledger request, so it reflects one consistent
//! moment of the ledger even while checkouts and returns are in flight.

use crate::ledger::{LedgerClient, LedgerStore};
use crate::lending::LendingError;
use crate::model::{Book, BookId, MemberId, Transaction};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct QueryFacade<S: LedgerStore = LedgerClient> {
    store: S,
}

impl<S: LedgerStore> QueryFacade<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Books with at least one copy on the shelf, ordered by title then author.
    #[instrument(skip(self))]
    pub async fn list_available_books(&self) -> Result<Vec<Book>, LendingError> {
        let books = self.store.list_books(true).await?;
        debug!(count = books.len(), "Available books");
        Ok(books)
    }

    /// The member's open loans, newest checkout first.
    #[instrument(skip(self))]
    pub async fn list_active_loans(&self, member_id: MemberId) -> Result<Vec<Transaction>, LendingError> {
        let loans = self.store.list_transactions(member_id, true).await?;
        debug!(count = loans.len(), "Active loans");
        Ok(loans)
    }

    /// The whole catalogue, ordered by title then author.
    #[instrument(skip(self))]
    pub async fn list_books(&self) -> Result<Vec<Book>, LendingError> {
        Ok(self.store.list_books(false).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_book(&self, book_id: BookId) -> Result<Book, LendingError> {
        Ok(self.store.get_book(book_id).await?)
    }

    /// Every loan the member ever had, active and returned, newest checkout first.
    #[instrument(skip(self))]
    pub async fn member_history(&self, member_id: MemberId) -> Result<Vec<Transaction>, LendingError> {
        Ok(self.store.list_transactions(member_id, false).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::MockLedger;
    use crate::ledger::LedgerError;
    use crate::lending::ErrorKind;
    use crate::model::BookCreate;
    use chrono::Utc;

    #[tokio::test]
    async fn test_queries_pass_through_ledger_answers() {
        let book = Book::from_create(BookId(1), BookCreate::new("Dune", "Frank Herbert", "9780441013593"));
        let loan = Transaction::open(MemberId(1), BookId(1), Utc::now());

        let mock = MockLedger::new();
        mock.expect_list_books().return_ok(vec![book.clone()]);
        mock.expect_list_transactions(MemberId(1)).return_ok(vec![loan.clone()]);
        let queries = QueryFacade::new(mock.client());

        assert_eq!(queries.list_available_books().await.unwrap(), vec![book]);
        assert_eq!(queries.list_active_loans(MemberId(1)).await.unwrap(), vec![loan]);
        mock.verify();
    }

    #[tokio::test]
    async fn test_missing_book_is_not_found() {
        let mock = MockLedger::new();
        mock.expect_get_book(BookId(9)).return_err(LedgerError::BookNotFound(BookId(9)));
        let queries = QueryFacade::new(mock.client());

        let err = queries.get_book(BookId(9)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        mock.verify();
    }
}
