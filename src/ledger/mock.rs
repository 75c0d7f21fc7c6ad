//! # Mock Ledger
//!
//! Utilities for testing the lending engine and the query facade without a running
//! [`LedgerActor`](crate::ledger::LedgerActor).
//!
//! Two styles are available:
//!
//! - [`MockLedger`]: script the answers up front with a fluent API, run the code
//!   under test, then call [`MockLedger::verify`].
//! - [`create_mock_ledger`]: get a client and the raw request receiver, and answer
//!   each request by hand with helpers like [`expect_commit`].

use crate::ledger::{ChangeSet, LedgerClient, LedgerError, LedgerRequest, Response};
use crate::model::{Book, BookId, Member, MemberId, Transaction, TransactionId};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected request and the answer to give it.
enum Expectation {
    GetMember {
        id: MemberId,
        response: Result<Member, LedgerError>,
    },
    GetBook {
        id: BookId,
        response: Result<Book, LedgerError>,
    },
    GetTransaction {
        id: TransactionId,
        response: Result<Transaction, LedgerError>,
    },
    FindActive {
        member_id: MemberId,
        book_id: BookId,
        response: Result<Option<Transaction>, LedgerError>,
    },
    ListBooks {
        response: Result<Vec<Book>, LedgerError>,
    },
    ListTransactions {
        member_id: MemberId,
        response: Result<Vec<Transaction>, LedgerError>,
    },
    Commit {
        response: Result<(), LedgerError>,
    },
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    committed: Vec<ChangeSet>,
    mismatches: Vec<String>,
}

type SharedState = Arc<Mutex<MockState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A mock ledger with expectation tracking for fluent testing.
///
/// Requests must arrive in the order the expectations were declared. A request
/// that does not match the next expectation is recorded as a mismatch, its
/// response channel is dropped (the caller sees [`LedgerError::ActorDropped`]),
/// and [`MockLedger::verify`] fails.
///
/// # Example
/// ```ignore
/// let mock = MockLedger::new();
/// mock.expect_get_member(member.id).return_ok(member.clone());
/// mock.expect_get_book(book.id).return_ok(book.clone());
/// mock.expect_commit().return_ok(());
///
/// let store = mock.client();
/// // Use store in tests...
/// mock.verify(); // Ensures all expectations were met
/// ```
pub struct MockLedger {
    client: LedgerClient,
    state: SharedState,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockLedger {
    /// Creates a new mock ledger with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<LedgerRequest>(100);
        let state: SharedState = Arc::default();
        let task_state = state.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = lock(&task_state).expectations.pop_front();
                answer(&task_state, request, expectation);
            }
        });

        Self {
            client: LedgerClient::new(sender),
            state,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> LedgerClient {
        self.client.clone()
    }

    pub fn expect_get_member(&self, id: MemberId) -> ExpectationBuilder<Member> {
        self.builder(move |response| Expectation::GetMember { id, response })
    }

    pub fn expect_get_book(&self, id: BookId) -> ExpectationBuilder<Book> {
        self.builder(move |response| Expectation::GetBook { id, response })
    }

    pub fn expect_get_transaction(&self, id: TransactionId) -> ExpectationBuilder<Transaction> {
        self.builder(move |response| Expectation::GetTransaction { id, response })
    }

    pub fn expect_find_active(
        &self,
        member_id: MemberId,
        book_id: BookId,
    ) -> ExpectationBuilder<Option<Transaction>> {
        self.builder(move |response| Expectation::FindActive {
            member_id,
            book_id,
            response,
        })
    }

    pub fn expect_list_books(&self) -> ExpectationBuilder<Vec<Book>> {
        self.builder(|response| Expectation::ListBooks { response })
    }

    pub fn expect_list_transactions(&self, member_id: MemberId) -> ExpectationBuilder<Vec<Transaction>> {
        self.builder(move |response| Expectation::ListTransactions {
            member_id,
            response,
        })
    }

    /// Expects a `commit`. The change set is kept for [`MockLedger::committed`].
    pub fn expect_commit(&self) -> ExpectationBuilder<()> {
        self.builder(|response| Expectation::Commit { response })
    }

    /// Every change set the mock received, in arrival order.
    pub fn committed(&self) -> Vec<ChangeSet> {
        lock(&self.state).committed.clone()
    }

    /// Verifies that all expectations were met and no unexpected request arrived.
    pub fn verify(&self) {
        let state = lock(&self.state);
        if !state.mismatches.is_empty() {
            panic!("Unexpected ledger requests: {:?}", state.mismatches);
        }
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }

    fn builder<T>(
        &self,
        wrap: impl FnOnce(Result<T, LedgerError>) -> Expectation + Send + 'static,
    ) -> ExpectationBuilder<T> {
        ExpectationBuilder {
            state: self.state.clone(),
            wrap: Box::new(wrap),
        }
    }
}

impl Default for MockLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder that completes an expectation with its answer.
pub struct ExpectationBuilder<T> {
    state: SharedState,
    wrap: Box<dyn FnOnce(Result<T, LedgerError>) -> Expectation + Send>,
}

impl<T> ExpectationBuilder<T> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        let expectation = (self.wrap)(Ok(value));
        lock(&self.state).expectations.push_back(expectation);
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: LedgerError) {
        let expectation = (self.wrap)(Err(error));
        lock(&self.state).expectations.push_back(expectation);
    }
}

fn reply<T>(respond_to: Response<T>, response: Result<T, LedgerError>) {
    let _ = respond_to.send(response);
}

fn answer(state: &SharedState, request: LedgerRequest, expectation: Option<Expectation>) {
    use LedgerRequest as R;

    match (request, expectation) {
        (R::GetMember { id, respond_to }, Some(Expectation::GetMember { id: want, response }))
            if id == want =>
        {
            reply(respond_to, response)
        }
        (R::GetBook { id, respond_to }, Some(Expectation::GetBook { id: want, response }))
            if id == want =>
        {
            reply(respond_to, response)
        }
        (
            R::GetTransaction { id, respond_to },
            Some(Expectation::GetTransaction { id: want, response }),
        ) if id == want => reply(respond_to, response),
        (
            R::FindActiveTransaction {
                member_id,
                book_id,
                respond_to,
            },
            Some(Expectation::FindActive {
                member_id: want_member,
                book_id: want_book,
                response,
            }),
        ) if (member_id, book_id) == (want_member, want_book) => reply(respond_to, response),
        (R::ListBooks { respond_to, .. }, Some(Expectation::ListBooks { response })) => {
            reply(respond_to, response)
        }
        (
            R::ListTransactions {
                member_id,
                respond_to,
                ..
            },
            Some(Expectation::ListTransactions {
                member_id: want,
                response,
            }),
        ) if member_id == want => reply(respond_to, response),
        (
            R::Commit {
                changes,
                respond_to,
            },
            Some(Expectation::Commit { response }),
        ) => {
            lock(state).committed.push(changes);
            reply(respond_to, response)
        }
        (request, expectation) => {
            let mut state = lock(state);
            state.mismatches.push(format!("{request:?}"));
            // Keep the unmatched expectation so `verify` reports it too
            if let Some(expectation) = expectation {
                state.expectations.push_front(expectation);
            }
        }
    }
}

// =============================================================================
// RAW HELPERS
// =============================================================================

/// Creates a ledger client and the receiver its requests arrive on.
///
/// Nothing answers the requests until the test does, so the test controls the
/// ordering and timing of every reply.
///
/// **Note**: Consider using [`MockLedger`] for a more fluent API.
pub fn create_mock_ledger(buffer_size: usize) -> (LedgerClient, mpsc::Receiver<LedgerRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (LedgerClient::new(sender), receiver)
}

/// Helper to verify that the next message is a GetMember request.
pub async fn expect_get_member(
    receiver: &mut mpsc::Receiver<LedgerRequest>,
) -> Option<(MemberId, Response<Member>)> {
    match receiver.recv().await {
        Some(LedgerRequest::GetMember { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a GetBook request.
pub async fn expect_get_book(
    receiver: &mut mpsc::Receiver<LedgerRequest>,
) -> Option<(BookId, Response<Book>)> {
    match receiver.recv().await {
        Some(LedgerRequest::GetBook { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a FindActiveTransaction request.
pub async fn expect_find_active(
    receiver: &mut mpsc::Receiver<LedgerRequest>,
) -> Option<((MemberId, BookId), Response<Option<Transaction>>)> {
    match receiver.recv().await {
        Some(LedgerRequest::FindActiveTransaction {
            member_id,
            book_id,
            respond_to,
        }) => Some(((member_id, book_id), respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Commit request.
pub async fn expect_commit(
    receiver: &mut mpsc::Receiver<LedgerRequest>,
) -> Option<(ChangeSet, Response<()>)> {
    match receiver.recv().await {
        Some(LedgerRequest::Commit {
            changes,
            respond_to,
        }) => Some((changes, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::InventoryGuard;
    use crate::ledger::{Change, LedgerStore, UnitOfWork};
    use crate::lending::LendingEngine;
    use crate::model::{BookCreate, MemberCreate};
    use chrono::Utc;

    fn book() -> Book {
        Book::from_create(BookId(1), BookCreate::new("Dune", "Frank Herbert", "9780441013593"))
    }

    #[tokio::test]
    async fn test_raw_mock_ledger() {
        let (client, mut receiver) = create_mock_ledger(10);

        let task = tokio::spawn(async move {
            let mut uow = UnitOfWork::begin(&client);
            let mut book = uow.get_book(BookId(1)).await?;
            book.copies_available -= 1;
            uow.save_book(book)?;
            uow.commit().await
        });

        let (id, responder) = expect_get_book(&mut receiver).await.expect("Expected GetBook request");
        assert_eq!(id, BookId(1));
        responder.send(Ok(book())).unwrap();

        let (changes, responder) = expect_commit(&mut receiver).await.expect("Expected Commit request");
        assert!(matches!(
            changes.iter().next(),
            Some(Change::AdjustCopies { delta: -1, .. })
        ));
        responder.send(Ok(())).unwrap();

        assert_eq!(task.await.unwrap(), Ok(()));
    }

    #[tokio::test]
    async fn test_raw_mock_ledger_return_flow() {
        let (client, mut receiver) = create_mock_ledger(10);
        let member = Member::from_create(MemberId(1), MemberCreate::new("alice"));
        let loan = Transaction::open(member.id, BookId(1), Utc::now());
        let mut lent = book();
        lent.copies_available = 0;

        let engine = LendingEngine::new(client, InventoryGuard::new());
        let task = tokio::spawn(async move { engine.return_book(MemberId(1), BookId(1)).await });

        let (id, responder) = expect_get_member(&mut receiver).await.expect("Expected GetMember request");
        assert_eq!(id, member.id);
        responder.send(Ok(member)).unwrap();

        let (pair, responder) = expect_find_active(&mut receiver).await.expect("Expected FindActive request");
        assert_eq!(pair, (MemberId(1), BookId(1)));
        responder.send(Ok(Some(loan.clone()))).unwrap();

        let (_, responder) = expect_get_book(&mut receiver).await.expect("Expected GetBook request");
        responder.send(Ok(lent)).unwrap();

        let (changes, responder) = expect_commit(&mut receiver).await.expect("Expected Commit request");
        assert_eq!(changes.len(), 2);
        responder.send(Ok(())).unwrap();

        let closed = task.await.unwrap().unwrap();
        assert_eq!(closed.id, loan.id);
        assert!(!closed.is_active());
    }

    #[tokio::test]
    async fn test_mock_ledger_with_expectations() {
        let member = Member::from_create(MemberId(1), MemberCreate::new("alice"));

        let mock = MockLedger::new();
        mock.expect_get_member(member.id).return_ok(member.clone());
        mock.expect_get_book(BookId(2)).return_err(LedgerError::BookNotFound(BookId(2)));
        mock.expect_commit().return_ok(());

        let store = mock.client();
        assert_eq!(store.get_member(member.id).await.unwrap(), member);
        assert_eq!(
            store.get_book(BookId(2)).await,
            Err(LedgerError::BookNotFound(BookId(2)))
        );

        let mut changes = ChangeSet::new();
        changes.push(Change::CreateTransaction(Transaction::open(member.id, BookId(1), Utc::now())));
        store.commit(changes.clone()).await.unwrap();

        assert_eq!(mock.committed(), vec![changes]);
        mock.verify();
    }

    #[tokio::test]
    async fn test_unexpected_request_is_reported() {
        let mock = MockLedger::new();
        mock.expect_get_book(BookId(1)).return_ok(book());

        let store = mock.client();
        let result = store.get_member(MemberId(1)).await;

        assert_eq!(result, Err(LedgerError::ActorDropped));
        let verified = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| mock.verify()));
        assert!(verified.is_err());
    }
}
