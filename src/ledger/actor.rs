//! # Ledger Actor
//!
//! The `LedgerActor` owns every persisted row and processes [`LedgerRequest`]s one at
//! a time. Because a whole unit of work arrives as a single `Commit` message, the
//! actor's sequential loop is the serialization point for commits: two change sets
//! can never interleave, and each one is re-validated against the rows as they are
//! when it is applied.

use crate::ledger::{LedgerClient, LedgerRequest, Tables};
use crate::model::{Member, MemberId};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The in-memory ledger server.
///
/// Created together with its [`LedgerClient`] by [`LedgerActor::new`], then driven
/// by spawning [`LedgerActor::run`]. The loop ends once every client has been
/// dropped.
pub struct LedgerActor {
    receiver: mpsc::Receiver<LedgerRequest>,
    tables: Tables,
    next_member_id: u32,
    next_book_id: u32,
}

impl LedgerActor {
    /// Creates a new `LedgerActor` and its associated `LedgerClient`.
    ///
    /// # Arguments
    ///
    /// * `buffer_size` - The capacity of the MPSC channel. If the channel is full,
    ///   calls to the client will wait until there is space.
    pub fn new(buffer_size: usize) -> (Self, LedgerClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            tables: Tables::new(),
            next_member_id: 1,
            next_book_id: 1,
        };
        (actor, LedgerClient::new(sender))
    }

    /// Runs the actor's event loop, processing requests until the channel closes.
    pub async fn run(mut self) {
        info!("Ledger started");

        while let Some(request) = self.receiver.recv().await {
            self.handle(request);
        }

        let (members, books, transactions) = self.tables.row_counts();
        info!(members, books, transactions, "Ledger shutdown");
    }

    fn handle(&mut self, request: LedgerRequest) {
        match request {
            LedgerRequest::GetMember { id, respond_to } => {
                let result = self.tables.member(id).cloned();
                debug!(%id, found = result.is_ok(), "Get member");
                let _ = respond_to.send(result);
            }
            LedgerRequest::GetBook { id, respond_to } => {
                let result = self.tables.book(id).cloned();
                debug!(%id, found = result.is_ok(), "Get book");
                let _ = respond_to.send(result);
            }
            LedgerRequest::GetTransaction { id, respond_to } => {
                let result = self.tables.transaction(id).cloned();
                debug!(%id, found = result.is_ok(), "Get transaction");
                let _ = respond_to.send(result);
            }
            LedgerRequest::FindActiveTransaction {
                member_id,
                book_id,
                respond_to,
            } => {
                let found = self.tables.active_transaction(member_id, book_id).cloned();
                debug!(%member_id, %book_id, active = found.is_some(), "Find active transaction");
                let _ = respond_to.send(Ok(found));
            }
            LedgerRequest::ListBooks {
                available_only,
                respond_to,
            } => {
                let books = self.tables.books(available_only);
                debug!(available_only, count = books.len(), "List books");
                let _ = respond_to.send(Ok(books));
            }
            LedgerRequest::ListTransactions {
                member_id,
                active_only,
                respond_to,
            } => {
                let transactions = self.tables.transactions_for(member_id, active_only);
                debug!(%member_id, active_only, count = transactions.len(), "List transactions");
                let _ = respond_to.send(Ok(transactions));
            }
            LedgerRequest::Commit {
                changes,
                respond_to,
            } => {
                debug!(?changes, "Commit");
                let result = self.tables.apply(&changes);
                match &result {
                    Ok(()) => info!(changes = changes.len(), "Committed"),
                    Err(e) => warn!(error = %e, changes = changes.len(), "Commit rejected"),
                }
                let _ = respond_to.send(result);
            }
            LedgerRequest::RegisterMember { params, respond_to } => {
                debug!(?params, "Register member");
                let id = MemberId::from(self.next_member_id);
                let member = Member::from_create(id, params);
                let result = self.tables.insert_member(member.clone()).map(|()| member);
                if result.is_ok() {
                    self.next_member_id += 1;
                    info!(%id, "Registered member");
                }
                let _ = respond_to.send(result);
            }
            LedgerRequest::SetMemberActive {
                id,
                active,
                respond_to,
            } => {
                let result = self.tables.set_member_active(id, active);
                match &result {
                    Ok(_) => info!(%id, active, "Membership updated"),
                    Err(e) => warn!(%id, error = %e, "Membership update failed"),
                }
                let _ = respond_to.send(result);
            }
            LedgerRequest::RegisterBook { params, respond_to } => {
                debug!(?params, "Register book");
                let id = self.next_book_id.into();
                let result = self.tables.insert_book(id, params);
                match &result {
                    Ok(book) => {
                        self.next_book_id += 1;
                        info!(%id, isbn = %book.isbn, copies = book.copies_total, "Registered book");
                    }
                    Err(e) => warn!(error = %e, "Register book failed"),
                }
                let _ = respond_to.send(result);
            }
            LedgerRequest::UpdateBook {
                id,
                update,
                respond_to,
            } => {
                debug!(%id, ?update, "Update book");
                let result = self.tables.update_book(id, update);
                match &result {
                    Ok(_) => info!(%id, "Updated book"),
                    Err(e) => warn!(%id, error = %e, "Update book failed"),
                }
                let _ = respond_to.send(result);
            }
        }
    }
}

