//! # Ledger Client
//!
//! The cloneable handle used to talk to a running [`LedgerActor`](crate::ledger::LedgerActor).
//! It implements [`LedgerStore`] for the lending engine and exposes the registration
//! and maintenance requests used by the admin path.

use crate::ledger::{ChangeSet, LedgerError, LedgerRequest, LedgerStore, Response};
use crate::model::{
    Book, BookCreate, BookId, BookUpdate, Member, MemberCreate, MemberId, Transaction,
    TransactionId,
};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

/// A type-safe client for the ledger actor. Cheap to clone: it only holds a sender.
#[derive(Clone, Debug)]
pub struct LedgerClient {
    sender: mpsc::Sender<LedgerRequest>,
}

impl LedgerClient {
    pub fn new(sender: mpsc::Sender<LedgerRequest>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> LedgerRequest,
    ) -> Result<T, LedgerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| LedgerError::ActorClosed)?;
        response.await.map_err(|_| LedgerError::ActorDropped)?
    }

    #[instrument(skip(self))]
    pub async fn register_member(&self, params: MemberCreate) -> Result<Member, LedgerError> {
        debug!("Sending request");
        self.request(|respond_to| LedgerRequest::RegisterMember { params, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn set_member_active(&self, id: MemberId, active: bool) -> Result<Member, LedgerError> {
        debug!("Sending request");
        self.request(|respond_to| LedgerRequest::SetMemberActive {
            id,
            active,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn register_book(&self, params: BookCreate) -> Result<Book, LedgerError> {
        debug!("Sending request");
        self.request(|respond_to| LedgerRequest::RegisterBook { params, respond_to })
            .await
    }

    #[instrument(skip(self))]
    pub async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<Book, LedgerError> {
        debug!("Sending request");
        self.request(|respond_to| LedgerRequest::UpdateBook {
            id,
            update,
            respond_to,
        })
        .await
    }
}

#[async_trait]
impl LedgerStore for LedgerClient {
    async fn get_member(&self, id: MemberId) -> Result<Member, LedgerError> {
        self.request(|respond_to| LedgerRequest::GetMember { id, respond_to })
            .await
    }

    async fn get_book(&self, id: BookId) -> Result<Book, LedgerError> {
        self.request(|respond_to| LedgerRequest::GetBook { id, respond_to })
            .await
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.request(|respond_to| LedgerRequest::GetTransaction { id, respond_to })
            .await
    }

    async fn find_active_transaction(
        &self,
        member_id: MemberId,
        book_id: BookId,
    ) -> Result<Option<Transaction>, LedgerError> {
        self.request(|respond_to| LedgerRequest::FindActiveTransaction {
            member_id,
            book_id,
            respond_to,
        })
        .await
    }

    async fn list_books(&self, available_only: bool) -> Result<Vec<Book>, LedgerError> {
        self.request(|respond_to| LedgerRequest::ListBooks {
            available_only,
            respond_to,
        })
        .await
    }

    async fn list_transactions(
        &self,
        member_id: MemberId,
        active_only: bool,
    ) -> Result<Vec<Transaction>, LedgerError> {
        self.request(|respond_to| LedgerRequest::ListTransactions {
            member_id,
            active_only,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, changes), fields(changes = changes.len()))]
    async fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError> {
        debug!("Sending request");
        self.request(|respond_to| LedgerRequest::Commit {
            changes,
            respond_to,
        })
        .await
    }
}
