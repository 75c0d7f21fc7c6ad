//! # Ledger Messages
//!
//! The request types sent from a [`LedgerClient`](crate::ledger::LedgerClient) to the
//! [`LedgerActor`](crate::ledger::LedgerActor). Every request carries a one-shot
//! channel on which the actor answers exactly once.
//!
//! Requests fall into three groups:
//!
//! - **Reads**: `GetMember`, `GetBook`, `GetTransaction`, `FindActiveTransaction`,
//!   `ListBooks`, `ListTransactions`.
//! - **Commit**: the only way lending changes reach the rows. One `Commit` carries a
//!   whole unit of work.
//! - **Registration & maintenance**: `RegisterMember`, `SetMemberActive`,
//!   `RegisterBook`, `UpdateBook`. These are single-row writes used by the admin path.

use crate::ledger::{ChangeSet, LedgerError};
use crate::model::{
    Book, BookCreate, BookId, BookUpdate, Member, MemberCreate, MemberId, Transaction,
    TransactionId,
};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the ledger.
pub type Response<T> = oneshot::Sender<Result<T, LedgerError>>;

#[derive(Debug)]
pub enum LedgerRequest {
    GetMember {
        id: MemberId,
        respond_to: Response<Member>,
    },
    GetBook {
        id: BookId,
        respond_to: Response<Book>,
    },
    GetTransaction {
        id: TransactionId,
        respond_to: Response<Transaction>,
    },
    FindActiveTransaction {
        member_id: MemberId,
        book_id: BookId,
        respond_to: Response<Option<Transaction>>,
    },
    ListBooks {
        available_only: bool,
        respond_to: Response<Vec<Book>>,
    },
    ListTransactions {
        member_id: MemberId,
        active_only: bool,
        respond_to: Response<Vec<Transaction>>,
    },
    Commit {
        changes: ChangeSet,
        respond_to: Response<()>,
    },
    RegisterMember {
        params: MemberCreate,
        respond_to: Response<Member>,
    },
    SetMemberActive {
        id: MemberId,
        active: bool,
        respond_to: Response<Member>,
    },
    RegisterBook {
        params: BookCreate,
        respond_to: Response<Book>,
    },
    UpdateBook {
        id: BookId,
        update: BookUpdate,
        respond_to: Response<Book>,
    },
}
