//! # Ledger Tables
//!
//! The in-memory rows owned by the [`LedgerActor`](crate::ledger::LedgerActor), plus
//! the indexes that back the ledger's uniqueness rules:
//!
//! - `isbn_index`: one book per ISBN.
//! - `active_index`: at most one active transaction per (member, book).
//!
//! Everything here is synchronous. The actor owns the only instance, so no
//! locking is needed; atomicity of [`Tables::apply`] comes from validating the whole
//! change set against a scratch overlay before writing any row.

use crate::ledger::{Change, ChangeSet, LedgerError};
use crate::model::{
    Book, BookCreate, BookId, BookUpdate, Member, MemberId, Transaction, TransactionId,
};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Tables {
    members: HashMap<MemberId, Member>,
    books: HashMap<BookId, Book>,
    transactions: HashMap<TransactionId, Transaction>,
    isbn_index: HashMap<String, BookId>,
    active_index: HashMap<(MemberId, BookId), TransactionId>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Rows ---

    pub fn member(&self, id: MemberId) -> Result<&Member, LedgerError> {
        self.members.get(&id).ok_or(LedgerError::MemberNotFound(id))
    }

    pub fn book(&self, id: BookId) -> Result<&Book, LedgerError> {
        self.books.get(&id).ok_or(LedgerError::BookNotFound(id))
    }

    pub fn transaction(&self, id: TransactionId) -> Result<&Transaction, LedgerError> {
        self.transactions
            .get(&id)
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    pub fn active_transaction(&self, member_id: MemberId, book_id: BookId) -> Option<&Transaction> {
        self.active_index
            .get(&(member_id, book_id))
            .and_then(|id| self.transactions.get(id))
    }

    pub fn books(&self, available_only: bool) -> Vec<Book> {
        let mut books: Vec<Book> = self
            .books
            .values()
            .filter(|book| !available_only || book.is_available())
            .cloned()
            .collect();
        books.sort_by(|a, b| (&a.title, &a.author, a.id).cmp(&(&b.title, &b.author, b.id)));
        books
    }

    pub fn transactions_for(&self, member_id: MemberId, active_only: bool) -> Vec<Transaction> {
        let mut transactions: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|tx| tx.member_id == member_id && (!active_only || tx.is_active()))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| (b.checkout_date, b.id).cmp(&(a.checkout_date, a.id)));
        transactions
    }

    /// Row counts as (members, books, transactions).
    pub fn row_counts(&self) -> (usize, usize, usize) {
        (self.members.len(), self.books.len(), self.transactions.len())
    }

    // --- Registration & maintenance ---

    pub fn insert_member(&mut self, member: Member) -> Result<(), LedgerError> {
        if self.members.contains_key(&member.id) {
            return Err(LedgerError::ConstraintViolation(format!(
                "duplicate member id {}",
                member.id
            )));
        }
        self.members.insert(member.id, member);
        Ok(())
    }

    pub fn set_member_active(&mut self, id: MemberId, active: bool) -> Result<Member, LedgerError> {
        let member = self
            .members
            .get_mut(&id)
            .ok_or(LedgerError::MemberNotFound(id))?;
        member.is_active_member = active;
        Ok(member.clone())
    }

    pub fn insert_book(&mut self, id: BookId, params: BookCreate) -> Result<Book, LedgerError> {
        params.validate().map_err(LedgerError::Validation)?;
        if let Some(existing) = self.isbn_index.get(&params.isbn) {
            return Err(LedgerError::ConstraintViolation(format!(
                "ISBN {} already registered as {}",
                params.isbn, existing
            )));
        }
        let book = Book::from_create(id, params);
        self.isbn_index.insert(book.isbn.clone(), id);
        self.books.insert(id, book.clone());
        Ok(book)
    }

    /// Number of active loans of a book.
    pub fn active_loans(&self, book_id: BookId) -> u32 {
        self.active_index
            .keys()
            .filter(|(_, id)| *id == book_id)
            .count() as u32
    }

    /// Catalogue maintenance. The merged counters must still cover every copy
    /// that is out on an active loan.
    pub fn update_book(&mut self, id: BookId, update: BookUpdate) -> Result<Book, LedgerError> {
        let mut next = self.book(id)?.clone();
        next.apply_update(update).map_err(LedgerError::Validation)?;
        let on_loan = self.active_loans(id);
        if next.copies_on_loan() < on_loan {
            return Err(LedgerError::Validation(format!(
                "{} has {} copies on loan, update leaves room for {}",
                id,
                on_loan,
                next.copies_on_loan()
            )));
        }
        self.books.insert(id, next.clone());
        Ok(next)
    }

    // --- Commit ---

    /// Applies a change set all-or-nothing.
    ///
    /// Changes are validated in order against the committed rows overlaid with
    /// the earlier changes of the same set. The first rejected change aborts the
    /// whole set and no row is touched.
    pub fn apply(&mut self, changes: &ChangeSet) -> Result<(), LedgerError> {
        let mut books: HashMap<BookId, Book> = HashMap::new();
        let mut transactions: HashMap<TransactionId, Transaction> = HashMap::new();
        // `None` marks a pair whose active loan is closed by this set
        let mut active: HashMap<(MemberId, BookId), Option<TransactionId>> = HashMap::new();

        for change in changes {
            match change {
                Change::AdjustCopies { book_id, delta } => {
                    let mut book = match books.get(book_id) {
                        Some(staged) => staged.clone(),
                        None => self.book(*book_id)?.clone(),
                    };
                    let next = i64::from(book.copies_available) + delta;
                    if next < 0 || next > i64::from(book.copies_total) {
                        return Err(LedgerError::InvariantViolation(format!(
                            "{} has {} of {} copies available, cannot move by {}",
                            book_id, book.copies_available, book.copies_total, delta
                        )));
                    }
                    book.copies_available = next as u32;
                    books.insert(*book_id, book);
                }
                Change::CreateTransaction(tx) => {
                    self.member(tx.member_id)?;
                    self.book(tx.book_id)?;
                    if !tx.is_active() {
                        return Err(LedgerError::InvariantViolation(format!(
                            "{} must be created without a return date",
                            tx.id
                        )));
                    }
                    if self.transactions.contains_key(&tx.id) || transactions.contains_key(&tx.id) {
                        return Err(LedgerError::ConstraintViolation(format!(
                            "duplicate transaction id {}",
                            tx.id
                        )));
                    }
                    let pair = tx.pair();
                    let current = active
                        .get(&pair)
                        .copied()
                        .unwrap_or_else(|| self.active_index.get(&pair).copied());
                    if let Some(existing) = current {
                        return Err(LedgerError::ConstraintViolation(format!(
                            "{} already has {} active for {}",
                            tx.member_id, existing, tx.book_id
                        )));
                    }
                    active.insert(pair, Some(tx.id));
                    transactions.insert(tx.id, tx.clone());
                }
                Change::CloseTransaction { id, return_date } => {
                    let mut tx = match transactions.get(id) {
                        Some(staged) => staged.clone(),
                        None => self.transaction(*id)?.clone(),
                    };
                    if !tx.is_active() {
                        return Err(LedgerError::AlreadyClosed(*id));
                    }
                    tx.return_date = Some(*return_date);
                    active.insert(tx.pair(), None);
                    transactions.insert(*id, tx);
                }
            }
        }

        // Every change passed; nothing below can fail.
        self.books.extend(books);
        self.transactions.extend(transactions);
        for (pair, slot) in active {
            match slot {
                Some(id) => {
                    self.active_index.insert(pair, id);
                }
                None => {
                    self.active_index.remove(&pair);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemberCreate;
    use chrono::Utc;

    fn seeded() -> (Tables, MemberId, BookId) {
        let mut tables = Tables::new();
        let member_id = MemberId(1);
        tables
            .insert_member(Member::from_create(member_id, MemberCreate::new("alice")))
            .unwrap();
        let book_id = BookId(1);
        tables
            .insert_book(book_id, BookCreate::new("Dune", "Frank Herbert", "9780441013593").with_copies(2))
            .unwrap();
        (tables, member_id, book_id)
    }

    fn take(book_id: BookId) -> Change {
        Change::AdjustCopies { book_id, delta: -1 }
    }

    fn checkout_changes(member_id: MemberId, book_id: BookId) -> (ChangeSet, Transaction) {
        let tx = Transaction::open(member_id, book_id, Utc::now());
        let changes = [Change::CreateTransaction(tx.clone()), take(book_id)]
            .into_iter()
            .collect();
        (changes, tx)
    }

    #[test]
    fn test_apply_checkout_updates_rows_and_index() {
        let (mut tables, member_id, book_id) = seeded();
        let (changes, tx) = checkout_changes(member_id, book_id);

        tables.apply(&changes).unwrap();

        assert_eq!(tables.book(book_id).unwrap().copies_available, 1);
        assert_eq!(tables.active_transaction(member_id, book_id).unwrap().id, tx.id);
    }

    #[test]
    fn test_second_active_loan_for_pair_is_rejected() {
        let (mut tables, member_id, book_id) = seeded();
        let (first, _) = checkout_changes(member_id, book_id);
        tables.apply(&first).unwrap();

        let (second, _) = checkout_changes(member_id, book_id);
        let result = tables.apply(&second);

        assert!(matches!(result, Err(LedgerError::ConstraintViolation(_))));
        // Nothing from the rejected set leaked
        assert_eq!(tables.book(book_id).unwrap().copies_available, 1);
        assert_eq!(tables.transactions_for(member_id, false).len(), 1);
    }

    #[test]
    fn test_rejected_set_leaves_no_partial_state() {
        let (mut tables, member_id, book_id) = seeded();
        let tx = Transaction::open(member_id, book_id, Utc::now());
        // Both copies are already on the shelf
        let changes: ChangeSet = [
            Change::CreateTransaction(tx),
            Change::AdjustCopies { book_id, delta: 1 },
        ]
        .into_iter()
        .collect();

        let result = tables.apply(&changes);

        assert!(matches!(result, Err(LedgerError::InvariantViolation(_))));
        assert!(tables.active_transaction(member_id, book_id).is_none());
        assert_eq!(tables.book(book_id).unwrap().copies_available, 2);
    }

    #[test]
    fn test_close_then_reopen_in_one_set() {
        let (mut tables, member_id, book_id) = seeded();
        let (first, tx) = checkout_changes(member_id, book_id);
        tables.apply(&first).unwrap();

        let reopened = Transaction::open(member_id, book_id, Utc::now());
        let changes: ChangeSet = [
            Change::CloseTransaction {
                id: tx.id,
                return_date: Utc::now(),
            },
            Change::CreateTransaction(reopened.clone()),
        ]
        .into_iter()
        .collect();
        tables.apply(&changes).unwrap();

        assert_eq!(tables.active_transaction(member_id, book_id).unwrap().id, reopened.id);
        assert!(!tables.transaction(tx.id).unwrap().is_active());
    }

    #[test]
    fn test_close_twice_reports_already_closed() {
        let (mut tables, member_id, book_id) = seeded();
        let (first, tx) = checkout_changes(member_id, book_id);
        tables.apply(&first).unwrap();

        let close: ChangeSet = [Change::CloseTransaction {
            id: tx.id,
            return_date: Utc::now(),
        }]
        .into_iter()
        .collect();
        tables.apply(&close).unwrap();

        assert_eq!(tables.apply(&close), Err(LedgerError::AlreadyClosed(tx.id)));
        assert!(tables.active_transaction(member_id, book_id).is_none());
    }

    #[test]
    fn test_unknown_rows_are_not_found() {
        let (mut tables, member_id, _) = seeded();
        let missing = Transaction::open(member_id, BookId(99), Utc::now());
        let changes: ChangeSet = [Change::CreateTransaction(missing)].into_iter().collect();
        assert_eq!(tables.apply(&changes), Err(LedgerError::BookNotFound(BookId(99))));

        let id = TransactionId::new();
        let close: ChangeSet = [Change::CloseTransaction {
            id,
            return_date: Utc::now(),
        }]
        .into_iter()
        .collect();
        assert_eq!(tables.apply(&close), Err(LedgerError::TransactionNotFound(id)));
    }

    #[test]
    fn test_moves_apply_to_the_current_row() {
        let (mut tables, alice, book_id) = seeded();
        let bob = MemberId(2);
        tables
            .insert_member(Member::from_create(bob, MemberCreate::new("bob")))
            .unwrap();
        // Both sets were built while two copies were on the shelf
        let (first, _) = checkout_changes(alice, book_id);
        let (second, _) = checkout_changes(bob, book_id);
        let (third, _) = checkout_changes(alice, book_id);
        tables.apply(&first).unwrap();
        tables.apply(&second).unwrap();

        assert_eq!(tables.book(book_id).unwrap().copies_available, 0);
        assert!(matches!(tables.apply(&third), Err(LedgerError::ConstraintViolation(_))));

        let empty_shelf: ChangeSet = [take(book_id)].into_iter().collect();
        assert!(matches!(
            tables.apply(&empty_shelf),
            Err(LedgerError::InvariantViolation(_))
        ));
        assert_eq!(tables.active_loans(book_id), 2);
    }

    #[test]
    fn test_update_keeps_room_for_active_loans() {
        let (mut tables, member_id, book_id) = seeded();
        let (first, _) = checkout_changes(member_id, book_id);
        tables.apply(&first).unwrap();

        // One copy is out, so total == available would hide it
        let result = tables.update_book(
            book_id,
            BookUpdate {
                copies_available: Some(2),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert_eq!(tables.book(book_id).unwrap().copies_available, 1);

        let grown = tables
            .update_book(
                book_id,
                BookUpdate {
                    title: Some("Dune (2e)".into()),
                    copies_total: Some(5),
                    copies_available: Some(4),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(grown.copies_on_loan(), 1);
    }

    #[test]
    fn test_isbn_is_unique() {
        let (mut tables, _, _) = seeded();
        let result = tables.insert_book(BookId(2), BookCreate::new("Dune (reprint)", "Frank Herbert", "9780441013593"));
        assert!(matches!(result, Err(LedgerError::ConstraintViolation(_))));
    }

    #[test]
    fn test_books_are_ordered_by_title_then_author() {
        let mut tables = Tables::new();
        tables.insert_book(BookId(1), BookCreate::new("Neuromancer", "William Gibson", "9780441569595")).unwrap();
        tables.insert_book(BookId(2), BookCreate::new("Dune", "Frank Herbert", "9780441013593")).unwrap();
        tables
            .insert_book(BookId(3), BookCreate::new("Anathem", "Neal Stephenson", "9780061474095").with_copies(0))
            .unwrap();

        let titles: Vec<_> = tables.books(false).into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Anathem", "Dune", "Neuromancer"]);

        let available: Vec<_> = tables.books(true).into_iter().map(|b| b.title).collect();
        assert_eq!(available, vec!["Dune", "Neuromancer"]);
    }
}
