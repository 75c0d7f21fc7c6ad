use library_lending::config::LibraryConfig;
use library_lending::ledger::{LedgerError, LedgerStore};
use library_lending::lending::{ErrorKind, LendingError};
use library_lending::lifecycle::{try_setup_tracing, LibrarySystem};
use library_lending::model::{Book, BookCreate, BookId, BookUpdate, Member, MemberCreate, MemberId};

async fn seed(system: &LibrarySystem, copies: u32) -> (Member, Book) {
    // Every test races to install the subscriber; one wins
    try_setup_tracing();
    let member = system
        .ledger
        .register_member(MemberCreate::new("alice"))
        .await
        .unwrap();
    let book = system
        .ledger
        .register_book(BookCreate::new("Dune", "Frank Herbert", "9780441013593").with_copies(copies))
        .await
        .unwrap();
    (member, book)
}

async fn available(system: &LibrarySystem, book: &Book) -> u32 {
    system.queries.get_book(book.id).await.unwrap().copies_available
}

/// Full walk through checkout and return on a two-copy book.
#[tokio::test]
async fn test_checkout_and_return_walkthrough() {
    let system = LibrarySystem::new();
    let (alice, dune) = seed(&system, 2).await;

    // Checkout takes a copy and opens a loan
    let tx = system.lending.checkout(alice.id, dune.id).await.unwrap();
    assert!(tx.is_active());
    assert_eq!(available(&system, &dune).await, 1);
    assert_eq!(system.queries.list_active_loans(alice.id).await.unwrap(), vec![tx.clone()]);

    // A second checkout of the same book is refused and changes nothing
    let err = system.lending.checkout(alice.id, dune.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyCheckedOut);
    assert_eq!(available(&system, &dune).await, 1);

    // Return puts the copy back and closes the loan
    let closed = system.lending.return_book(alice.id, dune.id).await.unwrap();
    assert_eq!(closed.id, tx.id);
    assert!(closed.return_date.is_some());
    assert_eq!(available(&system, &dune).await, 2);
    assert!(system.queries.list_active_loans(alice.id).await.unwrap().is_empty());

    // A second return finds nothing to close
    let err = system.lending.return_book(alice.id, dune.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoActiveCheckout);
    assert_eq!(available(&system, &dune).await, 2);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_checkout_of_empty_shelf_changes_nothing() {
    let system = LibrarySystem::new();
    let (alice, dune) = seed(&system, 0).await;

    let result = system.lending.checkout(alice.id, dune.id).await;

    assert_eq!(result, Err(LendingError::Unavailable(dune.id)));
    assert_eq!(available(&system, &dune).await, 0);
    assert!(system.queries.member_history(alice.id).await.unwrap().is_empty());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_return_without_checkout_changes_nothing() {
    let system = LibrarySystem::new();
    let (alice, dune) = seed(&system, 1).await;

    let err = system.lending.return_book(alice.id, dune.id).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoActiveCheckout);
    assert_eq!(available(&system, &dune).await, 1);
    assert!(system.queries.member_history(alice.id).await.unwrap().is_empty());

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_checkout_then_return_restores_inventory() {
    let system = LibrarySystem::new();
    let (alice, dune) = seed(&system, 3).await;

    for _ in 0..3 {
        system.lending.checkout(alice.id, dune.id).await.unwrap();
        system.lending.return_book(alice.id, dune.id).await.unwrap();
    }

    assert_eq!(available(&system, &dune).await, 3);
    let history = system.queries.member_history(alice.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|tx| !tx.is_active()));
    // Newest checkout first
    assert!(history.windows(2).all(|w| w[0].checkout_date >= w[1].checkout_date));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_membership_gates_checkout_but_not_return() {
    let system = LibrarySystem::new();
    let (alice, dune) = seed(&system, 1).await;

    system.lending.checkout(alice.id, dune.id).await.unwrap();
    system.ledger.set_member_active(alice.id, false).await.unwrap();

    // An inactive member can still bring the book back...
    system.lending.return_book(alice.id, dune.id).await.unwrap();
    // ...but cannot borrow again
    let err = system.lending.checkout(alice.id, dune.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(available(&system, &dune).await, 1);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unknown_ids() {
    let system = LibrarySystem::new();
    let (alice, dune) = seed(&system, 1).await;

    let err = system.lending.checkout(alice.id, BookId(99)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = system.lending.checkout(MemberId(99), dune.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_return_by_transaction_id() {
    let system = LibrarySystem::new();
    let (alice, dune) = seed(&system, 1).await;
    let bob = system
        .ledger
        .register_member(MemberCreate::new("bob"))
        .await
        .unwrap();

    let tx = system.lending.checkout(alice.id, dune.id).await.unwrap();

    // Only the borrower can return the loan
    let err = system.lending.return_transaction(bob.id, tx.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let closed = system.lending.return_transaction(alice.id, tx.id).await.unwrap();
    assert!(!closed.is_active());
    assert_eq!(available(&system, &dune).await, 1);

    let err = system.lending.return_transaction(alice.id, tx.id).await.unwrap_err();
    assert_eq!(err, LendingError::AlreadyClosed(tx.id));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_catalogue_registration_and_listing() {
    let system = LibrarySystem::new();
    let ledger = &system.ledger;

    let neuromancer = ledger
        .register_book(BookCreate::new("Neuromancer", "William Gibson", "9780441569595"))
        .await
        .unwrap();
    ledger
        .register_book(BookCreate::new("Anathem", "Neal Stephenson", "9780061474095").with_copies(0))
        .await
        .unwrap();
    ledger
        .register_book(BookCreate::new("Dune", "Frank Herbert", "9780441013593"))
        .await
        .unwrap();

    // ISBNs are unique
    let dup = ledger
        .register_book(BookCreate::new("Neuromancer (2nd)", "William Gibson", "9780441569595"))
        .await;
    assert!(matches!(dup, Err(LedgerError::ConstraintViolation(_))));

    // More available than total is rejected
    let mut invalid = BookCreate::new("Count Zero", "William Gibson", "9780441117734");
    invalid.copies_available = 2;
    assert!(matches!(ledger.register_book(invalid).await, Err(LedgerError::Validation(_))));

    let titles: Vec<_> = system
        .queries
        .list_books()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, vec!["Anathem", "Dune", "Neuromancer"]);

    let on_shelf: Vec<_> = system
        .queries
        .list_available_books()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(on_shelf, vec!["Dune", "Neuromancer"]);

    // Maintenance re-validates the merged counters
    let result = ledger
        .update_book(
            neuromancer.id,
            BookUpdate {
                copies_total: Some(0),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(LedgerError::Validation(_))));
    let updated = ledger
        .update_book(
            neuromancer.id,
            BookUpdate {
                copies_total: Some(4),
                copies_available: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.to_string(), "Neuromancer by William Gibson");
    assert_eq!(ledger.get_book(neuromancer.id).await.unwrap().copies_available, 4);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_system_from_config() {
    let config = LibraryConfig {
        ledger_buffer: 4,
        guard_timeout: Some(std::time::Duration::from_millis(100)),
    };
    let system = LibrarySystem::with_config(&config);
    let (alice, dune) = seed(&system, 1).await;

    system.lending.checkout(alice.id, dune.id).await.unwrap();

    system.shutdown().await.unwrap();
}
