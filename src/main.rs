//! # Library Lending Demo
//!
//! Registers a member and a two-copy book, then walks through a checkout, a
//! duplicate checkout, a return and a duplicate return, logging each outcome.

use anyhow::{Context, Result};
use library_lending::config::LibraryConfig;
use library_lending::lifecycle::{setup_tracing, LibrarySystem};
use library_lending::model::{BookCreate, MemberCreate};
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let config = LibraryConfig::from_env().context("Invalid configuration")?;
    let system = LibrarySystem::with_config(&config);

    let span = tracing::info_span!("seeding");
    let (member, book) = async {
        let member = system
            .ledger
            .register_member(MemberCreate::new("alice"))
            .await
            .context("Failed to register member")?;
        let book = system
            .ledger
            .register_book(BookCreate::new("Dune", "Frank Herbert", "9780441013593").with_copies(2))
            .await
            .context("Failed to register book")?;
        anyhow::Ok((member, book))
    }
    .instrument(span)
    .await?;

    info!(member = %member, book = %book, "Seeded ledger");

    let span = tracing::info_span!("lending");
    async {
        let tx = system.lending.checkout(member.id, book.id).await?;
        info!(transaction = %tx, "First checkout");

        if let Err(e) = system.lending.checkout(member.id, book.id).await {
            info!(kind = ?e.kind(), "Second checkout refused");
        }

        let available = system.queries.list_available_books().await?;
        info!(books = available.len(), "Books on the shelf");

        let closed = system.lending.return_book(member.id, book.id).await?;
        info!(transaction = %closed, "Returned");

        if let Err(e) = system.lending.return_book(member.id, book.id).await {
            info!(kind = ?e.kind(), "Second return refused");
        }

        let history = system.queries.member_history(member.id).await?;
        info!(loans = history.len(), "Member history");
        anyhow::Ok(())
    }
    .instrument(span)
    .await?;

    let book = system.queries.get_book(book.id).await?;
    info!(available = book.copies_available, total = book.copies_total, "Final inventory");

    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
