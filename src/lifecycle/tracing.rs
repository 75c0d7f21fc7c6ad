//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the subscriber used by the demo binary: a compact
//! `tracing_subscriber::fmt` layer filtered by `RUST_LOG`, without module paths.
//!
//! ## What Gets Traced
//!
//! - **Ledger Lifecycle**: startup, shutdown and the final row counts
//! - **Commits**: every accepted or rejected change set
//! - **Lending**: a span per checkout and return carrying the member and book ids,
//!   an `info` line on success, `warn` on a refused request, `error` on a fault
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lending outcomes only
//! RUST_LOG=info cargo run
//!
//! # Change sets, guard hand-offs and every ledger read
//! RUST_LOG=debug cargo run
//!
//! # Only the guard
//! RUST_LOG=library_lending::guard=trace cargo run
//! ```
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO Ledger started
//! INFO Registered member id=member_1
//! INFO Registered book id=book_1 isbn=9780441013593 copies=2
//! INFO checkout:Committed member_id=member_1 book_id=book_1 changes=2
//! INFO checkout:Checked out member_id=member_1 book_id=book_1 tx_id=tx_0192... remaining=1
//! WARN checkout:Request refused member_id=member_1 book_id=book_1 error=member_1 already has book_1 checked out kind=AlreadyCheckedOut
//! ```

/// Installs the global subscriber. Panics if one is already installed.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

/// Like [`setup_tracing`], but leaves an already installed subscriber in place.
///
/// Returns `false` when another subscriber was installed first.
pub fn try_setup_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}
