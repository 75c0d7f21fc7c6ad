//! Pure data structures for the lending ledger: [`Member`], [`Book`] and [`Transaction`].

pub mod book;
pub mod member;
pub mod transaction;

pub use book::*;
pub use member::*;
pub use transaction::*;
