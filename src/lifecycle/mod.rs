//! # System Lifecycle
//!
//! Starting, wiring and stopping the lending core.
//!
//! [`LibrarySystem`] spawns the ledger task, shares its client and one
//! [`InventoryGuard`](crate::guard::InventoryGuard) between the lending engine and
//! the query facade, and joins the task again on [`LibrarySystem::shutdown`].
//!
//! ```rust,ignore
//! setup_tracing();
//! let config = LibraryConfig::from_env()?;
//! let system = LibrarySystem::with_config(&config);
//! // ...
//! system.shutdown().await?;
//! ```

mod library_system;
pub mod tracing;

pub use library_system::LibrarySystem;
pub use self::tracing::{setup_tracing, try_setup_tracing};
