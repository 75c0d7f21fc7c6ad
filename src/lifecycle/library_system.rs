use crate::config::LibraryConfig;
use crate::guard::InventoryGuard;
use crate::ledger::{self, LedgerClient};
use crate::lending::LendingEngine;
use crate::query::QueryFacade;
use anyhow::{anyhow, Result};
use tracing::{error, info};

/// The runtime orchestrator for the lending core.
///
/// `LibrarySystem` is responsible for:
/// - **Lifecycle Management**: Starting and stopping the ledger task
/// - **Dependency Wiring**: Handing one ledger client and one inventory guard to
///   the lending engine and the query facade
///
/// # Example
///
/// ```ignore
/// let system = LibrarySystem::new();
///
/// let member = system.ledger.register_member(MemberCreate::new("alice")).await?;
/// let book = system.ledger.register_book(BookCreate::new("Dune", "Frank Herbert", "9780441013593")).await?;
/// let tx = system.lending.checkout(member.id, book.id).await?;
///
/// // Gracefully shut down when done
/// system.shutdown().await?;
/// ```
pub struct LibrarySystem {
    /// Client for the ledger task (registration and maintenance go through here)
    pub ledger: LedgerClient,

    /// Checkout and return
    pub lending: LendingEngine,

    /// Read-only projections
    pub queries: QueryFacade,

    /// Task handles for the running ledger (used for graceful shutdown)
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl LibrarySystem {
    /// Starts a system with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&LibraryConfig::default())
    }

    /// Spawns the ledger task and wires the engine and facade to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_config(config: &LibraryConfig) -> Self {
        let (ledger_actor, ledger) = ledger::new(config.ledger_buffer);
        let handle = tokio::spawn(ledger_actor.run());

        let lending = LendingEngine::new(ledger.clone(), InventoryGuard::new())
            .with_guard_timeout(config.guard_timeout);
        let queries = QueryFacade::new(ledger.clone());

        info!(
            ledger_buffer = config.ledger_buffer,
            guard_timeout = ?config.guard_timeout,
            "Library system started"
        );

        Self {
            ledger,
            lending,
            queries,
            handles: vec![handle],
        }
    }

    /// Gracefully shuts down the system.
    ///
    /// Dropping every client closes the ledger's channel; the ledger finishes the
    /// requests already queued and exits. Clones of the clients held elsewhere keep
    /// the ledger alive, so drop them first.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if the ledger shut down cleanly
    /// - `Err(_)` if the ledger task failed or panicked
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down library system...");

        drop(self.lending);
        drop(self.queries);
        drop(self.ledger);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Ledger task failed: {:?}", e);
                return Err(anyhow!("Ledger task failed: {e}"));
            }
        }

        info!("Library system shutdown complete.");
        Ok(())
    }
}

impl Default for LibrarySystem {
    fn default() -> Self {
        Self::new()
    }
}
