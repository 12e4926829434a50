//! # dukaan-db: Persistence Layer for Dukaan
//!
//! Keeps the in-memory ledger durable. The ledger stays authoritative; this
//! crate mirrors it into SQLite after each unit of work and restores the
//! current day on startup.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dukaan Data Flow                                 │
//! │                                                                         │
//! │  IntentHandler mutates LedgerStore (dukaan-core)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     dukaan-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │PersistenceSync│    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (sync.rs)   │───►│ InventoryRepo │    │  (embedded)  │  │   │
//! │  │   │  watermarks   │    │ SaleRepo      │    │ 001_init.sql │  │   │
//! │  │   │  timeouts     │    │ ExpenseRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ Database (pool.rs)            │   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                                   ▼                                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (dukaan.db)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per persisted collection
//! - [`sync`] - Watermarked save and day-scoped load
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dukaan_core::LedgerStore;
//! use dukaan_db::{Database, DbConfig, PersistenceSync};
//!
//! let db = Database::new(DbConfig::new("dukaan.db")).await?;
//! let mut sync = PersistenceSync::new(db);
//!
//! let mut ledger = LedgerStore::new();
//! let report = sync.load(&mut ledger).await;
//!
//! ledger.add_stock("aloo", 10.0, "kg", 20.0)?;
//! sync.save(&ledger).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sync;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use sync::{LoadReport, PersistenceSync, SaveReport};

// Repository re-exports for convenience
pub use repository::expense::ExpenseRepository;
pub use repository::inventory::{InventoryRepository, InventoryRows, RejectedRow};
pub use repository::sale::SaleRepository;
