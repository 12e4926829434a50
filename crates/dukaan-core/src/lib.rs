//! # dukaan-core: Pure Ledger Logic for Dukaan
//!
//! Everything a voice-driven shop ledger needs to turn classified intents into
//! stock, sales, expenses and profit, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dukaan Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Intent classifier (external, black box)               │   │
//! │  │      "das kilo aloo aaya, do sau ka" ──► IntentBatch            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON lines                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dukaan-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ normalize │─►│  ledger   │◄─│  handler  │─►│  result   │  │   │
//! │  │   │  aloo →   │  │ inventory │  │ intent →  │  │  tagged   │  │   │
//! │  │   │  potato   │  │ sales/exp │  │ operation │  │  actions  │  │   │
//! │  │   └───────────┘  └─────┬─────┘  └───────────┘  └───────────┘  │   │
//! │  │                        ▼                                        │   │
//! │  │                  ┌───────────┐                                  │   │
//! │  │                  │  summary  │  COGS, profit, low stock         │   │
//! │  │                  └───────────┘                                  │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    dukaan-db (Persistence)                      │   │
//! │  │          watermark sync, SQLite, migrations, repositories       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`normalize`] - Multilingual item/category canonicalization
//! - [`ledger`] - Inventory with weighted-average costing, sales, expenses
//! - [`summary`] - Totals, COGS, profit, low stock
//! - [`intent`] - Classifier input records
//! - [`handler`] - Intent → ledger operation dispatch
//! - [`result`] - Tagged action results
//! - [`types`] - Domain records
//! - [`error`] / [`validation`] - Typed errors and input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use dukaan_core::{IntentBatch, IntentHandler, HandlerOptions, LedgerStore};
//!
//! let mut ledger = LedgerStore::new();
//! let batch = IntentBatch::from_json(
//!     r#"{"intents": [
//!         {"intent": "inventory_in", "item": "आलू", "quantity": 10, "unit": "kg", "total_amount": 200},
//!         {"intent": "sale", "item": "aloo", "quantity": 4, "unit": "kg", "price_per_unit": 30}
//!     ]}"#,
//! ).unwrap();
//!
//! let outcome = IntentHandler::new(&mut ledger, HandlerOptions::default()).handle_batch(&batch);
//!
//! assert_eq!(outcome.results.len(), 2);
//! assert_eq!(ledger.get_stock("potato").unwrap().quantity, 6.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod handler;
pub mod intent;
pub mod ledger;
pub mod normalize;
pub mod result;
pub mod summary;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use handler::{HandlerOptions, IntentHandler};
pub use intent::{IntentBatch, IntentKind, IntentRecord};
pub use ledger::LedgerStore;
pub use normalize::NormalizationEngine;
pub use result::{ActionResult, BatchOutcome, ErrorTag, LowStockAlert};
pub use summary::{SummaryCalculator, SummaryOptions};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Quantity at or below which a positive stock level is reported as low.
pub const DEFAULT_LOW_STOCK_THRESHOLD: f64 = 5.0;

/// Number of top sellers and expenses listed in a summary.
pub const DEFAULT_TOP_N: usize = 5;
