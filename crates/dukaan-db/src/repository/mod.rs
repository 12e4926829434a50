//! # Repository Module
//!
//! One repository per persisted collection.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PersistenceSync                                                       │
//! │       │                                                                 │
//! │       │  db.sales().list_for_day("2026-10-19")                         │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── list_for_day(&self, day)         reads go through the pool        │
//! │  ├── count_for_day(&self, day)                                         │
//! │  └── append_with(conn, record, day)   writes join the caller's         │
//! │       │                               transaction                       │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InventoryRepository`](inventory::InventoryRepository) - Upsert and list stock entries
//! - [`SaleRepository`](sale::SaleRepository) - Append and list day-scoped sales
//! - [`ExpenseRepository`](expense::ExpenseRepository) - Append and list day-scoped expenses

pub mod expense;
pub mod inventory;
pub mod sale;
