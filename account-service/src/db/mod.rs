//! Database layer for data persistence and access.
//!
//! This module implements the data access layer using SQLx with SQLite.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ AccountService│  (service - multi-record units of work)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │ Repositories │  (db::handlers - queries, guards, row-count checks)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │   Executor   │  (db::executor - pooled connection or transaction)
//! └──────┬───────┘
//!        │
//!        ↓
//! ┌──────────────┐
//! │    SQLite    │
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`executor`]: Connection pool handle, transactions and the shared row-count check
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//!
//! # Transactions
//!
//! Repositories borrow whatever executor they are given. Writes that span tables go through a
//! transaction so that either all of them land or none do:
//!
//! ```ignore
//! let mut tx = db.begin().await?;
//! Credentials::new(&mut tx).delete(account_id).await?;
//! Accounts::new(&mut tx).delete(account_id).await?;
//! tx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are embedded at compile time; see [`crate::migrator`].

pub mod errors;
pub mod executor;
pub mod handlers;
pub mod models;

pub use executor::{Database, DbConn};
