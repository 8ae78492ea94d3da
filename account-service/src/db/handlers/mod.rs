//! Repository implementations for database access.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a borrowed [`DbConn`](crate::db::executor::DbConn), which may be a pooled connection
//!   or a transaction
//! - Provides strongly-typed CRUD operations
//! - Guards required keys and checks affected row counts
//! - Returns domain models from [`crate::db::models`]
//!
//! Rebinding a repository to a transaction is just constructing a new one over it:
//!
//! ```ignore
//! use account_service::db::handlers::{Accounts, Repository};
//!
//! let mut tx = db.begin().await?;
//! let mut accounts = Accounts::new(&mut tx);
//! let id = accounts.create(&request).await?;
//! tx.commit().await?;
//! ```
//!
//! # Available Repositories
//!
//! - [`Accounts`]: account identities, uniqueness checks and bulk reads
//! - [`Credentials`]: the hashed password paired with each account
//! - [`Roles`]: read-only role reference data

pub mod accounts;
pub mod credentials;
pub mod repository;
pub mod roles;

pub use accounts::Accounts;
pub use credentials::Credentials;
pub use repository::Repository;
pub use roles::Roles;
