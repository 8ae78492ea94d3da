//! Account lifecycle orchestration.
//!
//! [`AccountService`] is the public contract consumed by the HTTP layer. It composes the
//! repositories in [`crate::db::handlers`] and the [`HashService`](crate::auth::password::HashService)
//! into units of work:
//!
//! - read-only checks run on an ambient pooled connection
//! - every write runs inside exactly one transaction, with repositories constructed over it
//! - a transaction that is not committed is rolled back when dropped, including when the
//!   request future is cancelled
//!
//! Storage errors are reclassified into [`crate::errors::Error`] before they leave this module.

pub mod accounts;

pub use accounts::AccountService;
