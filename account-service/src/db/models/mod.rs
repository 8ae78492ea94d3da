//! Database record structures matching the table schemas.
//!
//! - [`accounts`]: account identity rows and the create/update requests for them
//! - [`credentials`]: hashed password rows keyed by account id
//! - [`roles`]: static role reference rows

pub mod accounts;
pub mod credentials;
pub mod roles;
