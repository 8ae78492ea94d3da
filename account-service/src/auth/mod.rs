//! Credential handling.
//!
//! Accounts authenticate with a username and password. The password is never stored: the
//! [`password::HashService`] turns it into a salted Argon2id PHC string which is kept in the
//! `account_passwords` table, and login checks compare a candidate password against that string.
//!
//! # Modules
//!
//! - [`password`]: hashing, verification and the Argon2 cost parameters

pub mod password;
