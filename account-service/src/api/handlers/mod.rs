//! HTTP handlers. Each one delegates to [`crate::service::AccountService`] and maps its
//! [`crate::errors::Error`] to a response.

pub mod accounts;
pub mod health;
