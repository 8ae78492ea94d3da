//! API request and response data models.
//!
//! These structures are serialized as JSON bodies and documented in the OpenAPI schema via
//! `utoipa::ToSchema`. They are also the input and output types of
//! [`AccountService`](crate::service::AccountService), so the HTTP layer is a thin mapping.

pub mod accounts;
