//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! Account routes live under `/v1/accounts`; `/healthz` sits at the root. The OpenAPI document is
//! served at `/openapi.json`.

pub mod handlers;
pub mod models;
