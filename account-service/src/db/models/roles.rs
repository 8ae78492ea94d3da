//! Database models for roles.

use crate::types::RoleId;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RoleDBResponse {
    pub id: RoleId,
    pub name: String,
}
