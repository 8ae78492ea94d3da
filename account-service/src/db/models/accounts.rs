//! Database models for accounts.

use crate::types::{AccountId, RoleId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Database request for creating a new account
#[derive(Debug, Clone)]
pub struct AccountCreateDBRequest {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub role_id: RoleId,
}

/// Database request for updating an account. The row is located by `username`; every other field
/// overwrites the stored value.
#[derive(Debug, Clone)]
pub struct AccountUpdateDBRequest {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub role_id: RoleId,
}

/// Database response for an account
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AccountDBResponse {
    pub id: AccountId,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub phone_number: String,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AccountDBResponse> for AccountUpdateDBRequest {
    fn from(account: AccountDBResponse) -> Self {
        Self {
            username: account.username,
            fullname: account.fullname,
            email: account.email,
            phone_number: account.phone_number,
            role_id: account.role_id,
        }
    }
}
