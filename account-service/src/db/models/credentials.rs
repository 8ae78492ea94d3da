//! Database models for account credentials.

use crate::types::AccountId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating or replacing the credential of an account
#[derive(Debug, Clone)]
pub struct CredentialDBRequest {
    pub of_account_id: AccountId,
    pub hashed_string: String,
}

/// Database response for a credential
#[derive(Debug, Clone, FromRow)]
pub struct CredentialDBResponse {
    pub of_account_id: AccountId,
    pub hashed_string: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
