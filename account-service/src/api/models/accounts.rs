//! API request/response models for accounts.

use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Platform-wide role attached to an account. Backed by the `account_role` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    /// Name of the role row in `account_role`.
    pub fn name(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "admin" => Some(Role::Admin),
            "member" => Some(Role::Member),
            _ => None,
        }
    }
}

/// The caller-visible fields of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountInfo {
    pub username: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    pub role: Role,
}

// Account request models
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    pub account_info: AccountInfo,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckAccountValidRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GetAccountListRequest {
    pub account_ids: Vec<AccountId>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub account_info: AccountInfo,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

// Account response models
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountIdResponse {
    pub account_id: AccountId,
}

/// Result of a credential check. `account_id` is absent when the password does not match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CheckAccountValidResponse {
    pub account_id: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IsUsernameTakenResponse {
    pub is_taken: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub account_id: AccountId,
    pub account_info: AccountInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountListResponse {
    pub accounts: Vec<AccountResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteAccountResponse {
    pub username: String,
}
