//! Database repository for account credentials.

use crate::db::{
    errors::{DbError, Result},
    executor::{DbConn, expect_rows_affected},
    handlers::repository::Repository,
    models::credentials::{CredentialDBRequest, CredentialDBResponse},
};
use crate::types::AccountId;
use tracing::instrument;

pub struct Credentials<'c> {
    db: &'c mut DbConn,
}

#[async_trait::async_trait]
impl<'c> Repository for Credentials<'c> {
    type CreateRequest = CredentialDBRequest;
    type UpdateRequest = CredentialDBRequest;
    type Response = CredentialDBResponse;
    type Id = AccountId;

    #[instrument(skip(self, request), fields(account_id = request.of_account_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Id> {
        let hashed = validate(request)?;

        let result = sqlx::query("INSERT INTO account_passwords (of_account_id, hashed_string) VALUES (?, ?)")
            .bind(request.of_account_id)
            .bind(hashed)
            .execute(&mut *self.db)
            .await?;

        expect_rows_affected(&result, 1)?;
        Ok(request.of_account_id)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, account_id: Self::Id) -> Result<Self::Response> {
        if account_id == 0 {
            return Err(DbError::MissingRequiredField { field: "of_account_id" });
        }

        let credential = sqlx::query_as::<_, CredentialDBResponse>(
            "SELECT of_account_id, hashed_string, created_at, updated_at FROM account_passwords WHERE of_account_id = ?",
        )
        .bind(account_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(credential)
    }

    #[instrument(skip(self, request), fields(account_id = request.of_account_id), err)]
    async fn update(&mut self, request: &Self::UpdateRequest) -> Result<()> {
        let hashed = validate(request)?;

        let result = sqlx::query(
            r#"
            UPDATE account_passwords SET
                hashed_string = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE of_account_id = ?
            "#,
        )
        .bind(hashed)
        .bind(request.of_account_id)
        .execute(&mut *self.db)
        .await?;

        expect_rows_affected(&result, 1)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, account_id: Self::Id) -> Result<()> {
        if account_id == 0 {
            return Err(DbError::MissingRequiredField { field: "of_account_id" });
        }

        let result = sqlx::query("DELETE FROM account_passwords WHERE of_account_id = ?")
            .bind(account_id)
            .execute(&mut *self.db)
            .await?;

        expect_rows_affected(&result, 1)
    }
}

impl<'c> Credentials<'c> {
    pub fn new(db: &'c mut DbConn) -> Self {
        Self { db }
    }
}

fn validate(request: &CredentialDBRequest) -> Result<&str> {
    if request.of_account_id == 0 {
        return Err(DbError::MissingRequiredField { field: "of_account_id" });
    }
    let hashed = request.hashed_string.trim();
    if hashed.is_empty() {
        return Err(DbError::MissingRequiredField { field: "hashed_string" });
    }
    Ok(hashed)
}
