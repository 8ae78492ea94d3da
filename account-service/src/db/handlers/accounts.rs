//! Database repository for accounts.

use crate::db::{
    errors::{DbError, Result},
    executor::{DbConn, expect_rows_affected},
    handlers::repository::Repository,
    models::accounts::{AccountCreateDBRequest, AccountDBResponse, AccountUpdateDBRequest},
};
use crate::types::{AccountId, mask_username};
use sqlx::{QueryBuilder, Sqlite};
use tracing::instrument;

const ACCOUNT_COLUMNS: &str = "id, username, fullname, email, phone_number, role_id, created_at, updated_at";

pub struct Accounts<'c> {
    db: &'c mut DbConn,
}

#[async_trait::async_trait]
impl<'c> Repository for Accounts<'c> {
    type CreateRequest = AccountCreateDBRequest;
    type UpdateRequest = AccountUpdateDBRequest;
    type Response = AccountDBResponse;
    type Id = AccountId;

    #[instrument(skip(self, request), fields(username = %mask_username(&request.username)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Id> {
        let username = required_username(&request.username)?;

        let result = sqlx::query(
            r#"
            INSERT INTO accounts (username, fullname, email, phone_number, role_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(request.fullname.trim())
        .bind(request.email.trim())
        .bind(request.phone_number.trim())
        .bind(request.role_id)
        .execute(&mut *self.db)
        .await?;

        expect_rows_affected(&result, 1)?;
        Ok(result.last_insert_rowid())
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Self::Response> {
        if id == 0 {
            return Err(DbError::MissingRequiredField { field: "id" });
        }

        let account = sqlx::query_as::<_, AccountDBResponse>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(account)
    }

    #[instrument(skip(self, request), fields(username = %mask_username(&request.username)), err)]
    async fn update(&mut self, request: &Self::UpdateRequest) -> Result<()> {
        let username = required_username(&request.username)?;

        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                fullname = ?,
                email = ?,
                phone_number = ?,
                role_id = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE username = ?
            "#,
        )
        .bind(request.fullname.trim())
        .bind(request.email.trim())
        .bind(request.phone_number.trim())
        .bind(request.role_id)
        .bind(username)
        .execute(&mut *self.db)
        .await?;

        expect_rows_affected(&result, 1)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<()> {
        if id == 0 {
            return Err(DbError::MissingRequiredField { field: "id" });
        }

        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        expect_rows_affected(&result, 1)
    }
}

impl<'c> Accounts<'c> {
    pub fn new(db: &'c mut DbConn) -> Self {
        Self { db }
    }

    #[instrument(skip(self, username), fields(username = %mask_username(username)), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<AccountDBResponse> {
        let username = required_username(username)?;

        let account =
            sqlx::query_as::<_, AccountDBResponse>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?"))
                .bind(username)
                .fetch_optional(&mut *self.db)
                .await?
                .ok_or(DbError::NotFound)?;

        Ok(account)
    }

    #[instrument(skip(self, username), fields(username = %mask_username(username)), err)]
    pub async fn delete_by_username(&mut self, username: &str) -> Result<()> {
        let username = required_username(username)?;

        let result = sqlx::query("DELETE FROM accounts WHERE username = ?")
            .bind(username)
            .execute(&mut *self.db)
            .await?;

        expect_rows_affected(&result, 1)
    }

    /// Uniqueness check. Advisory only: the UNIQUE constraint on `username` is what actually
    /// rejects duplicates.
    #[instrument(skip(self, username), fields(username = %mask_username(username)), err)]
    pub async fn exists_by_username(&mut self, username: &str) -> Result<bool> {
        let username = required_username(username)?;

        let taken: i64 = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = ?)")
            .bind(username)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(taken != 0)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<AccountDBResponse>> {
        let accounts = sqlx::query_as::<_, AccountDBResponse>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"))
            .fetch_all(&mut *self.db)
            .await?;

        Ok(accounts)
    }

    /// Fetch the accounts with the given ids, ordered by id. Ids with no row are absent from the
    /// result.
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn list_by_ids(&mut self, ids: &[AccountId]) -> Result<Vec<AccountDBResponse>> {
        if ids.is_empty() {
            return Err(DbError::InvalidArgument {
                message: "account id list is empty".to_string(),
            });
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id");

        let accounts = query.build_query_as::<AccountDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(accounts)
    }
}

fn required_username(username: &str) -> Result<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DbError::MissingRequiredField { field: "username" });
    }
    Ok(username)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::account_create_request;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_account_trims_fields(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let mut request = account_create_request("  trimmed  ");
        request.fullname = " Trimmed User ".to_string();
        request.email = "\ttrimmed@example.com\n".to_string();

        let id = repo.create(&request).await.unwrap();
        let account = repo.get_by_id(id).await.unwrap();

        assert_eq!(account.id, id);
        assert_eq!(account.username, "trimmed");
        assert_eq!(account.fullname, "Trimmed User");
        assert_eq!(account.email, "trimmed@example.com");
        assert_eq!(account.role_id, 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_requires_username(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let result = repo.create(&account_create_request("   ")).await;
        assert!(matches!(result, Err(DbError::MissingRequiredField { field: "username" })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_username_is_unique_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        repo.create(&account_create_request("dupe")).await.unwrap();
        let err = repo.create(&account_create_request("dupe")).await.unwrap_err();

        assert!(err.is_unique_violation_on("username"), "unexpected error: {err:?}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_role_is_foreign_key_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let mut request = account_create_request("norole");
        request.role_id = 42;
        let result = repo.create(&request).await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })), "unexpected result: {result:?}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_lookups_guard_and_miss(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        assert!(matches!(repo.get_by_id(0).await, Err(DbError::MissingRequiredField { field: "id" })));
        assert!(matches!(repo.get_by_id(77).await, Err(DbError::NotFound)));
        assert!(matches!(
            repo.get_by_username("").await,
            Err(DbError::MissingRequiredField { field: "username" })
        ));
        assert!(matches!(repo.get_by_username("ghost").await, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_exists_by_username(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        assert!(!repo.exists_by_username("bob").await.unwrap());
        repo.create(&account_create_request("bob")).await.unwrap();
        assert!(repo.exists_by_username("bob").await.unwrap());
        assert!(repo.exists_by_username(" bob ").await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_by_username(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let id = repo.create(&account_create_request("carol")).await.unwrap();
        let mut update = AccountUpdateDBRequest::from(repo.get_by_id(id).await.unwrap());
        update.fullname = "  Carol Updated ".to_string();
        update.role_id = 1;
        repo.update(&update).await.unwrap();

        let account = repo.get_by_id(id).await.unwrap();
        assert_eq!(account.fullname, "Carol Updated");
        assert_eq!(account.role_id, 1);
        assert_eq!(account.username, "carol");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_row_is_write_count_mismatch(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let mut update = AccountUpdateDBRequest::from(AccountDBResponse {
            id: 1,
            username: "nobody".to_string(),
            fullname: String::new(),
            email: String::new(),
            phone_number: String::new(),
            role_id: 2,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
        assert!(matches!(
            repo.update(&update).await,
            Err(DbError::WriteCountMismatch { expected: 1, actual: 0 })
        ));

        update.username = String::new();
        assert!(matches!(
            repo.update(&update).await,
            Err(DbError::MissingRequiredField { field: "username" })
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_variants(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let dave = repo.create(&account_create_request("dave")).await.unwrap();
        repo.create(&account_create_request("erin")).await.unwrap();

        repo.delete(dave).await.unwrap();
        assert!(matches!(repo.delete(dave).await, Err(DbError::WriteCountMismatch { .. })));
        assert!(matches!(repo.delete(0).await, Err(DbError::MissingRequiredField { .. })));

        repo.delete_by_username("erin").await.unwrap();
        assert!(matches!(
            repo.delete_by_username("erin").await,
            Err(DbError::WriteCountMismatch { .. })
        ));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_and_list_by_ids(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Accounts::new(&mut conn);

        let a = repo.create(&account_create_request("acc_a")).await.unwrap();
        let b = repo.create(&account_create_request("acc_b")).await.unwrap();
        let c = repo.create(&account_create_request("acc_c")).await.unwrap();

        let all = repo.list().await.unwrap();
        assert_eq!(all.iter().map(|a| a.id).collect::<Vec<_>>(), vec![a, b, c]);

        let some = repo.list_by_ids(&[c, a, 9999]).await.unwrap();
        assert_eq!(some.iter().map(|a| a.id).collect::<Vec<_>>(), vec![a, c]);

        assert!(matches!(repo.list_by_ids(&[]).await, Err(DbError::InvalidArgument { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_repository_rebinds_to_transaction(pool: SqlitePool) {
        {
            let mut tx = pool.begin().await.unwrap();
            Accounts::new(&mut tx).create(&account_create_request("ghost")).await.unwrap();
            // dropped without commit
        }

        let mut conn = pool.acquire().await.unwrap();
        assert!(!Accounts::new(&mut conn).exists_by_username("ghost").await.unwrap());

        let mut tx = pool.begin().await.unwrap();
        Accounts::new(&mut tx).create(&account_create_request("kept")).await.unwrap();
        tx.commit().await.unwrap();

        assert!(Accounts::new(&mut conn).exists_by_username("kept").await.unwrap());
    }
}
