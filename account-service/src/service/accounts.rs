//! Account lifecycle operations.

use std::collections::HashMap;

use sqlx::{Sqlite, Transaction};
use tracing::{info, instrument};

use crate::api::models::accounts::{AccountInfo, AccountResponse, Role};
use crate::auth::password::HashService;
use crate::db::{
    Database, DbConn,
    errors::DbError,
    handlers::{Accounts, Credentials, Repository, Roles},
    models::{
        accounts::{AccountCreateDBRequest, AccountDBResponse, AccountUpdateDBRequest},
        credentials::CredentialDBRequest,
    },
};
use crate::errors::{Error, Result};
use crate::types::{AccountId, RoleId, mask_username};

const ACCOUNT: &str = "Account";
const CREDENTIAL: &str = "Credential for account";

/// Coordinates accounts and their credentials as single units of work.
#[derive(Debug, Clone)]
pub struct AccountService {
    db: Database,
    hasher: HashService,
}

impl AccountService {
    pub fn new(db: Database, hasher: HashService) -> Self {
        Self { db, hasher }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Create an account and its credential together.
    ///
    /// The username check before the transaction is advisory; two concurrent calls can both pass
    /// it, and the loser is rejected by the UNIQUE constraint on insert. Both paths report
    /// [`Error::AlreadyExists`].
    #[instrument(skip_all, fields(username = %mask_username(&info.username)), err)]
    pub async fn create_account(&self, info: AccountInfo, password: String) -> Result<AccountId> {
        let username = info.username.trim().to_string();

        let role_id = {
            let mut conn = self.acquire().await?;
            let taken = Accounts::new(&mut conn)
                .exists_by_username(&username)
                .await
                .map_err(|e| Error::from_db(e, "check username", ACCOUNT, &username))?;
            if taken {
                return Err(Error::AlreadyExists {
                    resource: ACCOUNT.to_string(),
                    id: username,
                });
            }
            resolve_role_id(&mut conn, info.role).await?
        };

        // Hashed before the transaction opens so the write lock is only held for the inserts.
        let hashed_string = self.hash_password(password).await?;

        let mut tx = self.begin().await?;

        let account_id = Accounts::new(&mut tx)
            .create(&AccountCreateDBRequest {
                username: username.clone(),
                fullname: info.fullname,
                email: info.email,
                phone_number: info.phone_number,
                role_id,
            })
            .await
            .map_err(|e| {
                if e.is_unique_violation_on("username") {
                    Error::from_db(e, "insert account", ACCOUNT, &username)
                } else {
                    Error::from_store(e, "insert account")
                }
            })?;

        Credentials::new(&mut tx)
            .create(&CredentialDBRequest {
                of_account_id: account_id,
                hashed_string,
            })
            .await
            .map_err(|e| Error::from_store(e, "insert credential"))?;

        commit(tx).await?;
        info!(account_id, "Created account");
        Ok(account_id)
    }

    /// Delete an account and its credential. The credential goes first.
    #[instrument(skip(self), err)]
    pub async fn delete_account(&self, account_id: AccountId) -> Result<()> {
        let mut tx = self.begin().await?;

        Accounts::new(&mut tx)
            .get_by_id(account_id)
            .await
            .map_err(|e| Error::from_db(e, "get account", ACCOUNT, account_id))?;
        delete_pair(&mut tx, account_id).await?;

        commit(tx).await?;
        info!(account_id, "Deleted account");
        Ok(())
    }

    /// Delete an account by username, resolving it to an id first. Returns the username.
    #[instrument(skip_all, fields(username = %mask_username(username)), err)]
    pub async fn delete_account_by_username(&self, username: &str) -> Result<String> {
        let username = username.trim();
        if !self.is_username_taken(username).await? {
            return Err(Error::NotFound {
                resource: ACCOUNT.to_string(),
                id: username.to_string(),
            });
        }

        let mut tx = self.begin().await?;

        let account = Accounts::new(&mut tx)
            .get_by_username(username)
            .await
            .map_err(|e| Error::from_db(e, "get account", ACCOUNT, username))?;
        delete_pair(&mut tx, account.id).await?;

        commit(tx).await?;
        info!(account_id = account.id, "Deleted account");
        Ok(account.username)
    }

    /// Overwrite the mutable fields of an account. Id and username are kept; the username in
    /// `info` is ignored.
    #[instrument(skip(self, info), err)]
    pub async fn update_account_info(&self, account_id: AccountId, info: AccountInfo) -> Result<AccountId> {
        let mut tx = self.begin().await?;

        let current = Accounts::new(&mut tx)
            .get_by_id(account_id)
            .await
            .map_err(|e| Error::from_db(e, "get account", ACCOUNT, account_id))?;
        let role_id = resolve_role_id(&mut tx, info.role).await?;

        let update = AccountUpdateDBRequest {
            fullname: info.fullname,
            email: info.email,
            phone_number: info.phone_number,
            role_id,
            ..AccountUpdateDBRequest::from(current)
        };
        Accounts::new(&mut tx)
            .update(&update)
            .await
            .map_err(|e| Error::from_store(e, "update account"))?;

        commit(tx).await?;
        info!(account_id, "Updated account");
        Ok(account_id)
    }

    /// Replace the password of an existing account.
    #[instrument(skip(self, password), err)]
    pub async fn update_account_password(&self, account_id: AccountId, password: String) -> Result<AccountId> {
        let hashed_string = self.hash_password(password).await?;

        let mut tx = self.begin().await?;

        Accounts::new(&mut tx)
            .get_by_id(account_id)
            .await
            .map_err(|e| Error::from_db(e, "get account", ACCOUNT, account_id))?;
        Credentials::new(&mut tx)
            .update(&CredentialDBRequest {
                of_account_id: account_id,
                hashed_string,
            })
            .await
            .map_err(|e| Error::from_store(e, "update credential"))?;

        commit(tx).await?;
        info!(account_id, "Updated account password");
        Ok(account_id)
    }

    /// Check a username/password pair. A wrong password is `Ok(None)`, not an error.
    #[instrument(skip_all, fields(username = %mask_username(username)), err)]
    pub async fn check_account_valid(&self, username: &str, password: String) -> Result<Option<AccountId>> {
        let (account_id, hashed_string) = {
            let mut conn = self.acquire().await?;
            let account = Accounts::new(&mut conn)
                .get_by_username(username)
                .await
                .map_err(|e| Error::from_db(e, "get account", ACCOUNT, username.trim()))?;
            let credential = Credentials::new(&mut conn)
                .get_by_id(account.id)
                .await
                .map_err(|e| Error::from_db(e, "get credential", CREDENTIAL, account.id))?;
            (account.id, credential.hashed_string)
        };

        let hasher = self.hasher;
        let is_valid = tokio::task::spawn_blocking(move || hasher.verify(&password, &hashed_string))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password verification task: {e}"),
            })??;

        Ok(is_valid.then_some(account_id))
    }

    #[instrument(skip_all, fields(username = %mask_username(username)), err)]
    pub async fn is_username_taken(&self, username: &str) -> Result<bool> {
        let mut conn = self.acquire().await?;
        Accounts::new(&mut conn)
            .exists_by_username(username)
            .await
            .map_err(|e| Error::from_db(e, "check username", ACCOUNT, username.trim()))
    }

    #[instrument(skip(self), err)]
    pub async fn get_account(&self, account_id: AccountId) -> Result<AccountResponse> {
        let mut conn = self.acquire().await?;
        let account = Accounts::new(&mut conn)
            .get_by_id(account_id)
            .await
            .map_err(|e| Error::from_db(e, "get account", ACCOUNT, account_id))?;

        let mut projected = project(&mut conn, vec![account]).await?;
        projected.pop().ok_or_else(|| Error::Internal {
            operation: "project account".to_string(),
        })
    }

    #[instrument(skip(self), err)]
    pub async fn get_account_all(&self) -> Result<Vec<AccountResponse>> {
        let mut conn = self.acquire().await?;
        let accounts = Accounts::new(&mut conn)
            .list()
            .await
            .map_err(|e| Error::from_store(e, "list accounts"))?;
        project(&mut conn, accounts).await
    }

    /// Fetch the given accounts, ordered by id. Ids with no account are left out.
    #[instrument(skip(self, account_ids), fields(count = account_ids.len()), err)]
    pub async fn get_account_list(&self, account_ids: &[AccountId]) -> Result<Vec<AccountResponse>> {
        let mut conn = self.acquire().await?;
        let accounts = Accounts::new(&mut conn).list_by_ids(account_ids).await.map_err(|e| match e {
            DbError::InvalidArgument { message } => Error::InvalidArgument { message },
            other => Error::from_store(other, "list accounts"),
        })?;
        project(&mut conn, accounts).await
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        // Hash the password on a blocking thread to avoid blocking async runtime
        let hasher = self.hasher;
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password hashing task: {e}"),
            })??;
        Ok(hashed)
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<Sqlite>> {
        self.db.acquire().await.map_err(|e| Error::from_store(e, "acquire connection"))
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.db.begin().await.map_err(|e| Error::from_store(e, "begin transaction"))
    }
}

async fn commit(tx: Transaction<'static, Sqlite>) -> Result<()> {
    tx.commit().await.map_err(|e| Error::from_store(e.into(), "commit transaction"))
}

/// Remove the credential, then the account. Callers have already confirmed the account exists.
async fn delete_pair(conn: &mut DbConn, account_id: AccountId) -> Result<()> {
    Credentials::new(conn)
        .delete(account_id)
        .await
        .map_err(|e| Error::from_store(e, "delete credential"))?;
    Accounts::new(conn)
        .delete(account_id)
        .await
        .map_err(|e| Error::from_store(e, "delete account"))
}

async fn resolve_role_id(conn: &mut DbConn, role: Role) -> Result<RoleId> {
    let row = Roles::new(conn).get_by_name(role.name()).await.map_err(|e| match e {
        DbError::NotFound => Error::InvalidArgument {
            message: format!("Unknown role: {}", role.name()),
        },
        other => Error::from_store(other, "resolve role"),
    })?;
    Ok(row.id)
}

/// Turn account rows into API responses, resolving each distinct role id once.
async fn project(conn: &mut DbConn, accounts: Vec<AccountDBResponse>) -> Result<Vec<AccountResponse>> {
    let mut roles: HashMap<RoleId, Role> = HashMap::new();
    let mut projected = Vec::with_capacity(accounts.len());

    for account in accounts {
        let role = match roles.get(&account.role_id) {
            Some(role) => *role,
            None => {
                let row = Roles::new(conn)
                    .get_by_id(account.role_id)
                    .await
                    .map_err(|e| Error::from_store(e, "resolve role"))?;
                let role = Role::from_name(&row.name).ok_or_else(|| Error::Internal {
                    operation: format!("map stored role {}", row.name),
                })?;
                roles.insert(account.role_id, role);
                role
            }
        };

        projected.push(AccountResponse {
            account_id: account.id,
            account_info: AccountInfo {
                username: account.username,
                fullname: account.fullname,
                email: account.email,
                phone_number: account.phone_number,
                role,
            },
        });
    }

    Ok(projected)
}
