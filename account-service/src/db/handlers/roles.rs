//! Read-only repository for role reference data.

use crate::db::{
    errors::{DbError, Result},
    executor::DbConn,
    models::roles::RoleDBResponse,
};
use crate::types::RoleId;
use tracing::instrument;

pub struct Roles<'c> {
    db: &'c mut DbConn,
}

impl<'c> Roles<'c> {
    pub fn new(db: &'c mut DbConn) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: RoleId) -> Result<RoleDBResponse> {
        sqlx::query_as::<_, RoleDBResponse>("SELECT id, name FROM account_role WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<RoleDBResponse> {
        sqlx::query_as::<_, RoleDBResponse>("SELECT id, name FROM account_role WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)
    }
}
