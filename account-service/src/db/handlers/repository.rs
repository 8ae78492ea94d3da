//! Base repository trait for database operations.

/// Contains the Repository trait.
///
/// A repository is a data access layer for one table. It is constructed over a borrowed
/// executor (a pooled connection or a transaction) and provides typed create, read, update and
/// delete operations. Lookups that miss return [`DbError::NotFound`](crate::db::errors::DbError)
/// rather than `None`, and mutations must touch exactly one row.
use crate::db::errors::Result;

/// Base repository trait providing common database operations
///
/// This trait has separate associated types for create requests, update requests, and responses.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest: Sync;

    /// The request type for updating entities
    type UpdateRequest: Sync;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// Create a new entity, returning its identifier
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Id>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Self::Response>;

    /// Update the entity the request identifies
    async fn update(&mut self, request: &Self::UpdateRequest) -> Result<()>;

    /// Delete an entity by ID
    async fn delete(&mut self, id: Self::Id) -> Result<()>;
}
