//! Trait abstraction over the per-resource REST operations

use super::error::ApiResult;
use super::query::PaginatedResponse;
use crate::models::Entity;
use async_trait::async_trait;

/// The operation set an entity cache needs from the backend.
///
/// `ApiClient` implements it for every [`Entity`]; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait EntityGateway<E: Entity>: Send + Sync {
    /// `GET /<resource>`; `None` sends no filters at all
    async fn list(&self, filters: Option<&E::Filters>) -> ApiResult<Vec<E>>;

    /// `GET /<resource>/paginated`
    async fn list_paginated(&self, filters: &E::Filters) -> ApiResult<PaginatedResponse<E>>;

    /// `GET /<resource>/:id`
    async fn get(&self, id: &str) -> ApiResult<E>;

    /// `POST /<resource>`
    async fn create(&self, draft: &E::Draft) -> ApiResult<E>;

    /// `PATCH /<resource>/:id`
    async fn update(&self, id: &str, patch: &E::Patch) -> ApiResult<E>;

    /// `DELETE /<resource>/:id` (soft delete, the server stamps `deletedAt`)
    async fn delete(&self, id: &str) -> ApiResult<()>;

    /// `PATCH /<resource>/:id/restore`
    async fn restore(&self, id: &str) -> ApiResult<E>;

    /// `DELETE /<resource>/:id/hard` (irreversible)
    async fn hard_delete(&self, id: &str) -> ApiResult<()>;
}
