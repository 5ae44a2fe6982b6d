//! Remote data gateway: typed access to the backend REST API

pub mod client;
pub mod dates;
pub mod error;
pub mod query;
pub mod traits;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use query::{Page, PaginatedResponse, QueryParams};
pub use traits::EntityGateway;

#[cfg(test)]
pub(crate) mod mock;
