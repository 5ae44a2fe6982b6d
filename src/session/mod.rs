//! Session gateway: who is logged in, and the token every request carries

mod manager;
mod storage;

pub use manager::{Session, SessionStatus};
pub use storage::{
    FileSessionStorage, MemorySessionStorage, SessionSnapshot, SessionStorage, STORAGE_KEY,
};

use crate::api::ApiError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    /// Cache access attempted without an authenticated session
    #[error("Not authenticated. Please login first.")]
    NotAuthenticated,

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}
