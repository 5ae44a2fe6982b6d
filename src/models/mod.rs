//! Domain records mirrored from the backend
//!
//! Every record type implements [`Entity`], which is what lets a single
//! generic cache and a single generic gateway serve all five resources.

mod audit;
mod finance;
mod note;
mod partner;
mod project;
mod user;

pub use audit::*;
pub use finance::*;
pub use note::*;
pub use partner::*;
pub use project::*;
pub use user::*;

use crate::api::query::QueryParams;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Entity kinds
// ============================================================================

/// Kind of record known to the backend (also the audit-log `entityType`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Note,
    Project,
    ClientCharge,
    PartnerPayment,
    Partner,
    User,
}

impl EntityKind {
    /// REST collection path, e.g. `/client-charges`
    pub fn resource_path(&self) -> &'static str {
        match self {
            Self::Note => "/notes",
            Self::Project => "/projects",
            Self::ClientCharge => "/client-charges",
            Self::PartnerPayment => "/partner-payments",
            Self::Partner => "/partners",
            Self::User => "/users",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note => write!(f, "Note"),
            Self::Project => write!(f, "Project"),
            Self::ClientCharge => write!(f, "ClientCharge"),
            Self::PartnerPayment => write!(f, "PartnerPayment"),
            Self::Partner => write!(f, "Partner"),
            Self::User => write!(f, "User"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "note" => Ok(Self::Note),
            "project" => Ok(Self::Project),
            "clientcharge" => Ok(Self::ClientCharge),
            "partnerpayment" => Ok(Self::PartnerPayment),
            "partner" => Ok(Self::Partner),
            "user" => Ok(Self::User),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}

// ============================================================================
// Entity trait
// ============================================================================

/// Filters accepted by a resource's list endpoints.
pub trait ListFilters: Default + Clone + Send + Sync + 'static {
    /// Page number, page size and the include-deleted switch
    fn paging(&self) -> &Paging;

    /// Mutable access to the paging block
    fn paging_mut(&mut self) -> &mut Paging;

    /// Append the resource-specific filter values
    fn push_filters(&self, params: &mut QueryParams);
}

/// Shared pagination block embedded in every filter struct
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paging {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub include_deleted: Option<bool>,
}

impl Paging {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    /// Page number to request (never below 1)
    pub fn page_or_default(&self) -> u32 {
        self.page.unwrap_or(Self::DEFAULT_PAGE).max(1)
    }

    /// Page size to request (never below 1)
    pub fn limit_or_default(&self) -> u32 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).max(1)
    }
}

/// A persisted record with identity and lifecycle timestamps.
///
/// `Draft` is the create payload (no id, no timestamps), `Patch` the partial
/// update payload where every field is optional.
pub trait Entity:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    type Draft: Serialize + fmt::Debug + Send + Sync;
    type Patch: Serialize + fmt::Debug + Send + Sync;
    type Filters: ListFilters;

    fn id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Stamp the record as soft-deleted locally
    fn mark_deleted(&mut self, at: DateTime<Utc>);

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Implements the timestamp accessors shared by every record struct.
macro_rules! impl_entity {
    ($ty:ty, $kind:expr, $draft:ty, $patch:ty, $filters:ty) => {
        impl $crate::models::Entity for $ty {
            const KIND: $crate::models::EntityKind = $kind;

            type Draft = $draft;
            type Patch = $patch;
            type Filters = $filters;

            fn id(&self) -> &str {
                &self.id
            }

            fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.updated_at
            }

            fn deleted_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
                self.deleted_at
            }

            fn mark_deleted(&mut self, at: chrono::DateTime<chrono::Utc>) {
                self.deleted_at = Some(at);
            }
        }
    };
}

/// Implements [`ListFilters`] for a struct with a `paging` field and a body
/// that pushes its own values.
macro_rules! impl_list_filters {
    ($ty:ty, |$this:ident, $params:ident| $body:block) => {
        impl $crate::models::ListFilters for $ty {
            fn paging(&self) -> &$crate::models::Paging {
                &self.paging
            }

            fn paging_mut(&mut self) -> &mut $crate::models::Paging {
                &mut self.paging
            }

            fn push_filters(&self, $params: &mut $crate::api::query::QueryParams) {
                let $this = self;
                $body
            }
        }
    };
}

pub(crate) use impl_entity;
pub(crate) use impl_list_filters;

/// Caller-side guard for required text fields
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Caller-side guard for amounts: finite and not negative
pub fn is_valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}
