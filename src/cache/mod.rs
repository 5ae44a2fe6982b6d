//! Entity caches
//!
//! One generic [`EntityCache`] holds the record list and load/error status of
//! a single resource; [`Stores`] bundles the five instances the dashboard
//! works with.

mod store;

pub use store::EntityCache;

use crate::api::EntityGateway;
use crate::events::EventEmitter;
use crate::models::{ClientCharge, Note, Partner, PartnerPayment, Project};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Observable state of a cache slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Empty,
    Loading,
    Loaded,
    Errored,
}

/// Local effect of a successful soft delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Drop the record from the list
    #[default]
    Remove,
    /// Keep the record and stamp `deleted_at`, like the server does
    #[serde(alias = "mark")]
    MarkInPlace,
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove => write!(f, "remove"),
            Self::MarkInPlace => write!(f, "mark"),
        }
    }
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remove" => Ok(Self::Remove),
            "mark" | "mark_in_place" | "mark-in-place" => Ok(Self::MarkInPlace),
            _ => Err(format!("Unknown delete policy: {}", s)),
        }
    }
}

/// The five entity caches, shared behind `Arc`
#[derive(Clone)]
pub struct Stores {
    pub notes: Arc<EntityCache<Note>>,
    pub projects: Arc<EntityCache<Project>>,
    pub charges: Arc<EntityCache<ClientCharge>>,
    pub payments: Arc<EntityCache<PartnerPayment>>,
    pub partners: Arc<EntityCache<Partner>>,
}

impl Stores {
    /// Build every cache over a gateway that serves all five resources
    pub fn new<G>(
        gateway: Arc<G>,
        policy: DeletePolicy,
        emitter: Option<Arc<dyn EventEmitter>>,
    ) -> Self
    where
        G: EntityGateway<Note>
            + EntityGateway<Project>
            + EntityGateway<ClientCharge>
            + EntityGateway<PartnerPayment>
            + EntityGateway<Partner>
            + 'static,
    {
        Self {
            notes: Arc::new(build(gateway.clone(), policy, emitter.clone())),
            projects: Arc::new(build(gateway.clone(), policy, emitter.clone())),
            charges: Arc::new(build(gateway.clone(), policy, emitter.clone())),
            payments: Arc::new(build(gateway.clone(), policy, emitter.clone())),
            partners: Arc::new(build(gateway, policy, emitter)),
        }
    }

    /// Fill every slot concurrently (each load de-duplicates on its own)
    pub async fn load_all(&self) {
        futures::join!(
            self.notes.load(),
            self.projects.load(),
            self.charges.load(),
            self.payments.load(),
            self.partners.load(),
        );
    }

    pub fn clear_all(&self) {
        self.notes.clear();
        self.projects.clear();
        self.charges.clear();
        self.payments.clear();
        self.partners.clear();
    }
}

fn build<E, G>(
    gateway: Arc<G>,
    policy: DeletePolicy,
    emitter: Option<Arc<dyn EventEmitter>>,
) -> EntityCache<E>
where
    E: crate::models::Entity,
    G: EntityGateway<E> + 'static,
{
    let cache = EntityCache::new(gateway as Arc<dyn EntityGateway<E>>).with_delete_policy(policy);
    match emitter {
        Some(emitter) => cache.with_event_emitter(emitter),
        None => cache,
    }
}
