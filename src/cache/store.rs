//! Generic per-entity cache slot

use super::{DeletePolicy, SlotStatus};
use crate::api::{ApiError, ApiResult, EntityGateway, Page};
use crate::events::{EventEmitter, StoreAction, StoreEvent};
use crate::models::{Entity, ListFilters};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct Slot<E> {
    records: Vec<E>,
    in_flight: usize,
    error: Option<ApiError>,
    has_loaded: bool,
    /// Bumped by `clear()`; calls started under an older value are stale
    generation: u64,
}

impl<E> Default for Slot<E> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            in_flight: 0,
            error: None,
            has_loaded: false,
            generation: 0,
        }
    }
}

/// In-memory mirror of one resource's records.
///
/// The record list only changes through the operations below, and only after
/// the gateway call succeeded. Every gateway call counts as in flight while it
/// runs; `load()` is skipped while anything is in flight or once the slot has
/// loaded. A call still in flight when the slot is cleared leaves no trace
/// in it.
pub struct EntityCache<E: Entity> {
    gateway: Arc<dyn EntityGateway<E>>,
    slot: RwLock<Slot<E>>,
    delete_policy: DeletePolicy,
    id_locks: DashMap<String, Arc<Mutex<()>>>,
    event_emitter: Option<Arc<dyn EventEmitter>>,
}

/// Decrements the in-flight counter on every exit path, unless the slot was
/// cleared in the meantime
struct InFlight<'a, E: Entity> {
    cache: &'a EntityCache<E>,
    generation: u64,
}

impl<E: Entity> Drop for InFlight<'_, E> {
    fn drop(&mut self) {
        let mut slot = self.cache.write();
        if slot.generation == self.generation {
            slot.in_flight = slot.in_flight.saturating_sub(1);
        }
    }
}

/// Exclusive hold on one record id. The map entry goes away with the last
/// holder.
struct IdLock<'a, E: Entity> {
    cache: &'a EntityCache<E>,
    id: String,
    lock: Arc<Mutex<()>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl<E: Entity> Drop for IdLock<'_, E> {
    fn drop(&mut self) {
        drop(self.held.take());
        // One reference in the map, one here: nobody else holds or waits
        self.cache.id_locks.remove_if(&self.id, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
    }
}

impl<E: Entity> EntityCache<E> {
    pub fn new(gateway: Arc<dyn EntityGateway<E>>) -> Self {
        Self {
            gateway,
            slot: RwLock::new(Slot::default()),
            delete_policy: DeletePolicy::default(),
            id_locks: DashMap::new(),
            event_emitter: None,
        }
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn with_event_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.event_emitter = Some(emitter);
        self
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    // ========================================================================
    // Read state
    // ========================================================================

    /// Snapshot of the current record list
    pub fn records(&self) -> Vec<E> {
        self.read().records.clone()
    }

    /// Local lookup by id, no network
    pub fn find(&self, id: &str) -> Option<E> {
        self.read().records.iter().find(|r| r.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.read().in_flight > 0
    }

    pub fn has_loaded(&self) -> bool {
        self.read().has_loaded
    }

    pub fn error(&self) -> Option<ApiError> {
        self.read().error.clone()
    }

    pub fn clear_error(&self) {
        self.write().error = None;
    }

    pub fn status(&self) -> SlotStatus {
        let slot = self.read();
        if slot.in_flight > 0 {
            SlotStatus::Loading
        } else if slot.has_loaded {
            SlotStatus::Loaded
        } else if slot.error.is_some() {
            SlotStatus::Errored
        } else {
            SlotStatus::Empty
        }
    }

    /// Drop every record and forget that the slot ever loaded. Results of
    /// calls still in flight are discarded when they arrive.
    pub fn clear(&self) {
        let mut slot = self.write();
        slot.records.clear();
        slot.has_loaded = false;
        slot.error = None;
        slot.in_flight = 0;
        slot.generation += 1;
    }

    // ========================================================================
    // Loads
    // ========================================================================

    /// Fill the slot once. Skipped while a call is in flight or after a
    /// successful load; failures are recorded in `error()` only.
    pub async fn load(&self) {
        let guard = {
            let mut slot = self.write();
            if slot.in_flight > 0 || slot.has_loaded {
                debug!(entity = %E::KIND, "load skipped");
                return;
            }
            slot.in_flight += 1;
            slot.error = None;
            InFlight {
                cache: self,
                generation: slot.generation,
            }
        };
        let _ = self.fetch_all(&guard, None).await;
    }

    /// Refetch the full list even if the slot already loaded
    pub async fn reload(&self) -> ApiResult<()> {
        self.reload_with(None).await
    }

    /// Refetch the full list with explicit filters (e.g. include deleted)
    pub async fn reload_with(&self, filters: Option<&E::Filters>) -> ApiResult<()> {
        info!(entity = %E::KIND, "Reloading");
        let guard = {
            let mut slot = self.write();
            slot.has_loaded = false;
            slot.in_flight += 1;
            slot.error = None;
            InFlight {
                cache: self,
                generation: slot.generation,
            }
        };
        self.fetch_all(&guard, filters).await
    }

    async fn fetch_all(
        &self,
        guard: &InFlight<'_, E>,
        filters: Option<&E::Filters>,
    ) -> ApiResult<()> {
        match self.gateway.list(filters).await {
            Ok(records) => {
                let count = records.len();
                let stored = self.commit(guard, |slot| {
                    slot.records = records;
                    slot.has_loaded = true;
                });
                if stored.is_some() {
                    debug!(entity = %E::KIND, count, "loaded");
                    self.emit(StoreEvent::new(E::KIND, StoreAction::Loaded).with_count(count));
                }
                Ok(())
            }
            Err(e) => Err(self.record_failure(guard, "load", e)),
        }
    }

    /// Run a paginated query and make its page the slot's current list
    pub async fn load_paginated(&self, filters: &E::Filters) -> ApiResult<Page<E>> {
        let guard = self.begin();
        let response = self
            .gateway
            .list_paginated(filters)
            .await
            .map_err(|e| self.record_failure(&guard, "load_paginated", e))?;

        let data = response.data.clone();
        let stored = self.commit(&guard, |slot| {
            slot.records = data;
            slot.has_loaded = true;
        });
        if stored.is_some() {
            self.emit(
                StoreEvent::new(E::KIND, StoreAction::Loaded).with_count(response.data.len()),
            );
        }
        Ok(Page {
            records: response.data,
            total: response.total,
        })
    }

    /// Fetch a single record without touching the list
    pub async fn get(&self, id: &str) -> ApiResult<E> {
        let guard = self.begin();
        self.gateway
            .get(id)
            .await
            .map_err(|e| self.record_failure(&guard, "get", e))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create(&self, draft: &E::Draft) -> ApiResult<E> {
        let guard = self.begin();
        let created = self
            .gateway
            .create(draft)
            .await
            .map_err(|e| self.record_failure(&guard, "create", e))?;

        self.commit(&guard, |slot| slot.records.push(created.clone()));
        self.emit(StoreEvent::new(E::KIND, StoreAction::Created).with_id(created.id()));
        Ok(created)
    }

    /// Replace the record with the same id. A record missing from the list
    /// stays missing; the caller still gets the server's version.
    pub async fn update(&self, id: &str, patch: &E::Patch) -> ApiResult<E> {
        let _serial = self.lock_id(id).await;
        let guard = self.begin();
        let updated = self
            .gateway
            .update(id, patch)
            .await
            .map_err(|e| self.record_failure(&guard, "update", e))?;

        self.replace(&guard, id, &updated);
        self.emit(StoreEvent::new(E::KIND, StoreAction::Updated).with_id(id));
        Ok(updated)
    }

    /// Soft delete. Locally the record is removed or stamped depending on the
    /// configured [`DeletePolicy`].
    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        let _serial = self.lock_id(id).await;
        let guard = self.begin();
        self.gateway
            .delete(id)
            .await
            .map_err(|e| self.record_failure(&guard, "delete", e))?;

        self.commit(&guard, |slot| match self.delete_policy {
            DeletePolicy::Remove => slot.records.retain(|r| r.id() != id),
            DeletePolicy::MarkInPlace => {
                let now = Utc::now();
                if let Some(record) = slot.records.iter_mut().find(|r| r.id() == id) {
                    record.mark_deleted(now);
                }
            }
        });
        self.emit(StoreEvent::new(E::KIND, StoreAction::Deleted).with_id(id));
        Ok(())
    }

    /// Permanent removal
    pub async fn hard_delete(&self, id: &str) -> ApiResult<()> {
        let _serial = self.lock_id(id).await;
        let guard = self.begin();
        self.gateway
            .hard_delete(id)
            .await
            .map_err(|e| self.record_failure(&guard, "hard_delete", e))?;

        self.commit(&guard, |slot| slot.records.retain(|r| r.id() != id));
        self.emit(StoreEvent::new(E::KIND, StoreAction::Purged).with_id(id));
        Ok(())
    }

    pub async fn restore(&self, id: &str) -> ApiResult<E> {
        let _serial = self.lock_id(id).await;
        let guard = self.begin();
        let restored = self
            .gateway
            .restore(id)
            .await
            .map_err(|e| self.record_failure(&guard, "restore", e))?;

        self.replace(&guard, id, &restored);
        self.emit(StoreEvent::new(E::KIND, StoreAction::Restored).with_id(id));
        Ok(restored)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn read(&self) -> RwLockReadGuard<'_, Slot<E>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slot<E>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> InFlight<'_, E> {
        let mut slot = self.write();
        slot.in_flight += 1;
        slot.error = None;
        InFlight {
            cache: self,
            generation: slot.generation,
        }
    }

    /// Apply a result to the slot, unless it was cleared since `guard` began
    fn commit<R>(
        &self,
        guard: &InFlight<'_, E>,
        apply: impl FnOnce(&mut Slot<E>) -> R,
    ) -> Option<R> {
        let mut slot = self.write();
        if slot.generation != guard.generation {
            debug!(entity = %E::KIND, "slot cleared while in flight, result dropped");
            return None;
        }
        Some(apply(&mut slot))
    }

    fn record_failure(
        &self,
        guard: &InFlight<'_, E>,
        op: &'static str,
        err: ApiError,
    ) -> ApiError {
        warn!(entity = %E::KIND, op, error = %err, "operation failed");
        self.commit(guard, |slot| slot.error = Some(err.clone()));
        err
    }

    fn replace(&self, guard: &InFlight<'_, E>, id: &str, record: &E) {
        self.commit(guard, |slot| {
            if let Some(existing) = slot.records.iter_mut().find(|r| r.id() == id) {
                *existing = record.clone();
            }
        });
    }

    async fn lock_id(&self, id: &str) -> IdLock<'_, E> {
        let lock = self.id_locks.entry(id.to_string()).or_default().clone();
        let held = lock.clone().lock_owned().await;
        IdLock {
            cache: self,
            id: id.to_string(),
            lock,
            held: Some(held),
        }
    }

    fn emit(&self, event: StoreEvent) {
        if let Some(emitter) = &self.event_emitter {
            emitter.emit(event);
        }
    }
}
