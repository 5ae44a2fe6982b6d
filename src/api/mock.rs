//! In-memory mock implementation of EntityGateway for testing without a backend.

use super::error::{ApiError, ApiResult};
use super::query::PaginatedResponse;
use super::traits::EntityGateway;
use crate::models::{
    ClientCharge, ClientChargeDraft, ClientChargePatch, Entity, ListFilters, Note, NoteDraft,
    NotePatch, Project, ProjectDraft, ProjectPatch,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{RwLock, Semaphore};
use uuid::Uuid;

/// Records the mock knows how to build from drafts and patch in place.
pub trait MockRecord: Entity {
    fn from_draft(id: String, draft: &Self::Draft, now: DateTime<Utc>) -> Self;
    fn apply_patch(&mut self, patch: &Self::Patch, now: DateTime<Utc>);
    fn clear_deleted(&mut self);
}

/// Per-operation call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    pub list: AtomicUsize,
    pub list_paginated: AtomicUsize,
    pub get: AtomicUsize,
    pub create: AtomicUsize,
    pub update: AtomicUsize,
    pub delete: AtomicUsize,
    pub restore: AtomicUsize,
    pub hard_delete: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// In-memory backend for a single resource.
///
/// Soft deletes stamp `deleted_at` exactly like the server; deleted records
/// are hidden from lists unless `includeDeleted` is requested. Calls can be
/// held on a gate to simulate a slow network, and the next call can be made
/// to fail.
pub struct MockGateway<E: MockRecord> {
    records: RwLock<Vec<E>>,
    pub calls: CallCounts,
    gate: Mutex<Option<Arc<Semaphore>>>,
    fail_next: Mutex<Option<ApiError>>,
}

impl<E: MockRecord> MockGateway<E> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<E>) -> Self {
        Self {
            records: RwLock::new(records),
            calls: CallCounts::default(),
            gate: Mutex::new(None),
            fail_next: Mutex::new(None),
        }
    }

    /// Block every subsequent call until [`release`](Self::release) is called
    pub fn hold(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held calls through
    pub fn release(&self, n: usize) {
        if let Some(gate) = self.gate.lock().unwrap().as_ref() {
            gate.add_permits(n);
        }
    }

    /// Make the next call fail with `err`
    pub fn fail_next(&self, err: ApiError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Server-side view of the records, deleted ones included
    pub async fn stored(&self) -> Vec<E> {
        self.records.read().await.clone()
    }

    async fn enter(&self, counter: &AtomicUsize) -> ApiResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(id: &str) -> ApiError {
        ApiError::Rejected {
            status: 404,
            message: Some(format!("{} {} not found", E::KIND, id)),
        }
    }
}

#[async_trait]
impl<E: MockRecord> EntityGateway<E> for MockGateway<E> {
    async fn list(&self, filters: Option<&E::Filters>) -> ApiResult<Vec<E>> {
        self.enter(&self.calls.list).await?;
        let include_deleted = filters
            .and_then(|f| f.paging().include_deleted)
            .unwrap_or(false);
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| include_deleted || !r.is_deleted())
            .cloned()
            .collect())
    }

    async fn list_paginated(&self, filters: &E::Filters) -> ApiResult<PaginatedResponse<E>> {
        self.enter(&self.calls.list_paginated).await?;
        let paging = filters.paging();
        let include_deleted = paging.include_deleted.unwrap_or(false);
        let page = paging.page_or_default();
        let limit = paging.limit_or_default();

        let records = self.records.read().await;
        let visible: Vec<&E> = records
            .iter()
            .filter(|r| include_deleted || !r.is_deleted())
            .collect();
        let data = visible
            .iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .map(|r| (*r).clone())
            .collect();
        Ok(PaginatedResponse::new(data, visible.len() as u64, page, limit))
    }

    async fn get(&self, id: &str) -> ApiResult<E> {
        self.enter(&self.calls.get).await?;
        let records = self.records.read().await;
        records
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, draft: &E::Draft) -> ApiResult<E> {
        self.enter(&self.calls.create).await?;
        let record = E::from_draft(Uuid::new_v4().to_string(), draft, Utc::now());
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, patch: &E::Patch) -> ApiResult<E> {
        self.enter(&self.calls.update).await?;
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        record.apply_patch(patch, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.enter(&self.calls.delete).await?;
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        record.mark_deleted(Utc::now());
        Ok(())
    }

    async fn restore(&self, id: &str) -> ApiResult<E> {
        self.enter(&self.calls.restore).await?;
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        record.clear_deleted();
        Ok(record.clone())
    }

    async fn hard_delete(&self, id: &str) -> ApiResult<()> {
        self.enter(&self.calls.hard_delete).await?;
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockRecord implementations
// ---------------------------------------------------------------------------

impl MockRecord for Note {
    fn from_draft(id: String, draft: &NoteDraft, now: DateTime<Utc>) -> Self {
        Note {
            id,
            title: draft.title.clone(),
            content: draft.content.clone(),
            tags: draft.tags.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn apply_patch(&mut self, patch: &NotePatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = Some(tags.clone());
        }
        self.updated_at = now;
    }

    fn clear_deleted(&mut self) {
        self.deleted_at = None;
    }
}

impl MockRecord for Project {
    fn from_draft(id: String, draft: &ProjectDraft, now: DateTime<Utc>) -> Self {
        Project {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            status: draft.status,
            amount: draft.amount,
            currency: draft.currency,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn apply_patch(&mut self, patch: &ProjectPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        self.updated_at = now;
    }

    fn clear_deleted(&mut self) {
        self.deleted_at = None;
    }
}

impl MockRecord for ClientCharge {
    fn from_draft(id: String, draft: &ClientChargeDraft, now: DateTime<Utc>) -> Self {
        ClientCharge {
            id,
            project_id: draft.project_id.clone(),
            amount: draft.amount,
            currency: draft.currency,
            date: draft.date,
            payment_method: draft.payment_method,
            description: draft.description.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn apply_patch(&mut self, patch: &ClientChargePatch, now: DateTime<Utc>) {
        if let Some(project_id) = &patch.project_id {
            self.project_id = project_id.clone();
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(method) = patch.payment_method {
            self.payment_method = method;
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        self.updated_at = now;
    }

    fn clear_deleted(&mut self) {
        self.deleted_at = None;
    }
}
