//! HTTP client for the Pistech backend
//!
//! Single point of network access: attaches the bearer token, serializes
//! bodies, normalizes timestamps in responses and maps failures to
//! [`ApiError`]. No retries and no timeouts are applied here.

use super::dates::normalize_dates;
use super::error::{extract_server_message, ApiError, ApiResult};
use super::query::{PaginatedResponse, QueryParams};
use super::traits::EntityGateway;
use crate::models::{
    AuthResponse, ClientCharge, Credentials, Entity, EntityKind, LogEntry, LogFilters,
    PartnerPayment, ServerProjectSummary,
};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::RwLock;
use tracing::{debug, warn};

/// Default backend URL when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

const NO_BODY: Option<&()> = None;

/// Client for the backend REST API
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a client for the given base URL (trailing slashes are ignored)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Create a client reusing an existing `reqwest::Client`
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http,
            token: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Token handling
    // ========================================================================

    /// Replace the bearer token attached to every request
    pub fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token.filter(|t| !t.is_empty());
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Drop the held token (local logout, no network call)
    pub fn clear_token(&self) {
        self.set_token(None);
    }

    // ========================================================================
    // Request pipeline
    // ========================================================================

    /// Perform a request and return the normalized JSON body, if any.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Option<&QueryParams>,
        body: Option<&B>,
    ) -> ApiResult<Option<Value>> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);

        if let Some(params) = query.filter(|q| !q.is_empty()) {
            request = request.query(params.pairs());
        }
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, path, "Sending request");

        let response = request.send().await.map_err(|e| {
            warn!(method = %method, path, error = %e, "Request did not complete");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        debug!(method = %method, path, status = status.as_u16(), "Response received");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(path, status = status.as_u16(), "Authentication rejected, dropping token");
            self.clear_token();
            return Err(ApiError::AuthenticationFailed);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message: extract_server_message(&text),
            });
        }

        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(None);
        }

        let mut value: Value = serde_json::from_str(&text)?;
        normalize_dates(&mut value);
        Ok(Some(value))
    }

    /// Perform a request whose body must decode into `T`
    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&QueryParams>,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self
            .execute(method, path, query, body)
            .await?
            .ok_or(ApiError::EmptyResponse)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Perform a request and discard whatever body comes back
    async fn request_unit(&self, method: Method, path: &str) -> ApiResult<()> {
        self.execute(method, path, None, NO_BODY).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&QueryParams>,
    ) -> ApiResult<T> {
        self.request(Method::GET, path, query, NO_BODY).await
    }

    // ========================================================================
    // Auth
    // ========================================================================

    /// `POST /auth/login`; on success the returned token is held
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        self.authenticate("/auth/login", credentials).await
    }

    /// `POST /auth/register`; behaves like [`login`](Self::login)
    pub async fn register(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
        self.authenticate("/auth/register", credentials).await
    }

    async fn authenticate(&self, path: &str, credentials: &Credentials) -> ApiResult<AuthResponse> {
        let response: AuthResponse = self
            .request(Method::POST, path, None, Some(credentials))
            .await?;
        match &response.access_token {
            Some(token) if !token.is_empty() => {
                self.set_token(Some(token.clone()));
                Ok(response)
            }
            _ => Err(ApiError::Decode("response carried no access_token".into())),
        }
    }

    /// `POST /auth/validate-token`; true when the backend echoes a token
    pub async fn validate_token(&self, token: &str) -> ApiResult<bool> {
        let body = serde_json::json!({ "token": token });
        let response = self
            .execute(Method::POST, "/auth/validate-token", None, Some(&body))
            .await?;
        let Some(value) = response else {
            return Ok(false);
        };
        let parsed: AuthResponse = serde_json::from_value(value)?;
        Ok(parsed.access_token.is_some())
    }

    // ========================================================================
    // Per-project queries
    // ========================================================================

    /// `GET /projects/:id/with-charges` (aggregate computed server-side)
    pub async fn project_with_charges(&self, project_id: &str) -> ApiResult<ServerProjectSummary> {
        let path = format!("{}/with-charges", record_path(EntityKind::Project, project_id));
        self.get_json(&path, None).await
    }

    /// `GET /client-charges/project/:id`
    pub async fn charges_by_project(&self, project_id: &str) -> ApiResult<Vec<ClientCharge>> {
        let path = format!(
            "{}/project/{}",
            EntityKind::ClientCharge.resource_path(),
            urlencoding::encode(project_id)
        );
        self.get_json(&path, None).await
    }

    /// `GET /partner-payments/project/:id`
    pub async fn payments_by_project(&self, project_id: &str) -> ApiResult<Vec<PartnerPayment>> {
        let path = format!(
            "{}/project/{}",
            EntityKind::PartnerPayment.resource_path(),
            urlencoding::encode(project_id)
        );
        self.get_json(&path, None).await
    }

    // ========================================================================
    // Audit log
    // ========================================================================

    /// `GET /logs`
    pub async fn list_logs(&self, filters: &LogFilters) -> ApiResult<Vec<LogEntry>> {
        self.get_json("/logs", Some(&filters.to_params())).await
    }

    /// `GET /logs/:id`
    pub async fn get_log(&self, id: &str) -> ApiResult<LogEntry> {
        self.get_json(&format!("/logs/{}", urlencoding::encode(id)), None)
            .await
    }

    /// `GET /logs/entity/:id`
    pub async fn logs_by_entity(&self, entity_id: &str) -> ApiResult<Vec<LogEntry>> {
        self.get_json(&format!("/logs/entity/{}", urlencoding::encode(entity_id)), None)
            .await
    }

    /// `GET /logs/user/:id`
    pub async fn logs_by_user(&self, user_id: &str) -> ApiResult<Vec<LogEntry>> {
        self.get_json(&format!("/logs/user/{}", urlencoding::encode(user_id)), None)
            .await
    }

    /// `GET /logs/type/:entityType`
    pub async fn logs_by_type(&self, kind: EntityKind) -> ApiResult<Vec<LogEntry>> {
        self.get_json(&format!("/logs/type/{}", kind), None).await
    }
}

/// `/<resource>/<id>` with the id percent-encoded
fn record_path(kind: EntityKind, id: &str) -> String {
    format!("{}/{}", kind.resource_path(), urlencoding::encode(id))
}

#[async_trait]
impl<E: Entity> EntityGateway<E> for ApiClient {
    async fn list(&self, filters: Option<&E::Filters>) -> ApiResult<Vec<E>> {
        let params = filters.map(|f| QueryParams::for_list(f));
        self.get_json(E::KIND.resource_path(), params.as_ref()).await
    }

    async fn list_paginated(&self, filters: &E::Filters) -> ApiResult<PaginatedResponse<E>> {
        let path = format!("{}/paginated", E::KIND.resource_path());
        let params = QueryParams::for_page(filters);
        self.get_json(&path, Some(&params)).await
    }

    async fn get(&self, id: &str) -> ApiResult<E> {
        self.get_json(&record_path(E::KIND, id), None).await
    }

    async fn create(&self, draft: &E::Draft) -> ApiResult<E> {
        self.request(Method::POST, E::KIND.resource_path(), None, Some(draft))
            .await
    }

    async fn update(&self, id: &str, patch: &E::Patch) -> ApiResult<E> {
        self.request(Method::PATCH, &record_path(E::KIND, id), None, Some(patch))
            .await
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.request_unit(Method::DELETE, &record_path(E::KIND, id))
            .await
    }

    async fn restore(&self, id: &str) -> ApiResult<E> {
        let path = format!("{}/restore", record_path(E::KIND, id));
        self.request(Method::PATCH, &path, None, NO_BODY).await
    }

    async fn hard_delete(&self, id: &str) -> ApiResult<()> {
        let path = format!("{}/hard", record_path(E::KIND, id));
        self.request_unit(Method::DELETE, &path).await
    }
}
