//! Session state machine over the API client's token

use super::storage::{SessionSnapshot, SessionStorage};
use super::SessionError;
use crate::api::{ApiClient, ApiError};
use crate::events::{EventEmitter, StoreAction, StoreEvent};
use crate::models::{AuthResponse, Credentials, EntityKind, User};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    token: Option<String>,
    authenticated: bool,
    loading: bool,
    error: Option<String>,
}

impl SessionState {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.authenticated,
        }
    }

    fn reset(&mut self) {
        self.user = None;
        self.token = None;
        self.authenticated = false;
        self.loading = false;
    }
}

/// The current user's authentication state.
///
/// The `ApiClient` holds the live token. When any request gets a 401/403 the
/// client drops it, and the session notices on its next read (or
/// [`sync`](Session::sync)) and falls back to [`SessionStatus::Anonymous`].
/// The session is the only publisher of `SessionStarted`/`SessionEnded`.
pub struct Session {
    client: Arc<ApiClient>,
    storage: Arc<dyn SessionStorage>,
    state: RwLock<SessionState>,
    event_emitter: Option<Arc<dyn EventEmitter>>,
}

impl Session {
    pub fn new(client: Arc<ApiClient>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            client,
            storage,
            state: RwLock::new(SessionState::default()),
            event_emitter: None,
        }
    }

    pub fn with_event_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.event_emitter = Some(emitter);
        self
    }

    // ========================================================================
    // Read state
    // ========================================================================

    pub fn status(&self) -> SessionStatus {
        if self.is_authenticated() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.sync();
        self.read().authenticated
    }

    pub fn user(&self) -> Option<User> {
        self.sync();
        self.read().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.sync();
        self.read().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn clear_error(&self) {
        self.write().error = None;
    }

    /// Replace the cached user profile (token untouched)
    pub fn set_user(&self, user: User) {
        let snapshot = {
            let mut state = self.write();
            state.user = Some(user);
            state.snapshot()
        };
        self.persist(&snapshot);
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.begin();
        let result = self.client.login(&credentials).await;
        self.finish_authentication("login", result)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.begin();
        let result = self.client.register(&credentials).await;
        self.finish_authentication("register", result)
    }

    /// Confirm the held token with the backend. Never fails: any error is
    /// treated as an invalid token and ends the session.
    pub async fn validate_token(&self) -> bool {
        let held = self.read().token.clone();
        let Some(token) = held else {
            self.write().authenticated = false;
            return false;
        };

        self.client.set_token(Some(token.clone()));
        self.write().loading = true;
        let result = self.client.validate_token(&token).await;

        match result {
            Ok(true) => {
                let snapshot = {
                    let mut state = self.write();
                    state.authenticated = true;
                    state.loading = false;
                    state.snapshot()
                };
                self.persist(&snapshot);
                debug!("Stored token is valid");
                true
            }
            Ok(false) => {
                info!("Stored token rejected by the backend");
                self.end("token invalid");
                false
            }
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                self.end("token validation failed");
                false
            }
        }
    }

    /// Drop the session locally. No network call is made.
    pub fn logout(&self) {
        self.client.clear_token();
        self.end("logout");
        self.write().error = None;
    }

    /// Rehydrate from storage; the token still needs [`validate_token`](Self::validate_token)
    pub fn restore(&self) -> Result<bool, SessionError> {
        let Some(snapshot) = self.storage.load()? else {
            return Ok(false);
        };
        let Some(token) = snapshot.token.filter(|t| !t.is_empty()) else {
            return Ok(false);
        };

        self.client.set_token(Some(token.clone()));
        let mut state = self.write();
        state.user = snapshot.user;
        state.token = Some(token);
        state.authenticated = snapshot.is_authenticated;
        debug!(authenticated = state.authenticated, "Session restored from storage");
        Ok(true)
    }

    /// Pick up a token the client dropped after a 401/403, ending the
    /// session and clearing its stored snapshot. Reads do this implicitly.
    pub fn sync(&self) {
        let lost = {
            let state = self.read();
            state.authenticated && !self.client.has_token()
        };
        if lost {
            warn!("Token dropped by the gateway, ending session");
            self.end("token rejected");
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn begin(&self) {
        let mut state = self.write();
        state.loading = true;
        state.error = None;
    }

    fn finish_authentication(
        &self,
        op: &'static str,
        result: Result<AuthResponse, ApiError>,
    ) -> Result<(), SessionError> {
        match result {
            Ok(response) => {
                let snapshot = {
                    let mut state = self.write();
                    state.user = response.user;
                    state.token = response.access_token;
                    state.authenticated = true;
                    state.loading = false;
                    state.error = None;
                    state.snapshot()
                };
                self.persist(&snapshot);
                info!(op, email = ?snapshot.user.as_ref().map(|u| &u.email), "Session started");
                self.emit(StoreAction::SessionStarted);
                Ok(())
            }
            Err(e) => {
                warn!(op, error = %e, "Authentication failed");
                self.end("authentication failed");
                self.write().error = Some(e.to_string());
                Err(SessionError::Api(e))
            }
        }
    }

    fn end(&self, reason: &'static str) {
        let was_authenticated = {
            let mut state = self.write();
            let was = state.authenticated || state.token.is_some();
            state.reset();
            was
        };
        self.client.clear_token();
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        if was_authenticated {
            info!(reason, "Session ended");
            self.emit(StoreAction::SessionEnded);
        }
    }

    fn persist(&self, snapshot: &SessionSnapshot) {
        if let Err(e) = self.storage.save(snapshot) {
            warn!(error = %e, "Failed to persist session");
        }
    }

    fn emit(&self, action: StoreAction) {
        if let Some(emitter) = &self.event_emitter {
            emitter.emit(StoreEvent::new(EntityKind::User, action));
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
