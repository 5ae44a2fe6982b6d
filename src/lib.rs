//! Pistech Admin
//!
//! Client-side state layer for the Pistech administration backend:
//! - Typed REST gateway with date normalization and auth-failure handling
//! - Generic entity caches for notes, projects, charges, payments and partners
//! - Derived per-project and dashboard views computed from cache contents
//! - Session management with durable token storage

pub mod api;
pub mod cache;
pub mod events;
pub mod models;
pub mod session;
pub mod views;

use anyhow::{bail, Result};
use api::ApiClient;
use cache::{DeletePolicy, Stores};
use events::EventBus;
use serde::Deserialize;
use session::{FileSessionStorage, Session, SessionError, SessionStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub api: ApiYamlConfig,
    pub session: SessionYamlConfig,
    pub cache: CacheYamlConfig,
}

/// Backend connection section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiYamlConfig {
    pub base_url: String,
}

impl Default for ApiYamlConfig {
    fn default() -> Self {
        Self {
            base_url: api::client::DEFAULT_BASE_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionYamlConfig {
    /// Session file; `None` means the per-user config directory
    pub storage_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheYamlConfig {
    pub delete_policy: DeletePolicy,
    pub page_size: u32,
}

impl Default for CacheYamlConfig {
    fn default() -> Self {
        Self {
            delete_policy: DeletePolicy::Remove,
            page_size: models::Paging::DEFAULT_LIMIT,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub session_path: PathBuf,
    pub delete_policy: DeletePolicy,
    /// Default page size for paginated listings
    pub page_size: u32,
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let delete_policy = match std::env::var("PISTECH_DELETE_POLICY") {
            Ok(raw) => match raw.parse() {
                Ok(policy) => policy,
                Err(e) => bail!("PISTECH_DELETE_POLICY: {}", e),
            },
            Err(_) => yaml.cache.delete_policy,
        };

        Ok(Self {
            api_base_url: std::env::var("PISTECH_API_URL").unwrap_or(yaml.api.base_url),
            session_path: std::env::var("PISTECH_SESSION_FILE")
                .map(PathBuf::from)
                .ok()
                .or(yaml.session.storage_path)
                .unwrap_or_else(default_session_path),
            delete_policy,
            page_size: std::env::var("PISTECH_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.cache.page_size)
                .max(1),
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

fn default_session_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pistech")
        .join("session.json")
}

// ============================================================================
// Application context
// ============================================================================

/// Everything a front end needs, constructed once and passed around explicitly
pub struct AppContext {
    pub config: Arc<Config>,
    client: Arc<ApiClient>,
    events: Arc<EventBus>,
    session: Arc<Session>,
    stores: Stores,
}

impl AppContext {
    /// Build the context with the session persisted at `config.session_path`
    pub fn new(config: Config) -> Self {
        let storage = Arc::new(FileSessionStorage::new(&config.session_path));
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: Config, storage: Arc<dyn SessionStorage>) -> Self {
        let events = Arc::new(EventBus::default());
        let client = Arc::new(ApiClient::new(config.api_base_url.clone()));
        let session = Arc::new(
            Session::new(client.clone(), storage).with_event_emitter(events.clone()),
        );
        let stores = Stores::new(client.clone(), config.delete_policy, Some(events.clone()));

        Self {
            config: Arc::new(config),
            client,
            events,
            session,
            stores,
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The entity caches, only while a session is authenticated.
    ///
    /// Once the session is gone the caches are emptied, so nothing loaded
    /// under the previous user survives.
    pub fn stores(&self) -> Result<&Stores, SessionError> {
        if self.session.is_authenticated() {
            Ok(&self.stores)
        } else {
            self.stores.clear_all();
            Err(SessionError::NotAuthenticated)
        }
    }

    /// Fill every cache concurrently
    pub async fn load_all(&self) -> Result<(), SessionError> {
        self.stores()?.load_all().await;
        Ok(())
    }

    /// End the session and empty every cache
    pub fn logout(&self) {
        self.session.logout();
        self.stores.clear_all();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
api:
  base_url: https://api.pistech.dev
session:
  storage_path: /tmp/pistech/session.json
cache:
  delete_policy: mark
  page_size: 25
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://api.pistech.dev");
        assert_eq!(
            config.session.storage_path,
            Some(PathBuf::from("/tmp/pistech/session.json"))
        );
        assert_eq!(config.cache.delete_policy, DeletePolicy::MarkInPlace);
        assert_eq!(config.cache.page_size, 25);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert!(config.session.storage_path.is_none());
        assert_eq!(config.cache.delete_policy, DeletePolicy::Remove);
        assert_eq!(config.cache.page_size, 10);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
cache:
  page_size: 50
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.cache.page_size, 50);
        assert_eq!(config.cache.delete_policy, DeletePolicy::Remove);
        assert_eq!(config.api.base_url, "http://localhost:3000");
    }

    /// Combined test for YAML file loading and env var overrides.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "PISTECH_API_URL",
                "PISTECH_SESSION_FILE",
                "PISTECH_DELETE_POLICY",
                "PISTECH_PAGE_SIZE",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
api:
  base_url: http://yaml-host:4000
session:
  storage_path: /tmp/yaml-session.json
cache:
  delete_policy: mark
  page_size: 20
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.api_base_url, "http://yaml-host:4000");
        assert_eq!(config.session_path, PathBuf::from("/tmp/yaml-session.json"));
        assert_eq!(config.delete_policy, DeletePolicy::MarkInPlace);
        assert_eq!(config.page_size, 20);

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("PISTECH_API_URL", "http://env-host:5000");
        std::env::set_var("PISTECH_DELETE_POLICY", "remove");
        std::env::set_var("PISTECH_PAGE_SIZE", "0");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.api_base_url, "http://env-host:5000");
        assert_eq!(config.delete_policy, DeletePolicy::Remove);
        assert_eq!(config.page_size, 1);
        // YAML value still used where no env override
        assert_eq!(config.session_path, PathBuf::from("/tmp/yaml-session.json"));

        // --- Phase 3: Invalid policy is an error ---
        std::env::set_var("PISTECH_DELETE_POLICY", "shred");
        assert!(Config::from_yaml_and_env(Some(&file_path)).is_err());

        clear_env();

        // --- Phase 4: Malformed YAML falls back to defaults ---
        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "api: [unterminated").unwrap();
        let config = Config::from_yaml_and_env(Some(&broken)).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3000");

        // --- Phase 5: No YAML file → defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-pistech-config-12345.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent)).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.delete_policy, DeletePolicy::Remove);
        assert_eq!(config.page_size, 10);
        assert!(config.session_path.ends_with("pistech/session.json"));
    }
}

#[cfg(test)]
mod context_tests {
    use super::*;
    use crate::session::MemorySessionStorage;

    fn context() -> AppContext {
        let config = Config {
            api_base_url: "http://127.0.0.1:9".into(),
            session_path: PathBuf::from("unused.json"),
            delete_policy: DeletePolicy::MarkInPlace,
            page_size: 10,
        };
        AppContext::with_storage(config, Arc::new(MemorySessionStorage::new()))
    }

    #[test]
    fn test_stores_gated_by_session() {
        let ctx = context();
        assert!(matches!(ctx.stores(), Err(SessionError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_load_all_requires_session() {
        let ctx = context();
        assert_eq!(ctx.load_all().await, Err(SessionError::NotAuthenticated));
    }

    #[test]
    fn test_caches_use_configured_policy() {
        let ctx = context();
        assert_eq!(ctx.stores.notes.delete_policy(), DeletePolicy::MarkInPlace);
        assert_eq!(ctx.stores.partners.delete_policy(), DeletePolicy::MarkInPlace);
    }
}
