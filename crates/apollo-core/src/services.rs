//! Admin service location.
//!
//! This module resolves an [`Env`] to the base URLs of that environment's admin
//! services, either from static configuration or by asking the environment's
//! meta server, and tracks how well that resolution is going.

use crate::config::PortalClientConfig;
use crate::error::{Error, Result};
use crate::types::{Env, ADMIN_SERVICE_APP_NAME};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Path on the meta server that lists live admin service instances.
pub const META_ADMIN_SERVICES_PATH: &str = "services/admin";

/// A service instance as reported by the meta server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    /// Registered application name
    #[serde(default)]
    pub app_name: String,
    /// Instance identifier
    #[serde(default)]
    pub instance_id: String,
    /// Base URL the instance serves on
    pub homepage_url: String,
}

/// Resolution status for monitoring admin service location.
///
/// Tracks the health and performance of location, including cache statistics
/// and the environments that failed.
#[derive(Debug, Clone)]
pub struct LocatorStatus {
    /// When location was last attempted
    pub last_attempt_at: Option<Instant>,

    /// When location last succeeded
    pub last_success_at: Option<Instant>,

    /// Last error message, if any
    pub last_error: Option<String>,

    /// Number of addresses returned by the last successful lookup
    pub located_addresses: usize,

    /// Environments whose last lookup failed
    pub failed_envs: Vec<Env>,

    /// Number of cache hits
    pub cache_hits: u64,

    /// Number of cache misses
    pub cache_misses: u64,
}

impl LocatorStatus {
    /// Create a new status with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_attempt_at: None,
            last_success_at: None,
            last_error: None,
            located_addresses: 0,
            failed_envs: Vec::new(),
            cache_hits: 0,
            cache_misses: 0,
        }
    }

    /// Record a successful lookup.
    #[must_use]
    pub fn with_success(mut self, env: Env, address_count: usize) -> Self {
        let now = Instant::now();
        self.last_attempt_at = Some(now);
        self.last_success_at = Some(now);
        self.located_addresses = address_count;
        self.last_error = None;
        self.failed_envs.retain(|failed| *failed != env);
        self
    }

    /// Record a failed lookup.
    #[must_use]
    pub fn with_error(mut self, env: Env, error: String) -> Self {
        self.last_attempt_at = Some(Instant::now());
        self.last_error = Some(error);
        if !self.failed_envs.contains(&env) {
            self.failed_envs.push(env);
        }
        self
    }

    /// Update cache statistics.
    #[must_use]
    pub const fn with_cache_stats(mut self, hits: u64, misses: u64) -> Self {
        self.cache_hits = hits;
        self.cache_misses = misses;
        self
    }

    /// Calculate cache hit ratio (0.0 to 1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Check if location is healthy (no outstanding failures).
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.last_error.is_none() && self.failed_envs.is_empty() && self.located_addresses > 0
    }

    /// Get time since last successful lookup.
    #[must_use]
    pub fn time_since_last_success(&self) -> Option<Duration> {
        self.last_success_at.map(|t| t.elapsed())
    }
}

impl Default for LocatorStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves an environment to its admin service base URLs.
///
/// Implementations return addresses in preference order; the transport fails
/// over through them in that order.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ServiceLocator: Send + Sync {
    /// Locate admin services for `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is unknown to this locator or
    /// discovery fails with no fallback.
    async fn locate(&self, env: Env) -> Result<Vec<Url>>;

    /// Get the current location status.
    fn get_status(&self) -> LocatorStatus;

    /// Clear any cached addresses.
    fn clear_cache(&self);

    /// Check if an environment currently resolves to at least one address.
    async fn is_available(&self, env: Env) -> bool {
        self.locate(env).await.is_ok_and(|addresses| !addresses.is_empty())
    }
}

/// Locator backed by a fixed address table.
#[derive(Debug, Clone, Default)]
pub struct StaticServiceLocator {
    addresses: BTreeMap<Env, Vec<Url>>,
}

impl StaticServiceLocator {
    /// Create an empty locator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from the static addresses in a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured URL cannot be parsed.
    pub fn from_config(config: &PortalClientConfig) -> Result<Self> {
        let mut addresses = BTreeMap::new();
        for env in config.admin_services.keys() {
            addresses.insert(*env, config.static_addresses(*env)?);
        }
        Ok(Self { addresses })
    }

    /// Add an address for an environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn with_address(mut self, env: Env, url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref())?;
        self.addresses.entry(env).or_default().push(url);
        Ok(self)
    }

    fn addresses_for(&self, env: Env) -> Option<&Vec<Url>> {
        self.addresses.get(&env).filter(|urls| !urls.is_empty())
    }
}

#[async_trait::async_trait]
impl ServiceLocator for StaticServiceLocator {
    async fn locate(&self, env: Env) -> Result<Vec<Url>> {
        self.addresses_for(env).cloned().ok_or_else(|| {
            Error::DiscoveryFailed(format!("No admin service configured for {env}"))
        })
    }

    fn get_status(&self) -> LocatorStatus {
        let located = self.addresses.values().map(Vec::len).sum();
        LocatorStatus {
            located_addresses: located,
            ..LocatorStatus::new()
        }
    }

    fn clear_cache(&self) {}
}

#[derive(Clone)]
struct CachedEntry {
    addresses: Vec<Url>,
    fetched_at: Instant,
}

/// Meta-server-backed implementation of [`ServiceLocator`].
///
/// Addresses are cached per environment for the configured TTL. When a
/// refresh fails, statically configured addresses for the environment are
/// used instead, if there are any.
pub struct MetaServiceLocator {
    http: reqwest::Client,
    meta_servers: BTreeMap<Env, Url>,
    fallback: StaticServiceLocator,
    cache: Arc<RwLock<HashMap<Env, CachedEntry>>>,
    status: Arc<RwLock<LocatorStatus>>,
    ttl: Duration,
}

impl MetaServiceLocator {
    /// Create a locator from configuration, using `http` for meta server calls.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured URL cannot be parsed.
    pub fn from_config(http: reqwest::Client, config: &PortalClientConfig) -> Result<Self> {
        let mut meta_servers = BTreeMap::new();
        for env in config.meta_servers.keys() {
            if let Some(url) = config.meta_server(*env)? {
                meta_servers.insert(*env, url);
            }
        }

        Ok(Self {
            http,
            meta_servers,
            fallback: StaticServiceLocator::from_config(config)?,
            cache: Arc::new(RwLock::new(HashMap::new())),
            status: Arc::new(RwLock::new(LocatorStatus::new())),
            ttl: config.discovery_cache_ttl(),
        })
    }

    fn cached(&self, env: Env) -> Option<Vec<Url>> {
        let cache = self.cache.read().ok()?;
        let entry = cache.get(&env)?;
        if entry.fetched_at.elapsed() <= self.ttl {
            Some(entry.addresses.clone())
        } else {
            None
        }
    }

    async fn fetch(&self, env: Env, meta_server: &Url) -> Result<Vec<Url>> {
        let url = meta_server.join(META_ADMIN_SERVICES_PATH).map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid meta server URL for {env}: {err}"))
        })?;

        debug!(env = %env, url = %url, "Querying meta server for admin services");

        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::ServiceUnavailable(format!(
                "Meta server for {env} returned {status}: {message}"
            )));
        }

        let instances: Vec<ServiceInstance> = response.json().await.map_err(|err| {
            Error::ParseError(format!("Failed to parse meta server response for {env}: {err}"))
        })?;

        let addresses: Vec<Url> = instances
            .iter()
            .filter(|instance| {
                instance.app_name.is_empty()
                    || instance.app_name.eq_ignore_ascii_case(ADMIN_SERVICE_APP_NAME)
            })
            .filter_map(|instance| match Url::parse(&instance.homepage_url) {
                Ok(url) => Some(url),
                Err(err) => {
                    warn!(
                        env = %env,
                        instance = %instance.instance_id,
                        "Skipping admin service with invalid homepage URL: {err}"
                    );
                    None
                }
            })
            .collect();

        if addresses.is_empty() {
            return Err(Error::DiscoveryFailed(format!(
                "Meta server reported no admin services for {env}"
            )));
        }

        Ok(addresses)
    }

    async fn refresh(&self, env: Env) -> Result<Vec<Url>> {
        let result = match self.meta_servers.get(&env) {
            Some(meta_server) => self.fetch(env, meta_server).await,
            None => Err(Error::DiscoveryFailed(format!(
                "No meta server configured for {env}"
            ))),
        };

        match result {
            Ok(addresses) => {
                self.record_success(env, addresses.len());
                if let Ok(mut cache) = self.cache.write() {
                    cache.insert(
                        env,
                        CachedEntry {
                            addresses: addresses.clone(),
                            fetched_at: Instant::now(),
                        },
                    );
                }
                Ok(addresses)
            }
            Err(err) => {
                self.record_error(env, &err);
                if let Ok(addresses) = self.fallback.locate(env).await {
                    info!(env = %env, "Using static admin service addresses");
                    return Ok(addresses);
                }
                Err(err)
            }
        }
    }

    fn record_success(&self, env: Env, count: usize) {
        if let Ok(mut status) = self.status.write() {
            *status = status.clone().with_success(env, count);
            status.cache_misses += 1;
        }
    }

    fn record_error(&self, env: Env, error: &Error) {
        if let Ok(mut status) = self.status.write() {
            *status = status.clone().with_error(env, error.to_string());
            status.cache_misses += 1;
        }
    }

    fn record_hit(&self) {
        if let Ok(mut status) = self.status.write() {
            status.cache_hits += 1;
        }
    }
}

#[async_trait::async_trait]
impl ServiceLocator for MetaServiceLocator {
    async fn locate(&self, env: Env) -> Result<Vec<Url>> {
        if !self.meta_servers.contains_key(&env) {
            return self.fallback.locate(env).await;
        }

        if let Some(addresses) = self.cached(env) {
            debug!(env = %env, "Admin service addresses served from cache");
            self.record_hit();
            return Ok(addresses);
        }

        self.refresh(env).await
    }

    fn get_status(&self) -> LocatorStatus {
        self.status
            .read()
            .map(|status| status.clone())
            .unwrap_or_else(|_| LocatorStatus::new())
    }

    fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
        if let Ok(mut status) = self.status.write() {
            status.cache_hits = 0;
            status.cache_misses = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_locator_status_new() {
        let status = LocatorStatus::new();
        assert!(status.last_attempt_at.is_none());
        assert!(status.last_error.is_none());
        assert_eq!(status.located_addresses, 0);
        assert!(status.failed_envs.is_empty());
        assert!(!status.is_healthy());
    }

    #[test]
    fn test_locator_status_success_clears_failure() {
        let status = LocatorStatus::new()
            .with_error(Env::Dev, "boom".to_string())
            .with_success(Env::Dev, 2);
        assert!(status.failed_envs.is_empty());
        assert!(status.last_error.is_none());
        assert!(status.is_healthy());
        assert!(status.time_since_last_success().is_some());
    }

    #[test]
    fn test_locator_status_error_deduplicates_env() {
        let status = LocatorStatus::new()
            .with_error(Env::Uat, "first".to_string())
            .with_error(Env::Uat, "second".to_string());
        assert_eq!(status.failed_envs, vec![Env::Uat]);
        assert_eq!(status.last_error.as_deref(), Some("second"));
    }

    #[test]
    fn test_locator_status_cache_hit_ratio() {
        let status = LocatorStatus::new().with_cache_stats(3, 1);
        assert!((status.cache_hit_ratio() - 0.75).abs() < f64::EPSILON);
        assert!(LocatorStatus::new().cache_hit_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn test_static_locator_resolves_configured_env() {
        let locator = StaticServiceLocator::new()
            .with_address(Env::Dev, "http://admin-dev:8090")
            .unwrap();

        let addresses = tokio_test::block_on(locator.locate(Env::Dev)).unwrap();
        assert_eq!(addresses[0].host_str(), Some("admin-dev"));

        let err = tokio_test::block_on(locator.locate(Env::Pro)).unwrap_err();
        assert!(matches!(err, Error::DiscoveryFailed(_)));
    }

    #[tokio::test]
    async fn test_static_locator_from_config() {
        let config = PortalClientConfig::new()
            .with_admin_service(Env::Fat, "http://admin-fat-1:8090")
            .unwrap()
            .with_admin_service(Env::Fat, "http://admin-fat-2:8090")
            .unwrap();

        let locator = StaticServiceLocator::from_config(&config).unwrap();
        assert_eq!(locator.locate(Env::Fat).await.unwrap().len(), 2);
        assert!(locator.is_available(Env::Fat).await);
        assert!(!locator.is_available(Env::Uat).await);
        assert_eq!(locator.get_status().located_addresses, 2);
    }

    #[tokio::test]
    async fn test_mock_locator() {
        let mut mock = MockServiceLocator::new();
        mock.expect_locate()
            .with(mockall::predicate::eq(Env::Uat))
            .times(1)
            .returning(|_| Ok(vec![Url::parse("http://admin-uat:8090").unwrap()]));

        let addresses = mock.locate(Env::Uat).await.unwrap();
        assert_eq!(addresses.len(), 1);
    }

    fn meta_config(server: &MockServer) -> PortalClientConfig {
        PortalClientConfig::new()
            .with_meta_server(Env::Dev, server.uri())
            .unwrap()
    }

    #[tokio::test]
    async fn test_meta_locator_discovers_and_caches() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "appName": "APOLLO-ADMINSERVICE",
                    "instanceId": "admin-1:apollo-adminservice:8090",
                    "homepageUrl": "http://10.0.0.1:8090/"
                },
                {
                    "appName": "APOLLO-ADMINSERVICE",
                    "instanceId": "admin-2:apollo-adminservice:8090",
                    "homepageUrl": "http://10.0.0.2:8090/"
                }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let locator =
            MetaServiceLocator::from_config(reqwest::Client::new(), &meta_config(&server)).unwrap();

        let first = locator.locate(Env::Dev).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].host_str(), Some("10.0.0.2"));

        let second = locator.locate(Env::Dev).await.unwrap();
        assert_eq!(first, second);

        let status = locator.get_status();
        assert_eq!(status.cache_hits, 1);
        assert_eq!(status.cache_misses, 1);
        assert!(status.is_healthy());
    }

    #[tokio::test]
    async fn test_meta_locator_refetches_after_clear() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "appName": "apollo-adminservice", "homepageUrl": "http://10.0.0.1:8090/" }
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let locator =
            MetaServiceLocator::from_config(reqwest::Client::new(), &meta_config(&server)).unwrap();

        locator.locate(Env::Dev).await.unwrap();
        locator.clear_cache();
        locator.locate(Env::Dev).await.unwrap();
        assert_eq!(locator.get_status().cache_hits, 0);
    }

    #[tokio::test]
    async fn test_meta_locator_falls_back_to_static_addresses() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/admin"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .mount(&server)
            .await;

        let config = meta_config(&server)
            .with_admin_service(Env::Dev, "http://admin-static:8090")
            .unwrap();
        let locator = MetaServiceLocator::from_config(reqwest::Client::new(), &config).unwrap();

        let addresses = locator.locate(Env::Dev).await.unwrap();
        assert_eq!(addresses[0].host_str(), Some("admin-static"));

        let status = locator.get_status();
        assert_eq!(status.failed_envs, vec![Env::Dev]);
        assert!(status.last_error.is_some());
    }

    #[tokio::test]
    async fn test_meta_locator_reports_empty_registry() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let locator =
            MetaServiceLocator::from_config(reqwest::Client::new(), &meta_config(&server)).unwrap();

        let err = locator.locate(Env::Dev).await.unwrap_err();
        assert!(matches!(err, Error::DiscoveryFailed(_)));
    }

    #[tokio::test]
    async fn test_meta_locator_uses_static_for_env_without_meta_server() {
        let config = PortalClientConfig::new()
            .with_admin_service(Env::Pro, "http://admin-pro:8090")
            .unwrap();
        let locator = MetaServiceLocator::from_config(reqwest::Client::new(), &config).unwrap();

        let addresses = locator.locate(Env::Pro).await.unwrap();
        assert_eq!(addresses[0].host_str(), Some("admin-pro"));
    }
}
