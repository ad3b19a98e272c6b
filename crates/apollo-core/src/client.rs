//! Environment-aware HTTP client, retry policy and connection settings.
//!
//! [`ServiceClient`] resolves an [`Env`] to admin service addresses through a
//! [`ServiceLocator`], issues the request, and retries with failover across the
//! resolved addresses according to a [`RetryPolicy`].

use crate::config::PortalClientConfig;
use crate::error::{Error, Result};
use crate::services::{MetaServiceLocator, ServiceLocator, StaticServiceLocator};
use crate::types::Env;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

/// Default timeout for admin service requests
pub const ADMIN_SERVICE_DEFAULT_TIMEOUT: u64 = 10;

/// Default timeout for meta server requests
pub const META_SERVICE_DEFAULT_TIMEOUT: u64 = 5;

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 3;

// Connection pool settings

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

// Retry settings

/// Default maximum number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default initial retry delay in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Default maximum retry delay in milliseconds (for exponential backoff)
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;

/// Retry policy with exponential backoff.
///
/// Configures how requests are retried on failure. Each retry goes to the next
/// resolved admin service address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,

    /// Initial delay before first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential backoff)
    pub max_delay: Duration,

    /// Backoff multiplier (typically 2 for exponential backoff)
    pub backoff_multiplier: u32,
}

impl RetryPolicy {
    /// Create a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            backoff_multiplier: 2,
        }
    }

    /// Create a retry policy with no retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            backoff_multiplier: 1,
        }
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial delay.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    #[must_use]
    pub const fn with_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculate delay for a given attempt number.
    ///
    /// Uses exponential backoff: delay = min(initial_delay * multiplier^(attempt - 1), max_delay)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let multiplier = self.backoff_multiplier.saturating_pow(attempt - 1);
        let delay = self.initial_delay.saturating_mul(multiplier);

        std::cmp::min(delay, self.max_delay)
    }

    /// Check if retries are enabled.
    #[must_use]
    pub const fn has_retries(&self) -> bool {
        self.max_retries > 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP client configuration.
///
/// Configures HTTP client behavior including timeouts, retries, and connection pooling.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Retry policy
    pub retry_policy: RetryPolicy,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Log every outbound attempt at info level
    pub enable_logging: bool,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(ADMIN_SERVICE_DEFAULT_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            retry_policy: RetryPolicy::new(),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_logging: true,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Disable retries.
    #[must_use]
    pub const fn without_retries(mut self) -> Self {
        self.retry_policy = RetryPolicy::no_retry();
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.enable_logging = enabled;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    fn http_builder(&self, user_agent: &str) -> ClientBuilder {
        ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .gzip(self.enable_compression)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true for verbs that may be replayed after a timeout or a 5xx.
#[must_use]
pub fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    ) || status.is_server_error()
}

/// Append already-expanded path segments to a base URL.
///
/// Each segment is percent-encoded on its own, so a value containing `/`
/// stays a single segment.
///
/// # Errors
///
/// Returns [`Error::InvalidEndpoint`] if `base` cannot carry a path.
pub fn build_url(base: &Url, segments: &[String]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidEndpoint(format!("admin service URL `{base}` cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Builder for [`ServiceClient`].
#[derive(Clone)]
pub struct ServiceClientBuilder {
    locator: Arc<dyn ServiceLocator>,
    http_config: ClientConfig,
    user_agent: String,
    access_token: Option<SecretString>,
    tls_verify: bool,
}

impl ServiceClientBuilder {
    /// Create a builder that resolves environments through `locator`.
    #[must_use]
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Self {
        Self {
            locator,
            http_config: ClientConfig::new(),
            user_agent: concat!("apollo-core/", env!("CARGO_PKG_VERSION")).to_string(),
            access_token: None,
            tls_verify: true,
        }
    }

    /// Create a builder from portal configuration.
    ///
    /// Environments with a meta server are discovered through it (falling back
    /// to static addresses); all others use static addresses only.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &PortalClientConfig) -> Result<Self> {
        config.check()?;

        let locator: Arc<dyn ServiceLocator> = if config.meta_servers.is_empty() {
            Arc::new(StaticServiceLocator::from_config(config)?)
        } else {
            let meta_http = ClientConfig::new()
                .with_timeout(Duration::from_secs(META_SERVICE_DEFAULT_TIMEOUT))
                .http_builder(concat!("apollo-core/", env!("CARGO_PKG_VERSION")))
                .danger_accept_invalid_certs(!config.tls_verify)
                .build()
                .map_err(|err| {
                    Error::ConfigError(format!("Failed to build meta server HTTP client: {err}"))
                })?;
            Arc::new(MetaServiceLocator::from_config(meta_http, config)?)
        };

        let http_config = ClientConfig::new()
            .with_timeout(config.timeout())
            .with_retry_policy(RetryPolicy::new().with_max_retries(config.max_retries));

        Ok(Self {
            locator,
            http_config,
            user_agent: concat!("apollo-core/", env!("CARGO_PKG_VERSION")).to_string(),
            access_token: config.access_token.clone(),
            tls_verify: config.tls_verify,
        })
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.http_config.retry_policy = retry;
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Send `token` in the `Authorization` header of every request.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(token.into()));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed or the access
    /// token is not a valid header value.
    pub fn build(self) -> Result<ServiceClient> {
        let mut builder = self.http_config.http_builder(&self.user_agent);

        if !self.tls_verify {
            warn!("TLS verification disabled for admin service client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build admin service HTTP client: {err}"))
        })?;

        let authorization = self
            .access_token
            .as_ref()
            .map(|token| {
                HeaderValue::from_str(token.expose_secret())
                    .map(|mut value| {
                        value.set_sensitive(true);
                        value
                    })
                    .map_err(|_| {
                        Error::ConfigError("Access token is not a valid header value".to_string())
                    })
            })
            .transpose()?;

        Ok(ServiceClient {
            http,
            locator: self.locator,
            retry_policy: self.http_config.retry_policy,
            authorization,
            log_requests: self.http_config.enable_logging,
        })
    }
}

/// Environment-aware HTTP client shared by every admin service facade.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    locator: Arc<dyn ServiceLocator>,
    retry_policy: RetryPolicy,
    authorization: Option<HeaderValue>,
    log_requests: bool,
}

impl ServiceClient {
    /// Access the locator used to resolve environments.
    #[must_use]
    pub fn locator(&self) -> &Arc<dyn ServiceLocator> {
        &self.locator
    }

    /// Return the retry policy in effect.
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Execute a request against `env`, retrying and failing over between
    /// that environment's admin services.
    ///
    /// `configure` is applied to every attempt (headers, body). Non-success
    /// responses are turned into errors by `map_status`, which receives the
    /// status and the response body text.
    ///
    /// Connect failures are retried for every verb. Timeouts and 5xx/429
    /// responses are retried only for idempotent verbs. Other 4xx responses
    /// are never retried.
    ///
    /// # Errors
    ///
    /// Returns the locator's error if `env` cannot be resolved, otherwise the
    /// error from the last attempt.
    pub async fn execute_with_retry<F, M>(
        &self,
        env: Env,
        method: Method,
        segments: &[String],
        params: &[(&'static str, String)],
        configure: F,
        map_status: M,
    ) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
        M: Fn(StatusCode, String) -> Error,
    {
        let addresses = self.locator.locate(env).await?;
        if addresses.is_empty() {
            return Err(Error::DiscoveryFailed(format!(
                "No admin service available for {env}"
            )));
        }

        let idempotent = is_idempotent(&method);
        let mut attempt: u32 = 0;

        loop {
            let base = &addresses[attempt as usize % addresses.len()];
            let url = build_url(base, segments)?;

            let mut request = self.http.request(method.clone(), url.clone());
            if !params.is_empty() {
                request = request.query(params);
            }
            if let Some(authorization) = &self.authorization {
                request = request.header(AUTHORIZATION, authorization.clone());
            }
            request = configure(request);

            if self.log_requests {
                info!(env = %env, method = %method, url = %url, attempt, "Sending admin service request");
            } else {
                debug!(env = %env, method = %method, url = %url, attempt, "Sending admin service request");
            }

            let error = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    let error = map_status(status, message);

                    if !(idempotent && is_retryable_status(status)) {
                        return Err(error);
                    }
                    error
                }
                Err(err) => {
                    let retryable = err.is_connect() || (idempotent && err.is_timeout());
                    let error = Error::from(err);
                    if !retryable {
                        return Err(error);
                    }
                    error
                }
            };

            attempt += 1;
            if attempt > self.retry_policy.max_retries {
                return Err(error);
            }

            if addresses.len() > 1 {
                warn!(
                    env = %env,
                    failed = %base,
                    next = %addresses[attempt as usize % addresses.len()],
                    error = %error,
                    "Admin service request failed, failing over"
                );
            }

            let delay = self.retry_policy.delay_for_attempt(attempt);
            if delay > Duration::from_millis(0) {
                debug!("Retrying admin service request after {:?}", delay);
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockServiceLocator;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| (*part).to_string()).collect()
    }

    fn passthrough(status: StatusCode, text: String) -> Error {
        match status {
            StatusCode::NOT_FOUND => Error::NotFound(text),
            status if status.is_server_error() => Error::ServiceUnavailable(text),
            _ => Error::HttpError(text),
        }
    }

    fn fast_retries(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_retries(max_retries)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(1))
    }

    fn client_for(addresses: &[String], retry: RetryPolicy) -> ServiceClient {
        let mut locator = StaticServiceLocator::new();
        for address in addresses {
            locator = locator.with_address(Env::Dev, address).unwrap();
        }
        ServiceClientBuilder::new(Arc::new(locator))
            .with_retry_policy(retry)
            .build()
            .unwrap()
    }

    #[test]
    fn test_retry_policy_new() {
        let policy = RetryPolicy::new();
        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.initial_delay, Duration::from_millis(DEFAULT_RETRY_DELAY_MS));
        assert_eq!(policy.max_delay, Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS));
        assert_eq!(policy.backoff_multiplier, 2);
        assert!(policy.has_retries());
        assert!(!RetryPolicy::no_retry().has_retries());
    }

    #[test]
    fn test_retry_policy_delay_calculation() {
        let policy = RetryPolicy::new();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(0));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(4000));
        // capped at max_delay
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(5000));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_millis(5000));
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(1))
            .without_retries()
            .with_pool_idle_timeout(Duration::from_secs(120))
            .with_pool_max_idle(20)
            .with_logging(false)
            .with_compression(false);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.retry_policy.max_retries, 0);
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.pool_max_idle_per_host, 20);
        assert!(!config.enable_logging);
        assert!(!config.enable_compression);
    }

    #[test]
    fn test_is_idempotent() {
        assert!(is_idempotent(&Method::GET));
        assert!(is_idempotent(&Method::PUT));
        assert!(is_idempotent(&Method::DELETE));
        assert!(!is_idempotent(&Method::POST));
        assert!(!is_idempotent(&Method::PATCH));
    }

    #[test]
    fn test_build_url_encodes_each_segment() {
        let base = Url::parse("http://admin:8090/").unwrap();
        let url = build_url(&base, &segments(&["items", "a/b c"])).unwrap();
        assert_eq!(url.as_str(), "http://admin:8090/items/a%2Fb%20c");
    }

    #[test]
    fn test_build_url_keeps_base_path() {
        let base = Url::parse("http://gateway/admin-dev/").unwrap();
        let url = build_url(&base, &segments(&["apps", "SampleApp"])).unwrap();
        assert_eq!(url.path(), "/admin-dev/apps/SampleApp");
    }

    #[tokio::test]
    async fn test_builder_from_config_static() {
        let config = PortalClientConfig::new()
            .with_admin_service(Env::Uat, "http://admin-uat:8090")
            .unwrap()
            .with_max_retries(1);

        let client = ServiceClientBuilder::from_config(&config)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(client.retry_policy().max_retries, 1);
        assert!(client.locator().is_available(Env::Uat).await);
    }

    #[test]
    fn test_builder_from_config_rejects_invalid() {
        let config = PortalClientConfig::new().with_max_retries(50);
        assert!(matches!(
            ServiceClientBuilder::from_config(&config),
            Err(Error::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_sends_query_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/SampleApp"))
            .and(query_param("page", "0"))
            .and(header("Authorization", "token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let locator = StaticServiceLocator::new()
            .with_address(Env::Dev, server.uri())
            .unwrap();
        let client = ServiceClientBuilder::new(Arc::new(locator))
            .with_access_token("token-1")
            .build()
            .unwrap();

        let response = client
            .execute_with_retry(
                Env::Dev,
                Method::GET,
                &segments(&["apps", "SampleApp"]),
                &[("page", "0".to_string())],
                |request| request,
                passthrough,
            )
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_execute_maps_not_found_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("app not found"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&[server.uri()], fast_retries(3));
        let err = client
            .execute_with_retry(
                Env::Dev,
                Method::GET,
                &segments(&["apps", "missing"]),
                &[],
                |request| request,
                passthrough,
            )
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound("app not found".to_string()));
    }

    #[tokio::test]
    async fn test_execute_retries_get_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&[server.uri()], fast_retries(2));
        let response = client
            .execute_with_retry(
                Env::Dev,
                Method::GET,
                &segments(&["health"]),
                &[],
                |request| request,
                passthrough,
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_execute_does_not_retry_post_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&[server.uri()], fast_retries(3));
        let err = client
            .execute_with_retry(
                Env::Dev,
                Method::POST,
                &segments(&["apps"]),
                &[],
                |request| request,
                passthrough,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_execute_fails_over_on_connect_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apps"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        // Nothing listens on port 9 locally, so the first attempt fails to connect.
        let client = client_for(
            &["http://127.0.0.1:9".to_string(), server.uri()],
            fast_retries(1),
        );
        let response = client
            .execute_with_retry(
                Env::Dev,
                Method::POST,
                &segments(&["apps"]),
                &[],
                |request| request,
                passthrough,
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_execute_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&[server.uri()], fast_retries(2));
        let err = client
            .execute_with_retry(
                Env::Dev,
                Method::GET,
                &segments(&["health"]),
                &[],
                |request| request,
                passthrough,
            )
            .await
            .unwrap_err();
        assert_eq!(err, Error::ServiceUnavailable("bad gateway".to_string()));
    }

    #[tokio::test]
    async fn test_execute_returns_error_from_final_attempt() {
        let first = MockServer::start().await;
        let second = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("first down"))
            .expect(2)
            .mount(&first)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("second down"))
            .expect(1)
            .mount(&second)
            .await;

        let client = client_for(&[first.uri(), second.uri()], fast_retries(1));
        let err = client
            .execute_with_retry(
                Env::Dev,
                Method::GET,
                &segments(&["health"]),
                &[],
                |request| request,
                passthrough,
            )
            .await
            .unwrap_err();
        assert_eq!(err, Error::ServiceUnavailable("second down".to_string()));

        let client = client_for(&[first.uri()], fast_retries(0));
        let err = client
            .execute_with_retry(
                Env::Dev,
                Method::GET,
                &segments(&["health"]),
                &[],
                |request| request,
                passthrough,
            )
            .await
            .unwrap_err();
        assert_eq!(err, Error::ServiceUnavailable("first down".to_string()));
    }

    #[tokio::test]
    async fn test_execute_propagates_locator_failure() {
        let mut locator = MockServiceLocator::new();
        locator
            .expect_locate()
            .returning(|env| Err(Error::DiscoveryFailed(format!("no meta server for {env}"))));

        let client = ServiceClientBuilder::new(Arc::new(locator)).build().unwrap();
        let err = client
            .execute_with_retry(
                Env::Pro,
                Method::GET,
                &segments(&["health"]),
                &[],
                |request| request,
                passthrough,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DiscoveryFailed(_)));
    }

    #[tokio::test]
    async fn test_execute_rejects_empty_address_list() {
        let mut locator = MockServiceLocator::new();
        locator.expect_locate().returning(|_| Ok(Vec::new()));

        let client = ServiceClientBuilder::new(Arc::new(locator)).build().unwrap();
        let err = client
            .execute_with_retry(
                Env::Dev,
                Method::GET,
                &segments(&["health"]),
                &[],
                |request| request,
                passthrough,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DiscoveryFailed(_)));
    }
}
