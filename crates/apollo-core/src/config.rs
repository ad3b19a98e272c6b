//! Configuration structures for admin service clients.
//!
//! This module provides the per-environment routing table (static admin
//! service addresses and meta server URLs), transport settings, and
//! validation.

use crate::client::ADMIN_SERVICE_DEFAULT_TIMEOUT;
use crate::types::Env;
use crate::Error;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;
use validator::{Validate, ValidationError};

/// Configuration for the portal's admin service client.
///
/// Every environment the portal talks to needs either static admin service
/// addresses or a meta server to discover them from. Both may be set; static
/// addresses then act as the fallback when discovery fails.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PortalClientConfig {
    /// Static admin service addresses per environment
    #[validate(custom(function = "validate_admin_services"))]
    #[serde(default)]
    pub admin_services: BTreeMap<Env, AdminServiceEndpointConfig>,

    /// Meta server URL per environment
    #[validate(custom(function = "validate_meta_servers"))]
    #[serde(default)]
    pub meta_servers: BTreeMap<Env, String>,

    /// Token presented to admin services in the `Authorization` header
    #[serde(default, skip_serializing)]
    pub access_token: Option<SecretString>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum number of retry attempts
    #[validate(range(min = 0, max = 10))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// How long discovered admin service addresses are reused, in seconds
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_discovery_cache_ttl_secs")]
    pub discovery_cache_ttl_secs: u64,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    ADMIN_SERVICE_DEFAULT_TIMEOUT
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_discovery_cache_ttl_secs() -> u64 {
    60
}

fn validate_admin_services(
    services: &BTreeMap<Env, AdminServiceEndpointConfig>,
) -> Result<(), ValidationError> {
    for (env, endpoint) in services {
        if endpoint.validate().is_err() {
            let mut error = ValidationError::new("admin_service");
            error.message = Some(format!("invalid admin service addresses for {env}").into());
            return Err(error);
        }
    }
    Ok(())
}

fn validate_meta_servers(servers: &BTreeMap<Env, String>) -> Result<(), ValidationError> {
    for url in servers.values() {
        if Url::parse(url).is_err() {
            let mut error = ValidationError::new("url");
            error.message = Some(format!("invalid meta server URL `{url}`").into());
            return Err(error);
        }
    }
    Ok(())
}

impl PortalClientConfig {
    /// Create an empty configuration with default transport settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            admin_services: BTreeMap::new(),
            meta_servers: BTreeMap::new(),
            access_token: None,
            tls_verify: default_tls_verify(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            discovery_cache_ttl_secs: default_discovery_cache_ttl_secs(),
        }
    }

    /// Register a static admin service address for an environment.
    ///
    /// Calling this repeatedly for the same environment appends addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_admin_service(mut self, env: Env, url: impl Into<String>) -> Result<Self, Error> {
        let url = url.into();
        Url::parse(&url)
            .map_err(|e| Error::ConfigError(format!("Invalid admin service URL `{url}`: {e}")))?;
        self.admin_services
            .entry(env)
            .or_insert_with(AdminServiceEndpointConfig::empty)
            .urls
            .push(url);
        Ok(self)
    }

    /// Register the meta server an environment's admin services are discovered from.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_meta_server(mut self, env: Env, url: impl Into<String>) -> Result<Self, Error> {
        let url = url.into();
        Url::parse(&url)
            .map_err(|e| Error::ConfigError(format!("Invalid meta server URL `{url}`: {e}")))?;
        self.meta_servers.insert(env, url);
        Ok(self)
    }

    /// Set the admin service access token.
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

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set maximum retry attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the discovery cache TTL in seconds.
    #[must_use]
    pub const fn with_discovery_cache_ttl(mut self, seconds: u64) -> Self {
        self.discovery_cache_ttl_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Get the discovery cache TTL as a Duration.
    #[must_use]
    pub const fn discovery_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.discovery_cache_ttl_secs)
    }

    /// Environments with either static addresses or a meta server.
    #[must_use]
    pub fn environments(&self) -> Vec<Env> {
        let mut envs: Vec<Env> = self
            .admin_services
            .keys()
            .chain(self.meta_servers.keys())
            .copied()
            .collect();
        envs.sort();
        envs.dedup();
        envs
    }

    /// Parse the static admin service addresses for an environment.
    ///
    /// Returns an empty list when none are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured URL cannot be parsed.
    pub fn static_addresses(&self, env: Env) -> Result<Vec<Url>, Error> {
        self.admin_services
            .get(&env)
            .map_or_else(|| Ok(Vec::new()), AdminServiceEndpointConfig::parse_urls)
    }

    /// Parse the meta server URL for an environment, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured URL cannot be parsed.
    pub fn meta_server(&self, env: Env) -> Result<Option<Url>, Error> {
        self.meta_servers
            .get(&env)
            .map(|url| {
                Url::parse(url)
                    .map_err(|e| Error::ConfigError(format!("Invalid meta server URL: {e}")))
            })
            .transpose()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] listing the failing fields.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()?;
        Ok(())
    }
}

impl Default for PortalClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Static admin service addresses for a single environment.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminServiceEndpointConfig {
    /// Admin service base URLs, tried in order
    #[validate(length(min = 1), custom(function = "validate_urls"))]
    pub urls: Vec<String>,
}

fn validate_urls(urls: &[String]) -> Result<(), ValidationError> {
    if urls.iter().all(|url| Url::parse(url).is_ok()) {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}

impl AdminServiceEndpointConfig {
    /// Create an endpoint configuration from one or more URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty or any URL is invalid.
    pub fn new<I, S>(urls: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = Self {
            urls: urls.into_iter().map(Into::into).collect(),
        };

        config.validate()?;

        Ok(config)
    }

    const fn empty() -> Self {
        Self { urls: Vec::new() }
    }

    /// Parse and validate every URL.
    ///
    /// # Errors
    ///
    /// Returns an error if any URL cannot be parsed.
    pub fn parse_urls(&self) -> Result<Vec<Url>, Error> {
        self.urls
            .iter()
            .map(|url| {
                Url::parse(url)
                    .map_err(|e| Error::ConfigError(format!("Invalid admin service URL: {e}")))
            })
            .collect()
    }
}
