//! Asynchronous admin service client shared by every resource facade.

use crate::apps::AppApi;
use crate::clusters::ClusterApi;
use crate::commits::CommitApi;
use crate::health::HealthApi;
use crate::instances::InstanceApi;
use crate::items::ItemApi;
use crate::locks::NamespaceLockApi;
use crate::models::AdminErrorBody;
use crate::namespaces::NamespaceApi;
use crate::releases::ReleaseApi;
use crate::Result;
use apollo_core::client::{ClientConfig, RetryPolicy, ServiceClient, ServiceClientBuilder};
use apollo_core::config::PortalClientConfig;
use apollo_core::services::ServiceLocator;
use apollo_core::template::PathTemplate;
use apollo_core::{Env, Error};
use reqwest::header::ACCEPT;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;

const USER_AGENT: &str = concat!("apollo-adminapi/", env!("CARGO_PKG_VERSION"));

/// Builder for [`AdminServiceClient`].
#[derive(Clone)]
pub struct AdminServiceClientBuilder {
    inner: ServiceClientBuilder,
}

impl AdminServiceClientBuilder {
    /// Create a builder that resolves environments through `locator`.
    #[must_use]
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Self {
        Self {
            inner: ServiceClientBuilder::new(locator).with_user_agent(USER_AGENT),
        }
    }

    /// Create a builder from portal configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &PortalClientConfig) -> Result<Self> {
        let inner = ServiceClientBuilder::from_config(config)?.with_user_agent(USER_AGENT);
        Ok(Self { inner })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.inner = self.inner.with_retry_policy(retry);
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Send an access token with every request.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.inner = self.inner.with_access_token(token);
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.inner = self.inner.with_tls_verify(verify);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn build(self) -> Result<AdminServiceClient> {
        let inner = self.inner.build()?;
        Ok(AdminServiceClient { inner })
    }
}

/// Asynchronous admin service client.
///
/// Cloning is cheap; all clones share one connection pool and one locator.
#[derive(Clone)]
pub struct AdminServiceClient {
    inner: ServiceClient,
}

impl AdminServiceClient {
    /// Construct a client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(locator: Arc<dyn ServiceLocator>) -> Result<Self> {
        AdminServiceClientBuilder::new(locator).build()
    }

    /// Construct a client from portal configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &PortalClientConfig) -> Result<Self> {
        AdminServiceClientBuilder::from_config(config)?.build()
    }

    /// Access the underlying transport.
    #[must_use]
    pub const fn service_client(&self) -> &ServiceClient {
        &self.inner
    }

    /// Health checks.
    #[must_use]
    pub fn health(&self) -> HealthApi {
        HealthApi::new(self.clone())
    }

    /// Applications.
    #[must_use]
    pub fn apps(&self) -> AppApi {
        AppApi::new(self.clone())
    }

    /// Namespaces.
    #[must_use]
    pub fn namespaces(&self) -> NamespaceApi {
        NamespaceApi::new(self.clone())
    }

    /// Configuration items.
    #[must_use]
    pub fn items(&self) -> ItemApi {
        ItemApi::new(self.clone())
    }

    /// Clusters.
    #[must_use]
    pub fn clusters(&self) -> ClusterApi {
        ClusterApi::new(self.clone())
    }

    /// Releases.
    #[must_use]
    pub fn releases(&self) -> ReleaseApi {
        ReleaseApi::new(self.clone())
    }

    /// Commits.
    #[must_use]
    pub fn commits(&self) -> CommitApi {
        CommitApi::new(self.clone())
    }

    /// Namespace locks.
    #[must_use]
    pub fn locks(&self) -> NamespaceLockApi {
        NamespaceLockApi::new(self.clone())
    }

    /// Instances.
    #[must_use]
    pub fn instances(&self) -> InstanceApi {
        InstanceApi::new(self.clone())
    }

    pub(crate) async fn get<R>(
        &self,
        env: Env,
        path: &[String],
        params: &[(&'static str, String)],
    ) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.send_json::<(), R>(env, Method::GET, path, params, None)
            .await
    }

    /// GET a JSON array; an empty or `null` body is an empty list.
    pub(crate) async fn get_list<R>(
        &self,
        env: Env,
        path: &[String],
        params: &[(&'static str, String)],
    ) -> Result<Vec<R>>
    where
        R: DeserializeOwned,
    {
        self.get::<Option<Vec<R>>>(env, path, params)
            .await
            .map(Option::unwrap_or_default)
    }

    pub(crate) async fn send_json<B, R>(
        &self,
        env: Env,
        method: Method,
        path: &[String],
        params: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<R>
    where
        B: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .inner
            .execute_with_retry(
                env,
                method,
                path,
                params,
                |mut request| {
                    request = request.header(ACCEPT, "application/json");
                    if let Some(payload) = body {
                        request = request.json(payload);
                    }
                    request
                },
                map_status_to_error,
            )
            .await?;

        read_json(response).await
    }

    pub(crate) async fn send_unit<B>(
        &self,
        env: Env,
        method: Method,
        path: &[String],
        params: &[(&'static str, String)],
        body: Option<&B>,
    ) -> Result<()>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.inner
            .execute_with_retry(
                env,
                method,
                path,
                params,
                |mut request| {
                    request = request.header(ACCEPT, "application/json");
                    if let Some(payload) = body {
                        request = request.json(payload);
                    }
                    request
                },
                map_status_to_error,
            )
            .await
            .map(|_| ())
    }

    /// POST a form-url-encoded body and parse the JSON answer.
    pub(crate) async fn post_form<R>(
        &self,
        env: Env,
        path: &[String],
        form: &[(&str, &str)],
    ) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self
            .inner
            .execute_with_retry(
                env,
                Method::POST,
                path,
                &[],
                |request| request.header(ACCEPT, "application/json").form(form),
                map_status_to_error,
            )
            .await?;

        read_json(response).await
    }
}

/// Expand `template` with `args` into path segments.
pub(crate) fn path(template: &str, args: &[&dyn Display]) -> Result<Vec<String>> {
    PathTemplate::parse(template)?.expand(args)
}

async fn read_json<R>(response: Response) -> Result<R>
where
    R: DeserializeOwned,
{
    let text = response.text().await?;
    let body = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(body).map_err(Error::from)
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    let message = admin_message(&text).unwrap_or(text);
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(message),
        StatusCode::BAD_REQUEST => Error::BadRequest(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(message),
        StatusCode::CONFLICT => Error::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::ServiceUnavailable(format!("Admin service temporarily unavailable: {message}"))
        }
        status if status.is_server_error() => {
            Error::ServiceUnavailable(format!("Admin service error {status}: {message}"))
        }
        _ => Error::HttpError(format!("Admin service error {status}: {message}")),
    }
}

fn admin_message(text: &str) -> Option<String> {
    serde_json::from_str::<AdminErrorBody>(text)
        .ok()?
        .message
        .filter(|message| !message.is_empty())
}
