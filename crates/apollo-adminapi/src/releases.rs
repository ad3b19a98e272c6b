//! Release endpoints.

use crate::client::{path, AdminServiceClient};
use crate::models::Release;
use crate::Result;
use apollo_core::ids::ReleaseId;
use apollo_core::query::QueryParams;
use apollo_core::{Env, OptionalExt};
use reqwest::Method;
use tracing::debug;

const RELEASE: &str = "releases/{releaseId}";
const RELEASES: &str = "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/releases";
const ALL_RELEASES: &str =
    "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/releases/all";
const ACTIVE_RELEASES: &str =
    "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/releases/active";
const LATEST_RELEASE: &str =
    "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/releases/latest";
const ROLLBACK: &str = "releases/{releaseId}/rollback";

/// Release lookup, publication and rollback.
#[derive(Clone)]
pub struct ReleaseApi {
    client: AdminServiceClient,
}

impl ReleaseApi {
    /// Create the facade over a shared client.
    #[must_use]
    pub const fn new(client: AdminServiceClient) -> Self {
        Self { client }
    }

    /// Load one release.
    pub async fn load_release(&self, env: Env, release_id: ReleaseId) -> Result<Release> {
        let path = path(RELEASE, &[&release_id])?;
        self.client.get(env, &path, &[]).await
    }

    /// List releases of a namespace, abandoned ones included.
    pub async fn find_all_releases(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
        page: i32,
        size: i32,
    ) -> Result<Vec<Release>> {
        let path = path(ALL_RELEASES, &[&app_id, &cluster_name, &namespace_name])?;
        let params = QueryParams::new()
            .with("page", page)
            .with("size", size)
            .into_pairs();
        self.client.get_list(env, &path, &params).await
    }

    /// List releases of a namespace that have not been rolled back.
    pub async fn find_active_releases(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
        page: i32,
        size: i32,
    ) -> Result<Vec<Release>> {
        let path = path(ACTIVE_RELEASES, &[&app_id, &cluster_name, &namespace_name])?;
        let params = QueryParams::new()
            .with("page", page)
            .with("size", size)
            .into_pairs();
        self.client.get_list(env, &path, &params).await
    }

    /// Load the latest active release, if the namespace has ever been released.
    pub async fn load_latest_release(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<Option<Release>> {
        let path = path(LATEST_RELEASE, &[&app_id, &cluster_name, &namespace_name])?;
        let release = self
            .client
            .get::<Option<Release>>(env, &path, &[])
            .await
            .optional()?;
        if release.is_none() {
            debug!(app_id, cluster_name, namespace_name, "No release published yet");
        }
        Ok(release)
    }

    /// Publish the namespace's current items as a new release.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_release(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
        release_title: &str,
        comment: &str,
        operator: &str,
    ) -> Result<Release> {
        let path = path(RELEASES, &[&app_id, &cluster_name, &namespace_name])?;
        let form = [
            ("name", release_title),
            ("comment", comment),
            ("operator", operator),
        ];
        self.client.post_form(env, &path, &form).await
    }

    /// Roll back a release on behalf of `operator`.
    pub async fn rollback(&self, env: Env, release_id: ReleaseId, operator: &str) -> Result<()> {
        let path = path(ROLLBACK, &[&release_id])?;
        let params = QueryParams::new().with("operator", operator).into_pairs();
        self.client
            .send_unit::<()>(env, Method::PUT, &path, &params, None)
            .await
    }
}
