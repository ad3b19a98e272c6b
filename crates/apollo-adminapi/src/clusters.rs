//! Cluster endpoints.

use crate::client::{path, AdminServiceClient};
use crate::models::Cluster;
use crate::Result;
use apollo_core::query::QueryParams;
use apollo_core::Env;
use reqwest::Method;

const CLUSTERS: &str = "apps/{appId}/clusters";
const CLUSTER: &str = "apps/{appId}/clusters/{clusterName}";
// Singular `cluster` is what the admin service exposes for this check.
const CLUSTER_UNIQUE: &str = "apps/{appId}/cluster/{clusterName}/unique";

/// Cluster lookup, creation and deletion.
#[derive(Clone)]
pub struct ClusterApi {
    client: AdminServiceClient,
}

impl ClusterApi {
    /// Create the facade over a shared client.
    #[must_use]
    pub const fn new(client: AdminServiceClient) -> Self {
        Self { client }
    }

    /// List the clusters of an application.
    pub async fn find_clusters_by_app(&self, app_id: &str, env: Env) -> Result<Vec<Cluster>> {
        let path = path(CLUSTERS, &[&app_id])?;
        self.client.get_list(env, &path, &[]).await
    }

    /// Load one cluster.
    pub async fn load_cluster(&self, app_id: &str, env: Env, cluster_name: &str) -> Result<Cluster> {
        let path = path(CLUSTER, &[&app_id, &cluster_name])?;
        self.client.get(env, &path, &[]).await
    }

    /// Returns true if no cluster of `app_id` uses `cluster_name` yet.
    pub async fn is_cluster_unique(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
    ) -> Result<bool> {
        let path = path(CLUSTER_UNIQUE, &[&app_id, &cluster_name])?;
        self.client.get(env, &path, &[]).await
    }

    /// Create a cluster under the application named by the record.
    pub async fn create(&self, env: Env, cluster: &Cluster) -> Result<Cluster> {
        let path = path(CLUSTERS, &[&cluster.app_id])?;
        self.client
            .send_json(env, Method::POST, &path, &[], Some(cluster))
            .await
    }

    /// Delete a cluster on behalf of `operator`.
    pub async fn delete(
        &self,
        env: Env,
        app_id: &str,
        cluster_name: &str,
        operator: &str,
    ) -> Result<()> {
        let path = path(CLUSTER, &[&app_id, &cluster_name])?;
        let params = QueryParams::new().with("operator", operator).into_pairs();
        self.client
            .send_unit::<()>(env, Method::DELETE, &path, &params, None)
            .await
    }
}
