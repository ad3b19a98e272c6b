//! Namespace endpoints.

use crate::client::{path, AdminServiceClient};
use crate::models::{AppNamespace, Namespace};
use crate::Result;
use apollo_core::query::QueryParams;
use apollo_core::Env;
use reqwest::Method;

const NAMESPACES: &str = "apps/{appId}/clusters/{clusterName}/namespaces";
const NAMESPACE: &str = "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}";
const APP_NAMESPACES: &str = "apps/{appId}/appnamespaces";

/// Namespace lookup, creation and deletion.
#[derive(Clone)]
pub struct NamespaceApi {
    client: AdminServiceClient,
}

impl NamespaceApi {
    /// Create the facade over a shared client.
    #[must_use]
    pub const fn new(client: AdminServiceClient) -> Self {
        Self { client }
    }

    /// List the namespaces of a cluster.
    pub async fn find_namespace_by_cluster(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
    ) -> Result<Vec<Namespace>> {
        let path = path(NAMESPACES, &[&app_id, &cluster_name])?;
        self.client.get_list(env, &path, &[]).await
    }

    /// Load one namespace.
    pub async fn load_namespace(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<Namespace> {
        let path = path(NAMESPACE, &[&app_id, &cluster_name, &namespace_name])?;
        self.client.get(env, &path, &[]).await
    }

    /// Create a namespace in the cluster named by the record.
    pub async fn create_namespace(&self, env: Env, namespace: &Namespace) -> Result<Namespace> {
        let path = path(NAMESPACES, &[&namespace.app_id, &namespace.cluster_name])?;
        self.client
            .send_json(env, Method::POST, &path, &[], Some(namespace))
            .await
    }

    /// Create an application-level namespace definition.
    pub async fn create_app_namespace(
        &self,
        env: Env,
        app_namespace: &AppNamespace,
    ) -> Result<AppNamespace> {
        let path = path(APP_NAMESPACES, &[&app_namespace.app_id])?;
        self.client
            .send_json(env, Method::POST, &path, &[], Some(app_namespace))
            .await
    }

    /// Delete a namespace on behalf of `operator`.
    pub async fn delete_namespace(
        &self,
        env: Env,
        app_id: &str,
        cluster_name: &str,
        namespace_name: &str,
        operator: &str,
    ) -> Result<()> {
        let path = path(NAMESPACE, &[&app_id, &cluster_name, &namespace_name])?;
        let params = QueryParams::new().with("operator", operator).into_pairs();
        self.client
            .send_unit::<()>(env, Method::DELETE, &path, &params, None)
            .await
    }
}
