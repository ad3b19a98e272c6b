//! Namespace lock endpoint.

use crate::client::{path, AdminServiceClient};
use crate::models::NamespaceLock;
use crate::Result;
use apollo_core::{Env, OptionalExt};

const LOCK: &str = "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/lock";

/// Namespace edit locks.
#[derive(Clone)]
pub struct NamespaceLockApi {
    client: AdminServiceClient,
}

impl NamespaceLockApi {
    /// Create the facade over a shared client.
    #[must_use]
    pub const fn new(client: AdminServiceClient) -> Self {
        Self { client }
    }

    /// Return the lock on a namespace, or `None` if nobody holds it.
    pub async fn get_namespace_lock_owner(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<Option<NamespaceLock>> {
        let path = path(LOCK, &[&app_id, &cluster_name, &namespace_name])?;
        self.client
            .get::<Option<NamespaceLock>>(env, &path, &[])
            .await
            .optional()
    }
}
