//! Admin service health endpoint.

use crate::client::{path, AdminServiceClient};
use crate::models::Health;
use crate::Result;
use apollo_core::Env;

const HEALTH: &str = "health";

/// Health checks against an environment's admin service.
#[derive(Clone)]
pub struct HealthApi {
    client: AdminServiceClient,
}

impl HealthApi {
    /// Create the facade over a shared client.
    #[must_use]
    pub const fn new(client: AdminServiceClient) -> Self {
        Self { client }
    }

    /// Fetch the health report of `env`'s admin service.
    pub async fn health(&self, env: Env) -> Result<Health> {
        let path = path(HEALTH, &[])?;
        self.client.get(env, &path, &[]).await
    }
}
