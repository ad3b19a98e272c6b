//! Application endpoints.

use crate::client::{path, AdminServiceClient};
use crate::models::App;
use crate::Result;
use apollo_core::Env;
use reqwest::Method;

const APPS: &str = "apps";
const APP: &str = "apps/{appId}";

/// Application lookup and creation.
#[derive(Clone)]
pub struct AppApi {
    client: AdminServiceClient,
}

impl AppApi {
    /// Create the facade over a shared client.
    #[must_use]
    pub const fn new(client: AdminServiceClient) -> Self {
        Self { client }
    }

    /// Load one application.
    pub async fn load_app(&self, env: Env, app_id: &str) -> Result<App> {
        let path = path(APP, &[&app_id])?;
        self.client.get(env, &path, &[]).await
    }

    /// Create an application and return the stored record.
    pub async fn create_app(&self, env: Env, app: &App) -> Result<App> {
        let path = path(APPS, &[])?;
        self.client
            .send_json(env, Method::POST, &path, &[], Some(app))
            .await
    }
}
