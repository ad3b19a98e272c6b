//! Configuration item endpoints.

use crate::client::{path, AdminServiceClient};
use crate::models::{Item, ItemChangeSets};
use crate::Result;
use apollo_core::ids::ItemId;
use apollo_core::query::QueryParams;
use apollo_core::Env;
use reqwest::Method;

const ITEMS: &str = "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/items";
const ITEM_BY_KEY: &str =
    "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/items/{key}";
const ITEM_BY_ID: &str =
    "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/items/{itemId}";
const ITEM_SET: &str = "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/itemset";
const ITEM: &str = "items/{itemId}";

/// Item lookup and modification.
#[derive(Clone)]
pub struct ItemApi {
    client: AdminServiceClient,
}

impl ItemApi {
    /// Create the facade over a shared client.
    #[must_use]
    pub const fn new(client: AdminServiceClient) -> Self {
        Self { client }
    }

    /// List the items of a namespace.
    pub async fn find_items(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<Vec<Item>> {
        let path = path(ITEMS, &[&app_id, &cluster_name, &namespace_name])?;
        self.client.get_list(env, &path, &[]).await
    }

    /// Load one item by key. The key is sent as a single path segment.
    pub async fn load_item(
        &self,
        env: Env,
        app_id: &str,
        cluster_name: &str,
        namespace_name: &str,
        key: &str,
    ) -> Result<Item> {
        let path = path(ITEM_BY_KEY, &[&app_id, &cluster_name, &namespace_name, &key])?;
        self.client.get(env, &path, &[]).await
    }

    /// Create an item.
    pub async fn create_item(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
        item: &Item,
    ) -> Result<Item> {
        let path = path(ITEMS, &[&app_id, &cluster_name, &namespace_name])?;
        self.client
            .send_json(env, Method::POST, &path, &[], Some(item))
            .await
    }

    /// Replace an item.
    pub async fn update_item(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
        item_id: ItemId,
        item: &Item,
    ) -> Result<()> {
        let path = path(
            ITEM_BY_ID,
            &[&app_id, &cluster_name, &namespace_name, &item_id],
        )?;
        self.client
            .send_unit(env, Method::PUT, &path, &[], Some(item))
            .await
    }

    /// Apply a batch of creates, updates and deletes.
    pub async fn update_items_by_change_set(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
        change_sets: &ItemChangeSets,
    ) -> Result<()> {
        let path = path(ITEM_SET, &[&app_id, &cluster_name, &namespace_name])?;
        self.client
            .send_unit(env, Method::POST, &path, &[], Some(change_sets))
            .await
    }

    /// Delete an item on behalf of `operator`.
    pub async fn delete_item(&self, env: Env, item_id: ItemId, operator: &str) -> Result<()> {
        let path = path(ITEM, &[&item_id])?;
        let params = QueryParams::new().with("operator", operator).into_pairs();
        self.client
            .send_unit::<()>(env, Method::DELETE, &path, &params, None)
            .await
    }
}
