//! Instance endpoints.
//!
//! Instances are queried by release or by namespace coordinates, all of which
//! travel as query parameters rather than path segments.

use std::collections::BTreeSet;

use crate::client::{path, AdminServiceClient};
use crate::models::{Instance, Page};
use crate::Result;
use apollo_core::ids::ReleaseId;
use apollo_core::query::QueryParams;
use apollo_core::Env;

const BY_RELEASE: &str = "instances/by-release";
const BY_RELEASES_NOT_IN: &str = "instances/by-namespace-and-releases-not-in";
const BY_NAMESPACE: &str = "instances/by-namespace";
const COUNT_BY_NAMESPACE: &str = "instances/by-namespace/count";

/// Instance queries.
#[derive(Clone)]
pub struct InstanceApi {
    client: AdminServiceClient,
}

impl InstanceApi {
    /// Create the facade over a shared client.
    #[must_use]
    pub const fn new(client: AdminServiceClient) -> Self {
        Self { client }
    }

    /// Page through the instances consuming a release.
    pub async fn get_by_release(
        &self,
        env: Env,
        release_id: ReleaseId,
        page: i32,
        size: i32,
    ) -> Result<Page<Instance>> {
        let path = path(BY_RELEASE, &[])?;
        let params = QueryParams::new()
            .with("releaseId", release_id)
            .with("page", page)
            .with("size", size)
            .into_pairs();
        self.client.get(env, &path, &params).await
    }

    /// List the instances of a namespace that consume none of `release_ids`.
    pub async fn get_by_releases_not_in(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
        release_ids: &BTreeSet<ReleaseId>,
    ) -> Result<Vec<Instance>> {
        let path = path(BY_RELEASES_NOT_IN, &[])?;
        let mut params = namespace_params(app_id, cluster_name, namespace_name);
        params.push_joined("releaseIds", release_ids);
        self.client.get_list(env, &path, &params.into_pairs()).await
    }

    /// Page through the instances of a namespace.
    pub async fn get_by_namespace(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
        page: i32,
        size: i32,
    ) -> Result<Page<Instance>> {
        let path = path(BY_NAMESPACE, &[])?;
        let params = namespace_params(app_id, cluster_name, namespace_name)
            .with("page", page)
            .with("size", size)
            .into_pairs();
        self.client.get(env, &path, &params).await
    }

    /// Count the instances of a namespace. A missing count is `0`.
    pub async fn get_instance_count_by_namespace(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
    ) -> Result<u32> {
        let path = path(COUNT_BY_NAMESPACE, &[])?;
        let params = namespace_params(app_id, cluster_name, namespace_name).into_pairs();
        let count: Option<u32> = self.client.get(env, &path, &params).await?;
        Ok(count.unwrap_or(0))
    }
}

fn namespace_params(app_id: &str, cluster_name: &str, namespace_name: &str) -> QueryParams {
    QueryParams::new()
        .with("appId", app_id)
        .with("clusterName", cluster_name)
        .with("namespaceName", namespace_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use apollo_core::ids::InstanceId;
    use serde_json::json;
    use wiremock::matchers::{method, path as url_path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn instance_json(id: i64, ip: &str) -> serde_json::Value {
        json!({
            "id": id,
            "appId": "SampleApp",
            "clusterName": "default",
            "dataCenter": "SHAOY",
            "ip": ip,
            "configs": [{
                "release": {
                    "id": 42,
                    "releaseKey": "20240301101530-42",
                    "name": "v1",
                    "appId": "SampleApp",
                    "clusterName": "default",
                    "namespaceName": "application"
                },
                "releaseDeliveryTime": "2024-03-01T10:15:30.000+0800",
                "dataChangeLastModifiedTime": "2024-03-01T10:20:00.000+0800"
            }]
        })
    }

    #[tokio::test]
    async fn get_by_release_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/instances/by-release"))
            .and(query_param("releaseId", "42"))
            .and(query_param("page", "0"))
            .and(query_param("size", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 0,
                "size": 20,
                "total": 1,
                "content": [instance_json(1, "10.0.0.1")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = test_client(&server)
            .instances()
            .get_by_release(Env::Dev, ReleaseId::new(42), 0, 20)
            .await
            .unwrap();
        assert!(page.has_content());
        assert_eq!(page.total, 1);
        assert_eq!(page.content[0].id, InstanceId::new(1));
        assert_eq!(
            page.content[0].configs[0]
                .release
                .as_ref()
                .and_then(|release| release.id),
            Some(ReleaseId::new(42))
        );
    }

    #[tokio::test]
    async fn get_by_releases_not_in_joins_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/instances/by-namespace-and-releases-not-in"))
            .and(query_param("appId", "SampleApp"))
            .and(query_param("clusterName", "default"))
            .and(query_param("namespaceName", "application"))
            .and(query_param("releaseIds", "1,2,3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([instance_json(5, "10.0.0.5")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let release_ids: BTreeSet<ReleaseId> = [3, 1, 2, 1].into_iter().map(ReleaseId::new).collect();
        let instances = test_client(&server)
            .instances()
            .get_by_releases_not_in("SampleApp", Env::Dev, "default", "application", &release_ids)
            .await
            .unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].ip, "10.0.0.5");
    }

    #[tokio::test]
    async fn get_by_namespace_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/instances/by-namespace"))
            .and(query_param("appId", "SampleApp"))
            .and(query_param("clusterName", "default"))
            .and(query_param("namespaceName", "application"))
            .and(query_param("page", "3"))
            .and(query_param("size", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": 3,
                "size": 7,
                "total": 21,
                "content": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = test_client(&server)
            .instances()
            .get_by_namespace("SampleApp", Env::Dev, "default", "application", 3, 7)
            .await
            .unwrap();
        assert!(!page.has_content());
        assert_eq!(page.total, 21);
    }

    #[tokio::test]
    async fn instance_count_reads_number() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/instances/by-namespace/count"))
            .and(query_param("appId", "SampleApp"))
            .and(query_param("clusterName", "default"))
            .and(query_param("namespaceName", "application"))
            .respond_with(ResponseTemplate::new(200).set_body_string("12"))
            .expect(1)
            .mount(&server)
            .await;

        let count = test_client(&server)
            .instances()
            .get_instance_count_by_namespace("SampleApp", Env::Dev, "default", "application")
            .await
            .unwrap();
        assert_eq!(count, 12);
    }

    #[tokio::test]
    async fn instance_count_defaults_to_zero() {
        for body in ["", "null"] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(url_path("/instances/by-namespace/count"))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .expect(1)
                .mount(&server)
                .await;

            let count = test_client(&server)
                .instances()
                .get_instance_count_by_namespace("SampleApp", Env::Dev, "default", "application")
                .await
                .unwrap();
            assert_eq!(count, 0, "body {body:?}");
        }
    }
}
