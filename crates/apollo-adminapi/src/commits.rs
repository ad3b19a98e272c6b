//! Commit history endpoint.

use crate::client::{path, AdminServiceClient};
use crate::models::Commit;
use crate::Result;
use apollo_core::query::QueryParams;
use apollo_core::Env;

const COMMITS: &str = "apps/{appId}/clusters/{clusterName}/namespaces/{namespaceName}/commit";

/// Commit history of a namespace.
#[derive(Clone)]
pub struct CommitApi {
    client: AdminServiceClient,
}

impl CommitApi {
    /// Create the facade over a shared client.
    #[must_use]
    pub const fn new(client: AdminServiceClient) -> Self {
        Self { client }
    }

    /// List commits of a namespace, newest first.
    pub async fn find(
        &self,
        app_id: &str,
        env: Env,
        cluster_name: &str,
        namespace_name: &str,
        page: i32,
        size: i32,
    ) -> Result<Vec<Commit>> {
        let path = path(COMMITS, &[&app_id, &cluster_name, &namespace_name])?;
        let params = QueryParams::new()
            .with("page", page)
            .with("size", size)
            .into_pairs();
        self.client.get_list(env, &path, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path as url_path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn find_commits_paged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path(
                "/apps/SampleApp/clusters/default/namespaces/application/commit",
            ))
            .and(query_param("page", "1"))
            .and(query_param("size", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "changeSets": "{\"createItems\":[],\"updateItems\":[],\"deleteItems\":[]}",
                "appId": "SampleApp",
                "clusterName": "default",
                "namespaceName": "application",
                "dataChangeCreatedBy": "alice"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let commits = test_client(&server)
            .commits()
            .find("SampleApp", Env::Dev, "default", "application", 1, 10)
            .await
            .unwrap();
        assert_eq!(commits.len(), 1);
        assert!(commits[0].change_sets.contains("createItems"));
        assert_eq!(commits[0].audit.data_change_created_by.as_deref(), Some("alice"));
    }
}
