//! Integration tests for the Deploy API client using wiremock
//!
//! These tests verify request construction (paths, headers, bodies, query
//! strings) and the mapping of response codes onto `ProviderError`.

use deploy_provider::client::models::{
    EnvVars, LinkProjectRequest, NewDeploymentRequest, PageOptions, ProjectSummary,
};
use deploy_provider::{Client, ProviderConfig, ProviderError};
use serde_json::{json, Value};
use wiremock::matchers::{
    body_json, bearer_token, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMESTAMP: &str = "2021-06-01T12:00:00Z";

fn client(server: &MockServer, token: &str) -> Client {
    let config = ProviderConfig::new(token)
        .with_base_url(&server.uri())
        .expect("mock server URI is valid");
    Client::new(&config).expect("client builds")
}

fn project_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "git": null,
        "productionDeployment": null,
        "hasProductionDeployment": false,
        "envVars": {},
        "updatedAt": TIMESTAMP,
        "createdAt": TIMESTAMP
    })
}

fn deployment_json(id: &str) -> Value {
    json!({
        "id": id,
        "url": "https://example.com/main.ts",
        "domainMappings": [
            {"domain": "demo.deno.dev", "updatedAt": TIMESTAMP, "createdAt": TIMESTAMP}
        ],
        "relatedCommit": null,
        "projectId": "p1",
        "envVars": {"A": "1"},
        "updatedAt": TIMESTAMP,
        "createdAt": TIMESTAMP
    })
}

fn domain_json(validated: bool) -> Value {
    json!({
        "domain": "foo.example.org",
        "token": "abc123",
        "isValidated": validated,
        "certificates": if validated { json!(["rsa"]) } else { json!([]) },
        "projectId": "p1",
        "updatedAt": TIMESTAMP,
        "createdAt": TIMESTAMP
    })
}

mod transport_tests {
    use super::*;

    /// Every request carries the bearer token and a JSON content type
    #[tokio::test]
    async fn test_sends_bearer_token_and_content_type() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .and(bearer_token("ddp_test"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([project_json("p1", "demo")])))
            .expect(1)
            .mount(&server)
            .await;

        let projects = client(&server, "ddp_test").list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "demo");
    }

    /// An empty token means no Authorization header at all
    #[tokio::test]
    async fn test_empty_token_sends_no_authorization() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "u1",
                "login": "jane",
                "name": "Jane Doe",
                "avatarUrl": "https://avatars.example.com/u/1",
                "githubId": 1234,
                "isAdmin": false,
                "isBlocked": false,
                "updatedAt": TIMESTAMP,
                "createdAt": TIMESTAMP
            })))
            .mount(&server)
            .await;

        let user = client(&server, "").current_user().await.unwrap();
        assert_eq!(user.login, "jane");
        assert_eq!(user.github_id, 1234);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    /// 404 maps to NotFound
    #[tokio::test]
    async fn test_404_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("project not found"))
            .mount(&server)
            .await;

        let err = client(&server, "t").get_project("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    /// Other failures keep the status and the body verbatim
    #[tokio::test]
    async fn test_500_keeps_body() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/projects/p1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("{\"code\":\"internalServerError\"}"))
            .mount(&server)
            .await;

        let err = client(&server, "t").delete_project("p1").await.unwrap_err();
        match err {
            ProviderError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "{\"code\":\"internalServerError\"}");
            },
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    /// A 2xx with an unexpected body is a decode error
    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server, "t").get_project("p1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    /// Base URLs with a path prefix keep the prefix
    #[tokio::test]
    async fn test_base_url_path_prefix() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/proxy/api/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let config = ProviderConfig::new("t")
            .with_base_url(&format!("{}/proxy", server.uri()))
            .unwrap();
        let projects = Client::new(&config).unwrap().list_projects().await.unwrap();
        assert!(projects.is_empty());
    }
}

mod project_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_project_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/projects"))
            .and(body_json(json!({"name": "demo", "envVars": {"A": "1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_json("p1", "demo")))
            .expect(1)
            .mount(&server)
            .await;

        let env_vars = EnvVars::from([("A".to_string(), "1".to_string())]);
        let project = client(&server, "t")
            .create_project("demo", env_vars)
            .await
            .unwrap();
        assert_eq!(project.id, "p1");
        assert!(project.is_consistent());
    }

    #[tokio::test]
    async fn test_update_project_and_env_vars() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/projects/p1"))
            .and(body_json(json!({"name": "renamed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/projects/p1/env"))
            .and(body_json(json!({"B": "2"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let c = client(&server, "t");
        c.update_project("p1", "renamed").await.unwrap();
        c.update_env_vars("p1", &EnvVars::from([("B".to_string(), "2".to_string())]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_link_and_unlink_github() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/github/link"))
            .and(body_json(json!({
                "projectId": "p1",
                "organization": "octo",
                "repo": "site",
                "entrypoint": "main.ts"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_json("p1", "demo")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/api/projects/p1/git"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let c = client(&server, "t");
        c.link_github(&LinkProjectRequest {
            project_id: "p1".to_string(),
            organization: "octo".to_string(),
            repo: "site".to_string(),
            entrypoint: "main.ts".to_string(),
        })
        .await
        .unwrap();
        c.unlink_github("p1").await.unwrap();
    }
}

mod deployment_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_production_deployment() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/projects/p1/deployments"))
            .and(body_json(json!({"url": "https://example.com/main.ts", "production": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(deployment_json("d1")))
            .expect(1)
            .mount(&server)
            .await;

        let deployment = client(&server, "t")
            .create_deployment("p1", &NewDeploymentRequest::production("https://example.com/main.ts"))
            .await
            .unwrap();
        assert_eq!(deployment.id, "d1");
        assert_eq!(deployment.domain_mappings[0].domain, "demo.deno.dev");
    }

    /// Zero page and limit are left out of the query string
    #[tokio::test]
    async fn test_list_deployments_default_paging() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects/p1/deployments"))
            .and(query_param_is_missing("page"))
            .and(query_param_is_missing("limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                [deployment_json("d1")],
                {"page": 0, "count": 1, "limit": 20, "totalCount": 1, "totalPages": 1}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server, "t")
            .list_deployments("p1", PageOptions::default())
            .await
            .unwrap();
        assert_eq!(page.deployments.len(), 1);
        assert_eq!(page.paging.total_count, 1);
    }

    #[tokio::test]
    async fn test_list_deployments_explicit_paging() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects/p1/deployments"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                [],
                {"page": 2, "count": 0, "limit": 10, "totalCount": 20, "totalPages": 2}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server, "t")
            .list_deployments("p1", PageOptions::new(2, 10))
            .await
            .unwrap();
        assert!(page.deployments.is_empty());
        assert_eq!(page.paging.page, 2);
        assert_eq!(page.paging.total_pages, 2);
    }

    /// A single deployment carries a back-reference to its project
    #[tokio::test]
    async fn test_get_deployment() {
        let server = MockServer::start().await;

        let mut body = deployment_json("d1");
        body["project"] = json!({"id": "p1", "name": "demo"});
        Mock::given(method("GET"))
            .and(path("/api/projects/p1/deployments/d1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let deployment = client(&server, "t").get_deployment("p1", "d1").await.unwrap();
        assert_eq!(deployment.id, "d1");
        assert_eq!(deployment.env_vars.get("A").map(String::as_str), Some("1"));
        assert_eq!(
            deployment.project,
            Some(ProjectSummary {
                id: "p1".to_string(),
                name: "demo".to_string()
            })
        );
    }

    /// Logs are not offered by the API and never hit the network
    #[tokio::test]
    async fn test_get_logs_is_unimplemented() {
        let server = MockServer::start().await;

        let err = client(&server, "t").get_logs("p1", "d1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unimplemented(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

mod domain_tests {
    use super::*;

    #[tokio::test]
    async fn test_add_domain_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/projects/p1/domains"))
            .and(body_json(json!({"domain": "foo.example.org"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(domain_json(false)))
            .expect(1)
            .mount(&server)
            .await;

        let domain = client(&server, "t")
            .add_domain("p1", "foo.example.org")
            .await
            .unwrap();
        assert_eq!(domain.token, "abc123");
        assert!(!domain.is_validated);
    }

    #[tokio::test]
    async fn test_verify_and_provision_paths() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/projects/p1/domains/foo.example.org/verify"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/projects/p1/domains/foo.example.org/certificates"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let c = client(&server, "t");
        c.verify_domain("p1", "foo.example.org").await.unwrap();
        c.provision_certificate("p1", "foo.example.org").await.unwrap();
    }

    #[tokio::test]
    async fn test_verify_failure_surfaces_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/projects/p1/domains/foo.example.org/verify"))
            .respond_with(ResponseTemplate::new(400).set_body_string("DNS records not found"))
            .mount(&server)
            .await;

        let err = client(&server, "t")
            .verify_domain("p1", "foo.example.org")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("DNS records not found"));
    }

    #[tokio::test]
    async fn test_list_domains() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/projects/p1/domains"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([domain_json(true)])))
            .mount(&server)
            .await;

        let domains = client(&server, "t").list_domains("p1").await.unwrap();
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].certificates, vec!["rsa"]);
    }
}
