//! Issue API repository

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::error::{API_UNRESPONSIVE_MESSAGE, ClientError, RepositoryError};
use crate::http::{HttpService, MediaType, classify_response};
use crate::models::{DashboardKpi, Issue, is_valid_issue_id};

pub const ISSUE_API_TIMEOUT: Duration = Duration::from_secs(10);

const ISSUES_PATH: &str = "issues/";
const SEARCH_PATH: &str = "issues/search";
const METRICS_PATH: &str = "metrics/";

pub const ISSUE_SUBMITTED_MESSAGE: &str = "Issue Submitted Successfully";
pub const ISSUE_UPDATED_MESSAGE: &str = "Update Successful";
pub const ISSUE_DELETED_MESSAGE: &str = "Delete Successful";

/// Operations a front end needs on issues
#[async_trait]
pub trait IssueRepository: Send + Sync {
    async fn get_issues(&self) -> Result<Vec<Issue>, RepositoryError>;

    async fn get_issue(&self, id: &str) -> Result<Issue, RepositoryError>;

    /// `query_string` is appended to the search path as is,
    /// e.g. the output of [`crate::QueryBuilder::build`]
    async fn query_issues(&self, query_string: &str) -> Result<Vec<Issue>, RepositoryError>;

    async fn get_metrics(&self, project: &str) -> Result<DashboardKpi, RepositoryError>;

    async fn create_issue(&self, issue: &Issue) -> Result<String, RepositoryError>;

    async fn update_issue(&self, issue: &Issue) -> Result<String, RepositoryError>;

    async fn delete_issue(&self, id: &str) -> Result<String, RepositoryError>;
}

/// HTTP client for the Issue API.
///
/// `base_url` points at the API root, e.g. `http://host:5005/api/`.
#[derive(Debug, Clone)]
pub struct IssueClient {
    http: HttpService,
}

impl IssueClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, api_key, ISSUE_API_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        if api_key.is_empty() {
            return Err(ClientError::MissingSetting("api key"));
        }
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|_| ClientError::InvalidHeader("Authorization"))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, key);

        Ok(Self {
            http: HttpService::new(base_url, timeout, MediaType::Json, headers)?,
        })
    }

    fn transport(error: ClientError) -> RepositoryError {
        RepositoryError::from_client_error(error, API_UNRESPONSIVE_MESSAGE)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, RepositoryError> {
        let response = self.http.query(path).await.map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }
        self.http
            .read_body(response)
            .await
            .map_err(Self::transport)
    }

    async fn expect_success(
        &self,
        response: Result<reqwest::Response, ClientError>,
        message: &str,
    ) -> Result<String, RepositoryError> {
        let response = response.map_err(Self::transport)?;
        if !response.status().is_success() {
            return Err(classify_response(response).await);
        }
        Ok(message.to_string())
    }

    fn checked_id(id: Option<&str>) -> Result<&str, RepositoryError> {
        match id {
            Some(id) if is_valid_issue_id(id) => Ok(id),
            other => {
                tracing::error!(id = ?other, "Refusing request with a malformed issue id");
                Err(RepositoryError::invalid_field())
            }
        }
    }
}

#[async_trait]
impl IssueRepository for IssueClient {
    async fn get_issues(&self) -> Result<Vec<Issue>, RepositoryError> {
        self.fetch(ISSUES_PATH).await
    }

    async fn get_issue(&self, id: &str) -> Result<Issue, RepositoryError> {
        let id = Self::checked_id(Some(id))?;
        self.fetch(&format!("{ISSUES_PATH}{id}")).await
    }

    async fn query_issues(&self, query_string: &str) -> Result<Vec<Issue>, RepositoryError> {
        self.fetch(&format!("{SEARCH_PATH}{query_string}")).await
    }

    async fn get_metrics(&self, project: &str) -> Result<DashboardKpi, RepositoryError> {
        if project.is_empty() {
            return Err(RepositoryError::invalid_field());
        }
        self.fetch(&format!("{METRICS_PATH}{project}")).await
    }

    async fn create_issue(&self, issue: &Issue) -> Result<String, RepositoryError> {
        let response = self.http.insert(ISSUES_PATH, issue).await;
        self.expect_success(response, ISSUE_SUBMITTED_MESSAGE).await
    }

    async fn update_issue(&self, issue: &Issue) -> Result<String, RepositoryError> {
        let id = Self::checked_id(issue.id.as_deref())?;
        let response = self.http.update(&format!("{ISSUES_PATH}{id}"), issue).await;
        self.expect_success(response, ISSUE_UPDATED_MESSAGE).await
    }

    async fn delete_issue(&self, id: &str) -> Result<String, RepositoryError> {
        let id = Self::checked_id(Some(id))?;
        let response = self.http.delete(&format!("{ISSUES_PATH}{id}")).await;
        self.expect_success(response, ISSUE_DELETED_MESSAGE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCategory, INTERNAL_ERROR_MESSAGE, INVALID_FIELD_MESSAGE};
    use httpmock::prelude::*;
    use serde_json::json;

    const ID: &str = "5f1a2b3c4d5e6f7a8b9c0d1e";
    const KEY: &str = "secret-key";

    fn client(server: &MockServer) -> IssueClient {
        IssueClient::new(&server.url("/api/"), KEY).unwrap()
    }

    fn issue_json() -> serde_json::Value {
        json!({
            "id": ID,
            "project": "Safari",
            "category": "UI",
            "expectedResults": "Page loads",
            "actualResults": "Browser closes",
            "stepsToReproduce": "Open the page"
        })
    }

    #[test]
    fn test_api_key_required() {
        assert!(matches!(
            IssueClient::new("http://localhost/api/", ""),
            Err(ClientError::MissingSetting(_))
        ));
    }

    #[tokio::test]
    async fn test_get_issue_sends_api_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("/api/issues/{ID}"))
                    .header("authorization", KEY)
                    .header("accept", "application/json");
                then.status(200).json_body(issue_json());
            })
            .await;

        let issue = client(&server).get_issue(ID).await.unwrap();
        assert_eq!(issue.id.as_deref(), Some(ID));
        assert_eq!(issue.project.as_deref(), Some("Safari"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_issues() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/issues/");
                then.status(200).json_body(json!([issue_json(), issue_json()]));
            })
            .await;

        assert_eq!(client(&server).get_issues().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_query_issues_appends_query_string() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/issues/search")
                    .query_param("filter", "project eq 'Safari'");
                then.status(200).json_body(json!([issue_json()]));
            })
            .await;

        let issues = client(&server)
            .query_issues("?filter=project%20eq%20'Safari'")
            .await
            .unwrap();
        assert_eq!(issues.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_metrics() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/metrics/Safari");
                then.status(200)
                    .json_body(json!({"dailyNewCount": 2, "lifelongTotal": 9}));
            })
            .await;

        let kpi = client(&server).get_metrics("Safari").await.unwrap();
        assert_eq!(kpi.daily_new_count, 2);
        assert_eq!(kpi.lifelong_total, 9);
        assert!(kpi.monthly_chart_x_labels.is_empty());
    }

    #[tokio::test]
    async fn test_not_found_returns_remote_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(format!("/api/issues/{ID}"));
                then.status(404).json_body(json!({
                    "error": "not_found",
                    "code": "NOT_FOUND",
                    "message": format!("Resource: {ID} was not found")
                }));
            })
            .await;

        let error = client(&server).get_issue(ID).await.unwrap_err();
        assert_eq!(error.category, ErrorCategory::NotFound);
        assert_eq!(error.message, format!("Resource: {ID} was not found"));
    }

    #[tokio::test]
    async fn test_internal_error_hides_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/issues/");
                then.status(500).body("database exploded");
            })
            .await;

        let error = client(&server).get_issues().await.unwrap_err();
        assert_eq!(error.category, ErrorCategory::InternalError);
        assert_eq!(error.message, INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_undecodable_success_is_unknown() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/issues/");
                then.status(200)
                    .header("content-type", "application/json")
                    .body("not json");
            })
            .await;

        let error = client(&server).get_issues().await.unwrap_err();
        assert_eq!(error, RepositoryError::unknown());
    }

    #[tokio::test]
    async fn test_write_messages() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/issues/")
                    .header("content-type", "application/json");
                then.status(200).json_body(json!("Resource: x submitted successfully"));
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(PUT).path(format!("/api/issues/{ID}"));
                then.status(200).json_body(json!("ok"));
            })
            .await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path(format!("/api/issues/{ID}"));
                then.status(200).json_body(json!("ok"));
            })
            .await;

        let client = client(&server);
        let issue: Issue = serde_json::from_value(issue_json()).unwrap();
        assert_eq!(
            client.create_issue(&issue).await.unwrap(),
            ISSUE_SUBMITTED_MESSAGE
        );
        assert_eq!(
            client.update_issue(&issue).await.unwrap(),
            ISSUE_UPDATED_MESSAGE
        );
        assert_eq!(client.delete_issue(ID).await.unwrap(), ISSUE_DELETED_MESSAGE);
        create.assert_async().await;
        update.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_ids_never_reach_the_server() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|_when, then| {
                then.status(200);
            })
            .await;

        let client = client(&server);
        let error = client.get_issue("").await.unwrap_err();
        assert_eq!(error.category, ErrorCategory::BadRequest);
        assert_eq!(error.message, INVALID_FIELD_MESSAGE);
        assert!(client.delete_issue("abc").await.is_err());
        assert!(client.update_issue(&Issue::default()).await.is_err());
        assert!(client.get_metrics("").await.is_err());
        any.assert_calls_async(0).await;
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = IssueClient::with_timeout(
            &format!("http://127.0.0.1:{port}/api/"),
            KEY,
            Duration::from_secs(2),
        )
        .unwrap();

        let error = client.get_issues().await.unwrap_err();
        assert_eq!(error.category, ErrorCategory::ServiceUnavailable);
        assert_eq!(error.message, API_UNRESPONSIVE_MESSAGE);
    }
}
