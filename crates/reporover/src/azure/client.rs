//! Azure DevOps API client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use url::Url;

use super::types::{AzureRepository, ListResponse};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpRequest, HttpTransport};
use crate::model::{Repository, RepositorySummary};
use crate::settings::SourceCredentials;
use crate::source::{RepositorySource, Result, SourceError};

/// Azure DevOps Services host.
pub const DEFAULT_HOST: &str = "https://dev.azure.com";

/// REST API version sent with every request.
pub const API_VERSION: &str = "7.1-preview.1";

/// Default per-request timeout.
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Azure DevOps Git API client.
///
/// Holds only the host and the transport; organization, project, and the
/// personal access token are passed per call.
#[derive(Clone)]
pub struct AzureDevOpsClient {
    transport: Arc<dyn HttpTransport>,
    base_url: Url,
}

impl AzureDevOpsClient {
    /// Create a client for `host` backed by reqwest.
    ///
    /// An empty `host` means [`DEFAULT_HOST`]. Self-hosted collections can be
    /// given with their path, e.g. `https://tfs.example.com/tfs/DefaultCollection`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = AzureDevOpsClient::new("")?;
    /// let repos = client.list_repositories(&credentials).await?;
    /// ```
    pub fn new(host: &str) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| SourceError::transport(e.to_string()))?;
        Self::new_with_transport(host, Arc::new(transport))
    }

    /// Create a client over an arbitrary transport.
    pub fn new_with_transport(host: &str, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        let host = host.trim();
        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        let base_url = Url::parse(host)
            .map_err(|e| SourceError::transport(format!("invalid host URL {host:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::transport(format!(
                "host URL {host:?} cannot carry a path"
            )));
        }

        Ok(Self {
            transport,
            base_url,
        })
    }

    /// `<host>/<org>/<project>/_apis/git/repositories[/<id>]?api-version=...`
    fn repositories_url(
        &self,
        credentials: &SourceCredentials,
        repository_id: Option<&str>,
    ) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| SourceError::transport("host URL cannot carry a path"))?;
            segments
                .pop_if_empty()
                .extend([
                    credentials.organization.as_str(),
                    credentials.project.as_str(),
                    "_apis",
                    "git",
                    "repositories",
                ])
                .extend(repository_id);
        }
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    /// Make an authenticated GET request and decode the JSON body.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url, token: &str) -> Result<T> {
        let request = HttpRequest::get(url.as_str())
            .with_header("Accept", "application/json")
            .with_header("User-Agent", "reporover")
            .with_header("Authorization", basic_auth(token));

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| SourceError::transport(e.to_string()))?;

        // Azure answers a rejected PAT with 203 and an HTML sign-in page.
        if response.status == 203 {
            return Err(SourceError::Auth {
                status: response.status,
                message: "credential rejected (sign-in page returned)".to_string(),
            });
        }
        if !response.is_success() {
            return Err(SourceError::from_status(
                response.status,
                reason_phrase(response.status),
                &response.body,
            ));
        }

        serde_json::from_slice(&response.body).map_err(|e| SourceError::decode(e.to_string()))
    }
}

/// `Basic base64(":" + pat)`: Azure ignores the user name.
fn basic_auth(token: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!(":{token}"));
    format!("Basic {encoded}")
}

/// Canonical status text, e.g. `Not Found` for 404.
fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown Status")
}

#[async_trait]
impl RepositorySource for AzureDevOpsClient {
    fn source_name(&self) -> &'static str {
        "azure"
    }

    async fn list_repositories(
        &self,
        credentials: &SourceCredentials,
    ) -> Result<Vec<RepositorySummary>> {
        let url = self.repositories_url(credentials, None)?;
        tracing::debug!(
            organization = %credentials.organization,
            project = %credentials.project,
            "Listing repositories"
        );

        let list: ListResponse<AzureRepository> = self.get(url, &credentials.token).await?;
        Ok(list
            .value
            .into_iter()
            .map(AzureRepository::into_summary)
            .collect())
    }

    async fn fetch_repository_detail(
        &self,
        credentials: &SourceCredentials,
        repository_id: &str,
    ) -> Result<Repository> {
        let url = self.repositories_url(credentials, Some(repository_id))?;
        let raw: AzureRepository = self.get(url, &credentials.token).await?;
        Ok(raw.into_repository(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::http::CannedTransport;

    const LIST_URL: &str =
        "https://dev.azure.com/acme/web/_apis/git/repositories?api-version=7.1-preview.1";

    fn detail_url(id: &str) -> String {
        format!("https://dev.azure.com/acme/web/_apis/git/repositories/{id}?api-version=7.1-preview.1")
    }

    fn credentials() -> SourceCredentials {
        SourceCredentials {
            organization: "acme".to_string(),
            project: "web".to_string(),
            token: "secret".to_string(),
        }
    }

    fn client(transport: &CannedTransport) -> AzureDevOpsClient {
        AzureDevOpsClient::new_with_transport("", Arc::new(transport.clone()))
            .expect("default host should parse")
    }

    fn repo_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "name": format!("repo-{id}"),
            "url": format!("https://dev.azure.com/acme/web/_apis/git/repositories/{id}"),
            "defaultBranch": "refs/heads/main",
            "remoteUrl": format!("https://acme@dev.azure.com/acme/web/_git/repo-{id}"),
            "size": 1024,
            "isDisabled": false
        })
    }

    #[test]
    fn basic_auth_uses_empty_user_name() {
        // base64(":secret")
        assert_eq!(basic_auth("secret"), "Basic OnNlY3JldA==");
    }

    #[test]
    fn repositories_url_encodes_path_segments() {
        let transport = CannedTransport::default();
        let client = client(&transport);
        let mut creds = credentials();
        creds.project = "Web Team".to_string();

        let url = client.repositories_url(&creds, Some("r/1")).unwrap();

        assert_eq!(
            url.as_str(),
            "https://dev.azure.com/acme/Web%20Team/_apis/git/repositories/r%2F1?api-version=7.1-preview.1"
        );
    }

    #[test]
    fn self_hosted_collection_path_is_preserved() {
        let client = AzureDevOpsClient::new_with_transport(
            "https://tfs.example.com/tfs/DefaultCollection/",
            Arc::new(CannedTransport::default()),
        )
        .unwrap();

        let url = client.repositories_url(&credentials(), None).unwrap();

        assert_eq!(
            url.as_str(),
            "https://tfs.example.com/tfs/DefaultCollection/acme/web/_apis/git/repositories?api-version=7.1-preview.1"
        );
    }

    #[test]
    fn invalid_host_is_rejected() {
        let err = AzureDevOpsClient::new_with_transport("not a url", Arc::new(CannedTransport::default()))
            .err()
            .expect("invalid host");
        assert!(matches!(err, SourceError::Transport { .. }));
    }

    #[tokio::test]
    async fn list_repositories_decodes_value_envelope() {
        let transport = CannedTransport::default();
        let body = serde_json::json!({ "count": 2, "value": [repo_json("a"), repo_json("b")] });
        transport.respond(LIST_URL, 200, body.to_string());

        let repos = client(&transport)
            .list_repositories(&credentials())
            .await
            .expect("list should succeed");

        assert_eq!(
            repos,
            vec![
                RepositorySummary::new("a", "repo-a"),
                RepositorySummary::new("b", "repo-b")
            ]
        );

        let requests = transport.sent();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("authorization"), Some("Basic OnNlY3JldA=="));
        assert_eq!(requests[0].header("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn fetch_detail_stamps_local_enrichment_time() {
        let transport = CannedTransport::default();
        let mut body = repo_json("a");
        body["languages"] = serde_json::json!({ "Rust": 4096, "Shell": 12 });
        transport.respond(detail_url("a"), 200, body.to_string());

        let before = Utc::now();
        let repo = client(&transport)
            .fetch_repository_detail(&credentials(), "a")
            .await
            .expect("detail should succeed");
        let after = Utc::now();

        assert_eq!(repo.id, "a");
        assert_eq!(repo.default_branch, "main");
        assert_eq!(repo.remote_url, "https://acme@dev.azure.com/acme/web/_git/repo-a");
        assert!(repo.last_updated >= before && repo.last_updated <= after);
        let languages = repo.languages.expect("languages decoded");
        assert_eq!(languages.get("Rust"), Some(&4096));
    }

    #[tokio::test]
    async fn unauthorized_maps_to_auth_error() {
        let transport = CannedTransport::default();
        transport.respond(LIST_URL, 401, "TF400813");

        let err = client(&transport)
            .list_repositories(&credentials())
            .await
            .expect_err("401 should fail");

        assert!(err.is_auth(), "{err:?}");
    }

    #[tokio::test]
    async fn sign_in_page_maps_to_auth_error() {
        let transport = CannedTransport::default();
        transport.respond(LIST_URL, 203, "<html>Sign In</html>");

        let err = client(&transport)
            .list_repositories(&credentials())
            .await
            .expect_err("203 should fail");

        assert!(matches!(err, SourceError::Auth { status: 203, .. }), "{err:?}");
    }

    #[tokio::test]
    async fn error_status_maps_to_remote_error_with_reason_and_body() {
        let transport = CannedTransport::default();
        transport.respond(detail_url("x"), 404, "repository not found");

        let err = client(&transport)
            .fetch_repository_detail(&credentials(), "x")
            .await
            .expect_err("404 should fail");

        assert_eq!(
            err,
            SourceError::Remote {
                status: 404,
                reason: "Not Found".to_string(),
                message: "repository not found".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "Remote error (HTTP 404 Not Found): repository not found"
        );
    }

    #[tokio::test]
    async fn transport_failure_maps_to_transport_error() {
        let transport = CannedTransport::default();
        transport.fail(LIST_URL, "dns error");

        let err = client(&transport)
            .list_repositories(&credentials())
            .await
            .expect_err("transport should fail");

        assert!(matches!(err, SourceError::Transport { message } if message.contains("dns error")));
    }

    #[test]
    fn reason_phrase_covers_unregistered_codes() {
        assert_eq!(reason_phrase(503), "Service Unavailable");
        assert_eq!(reason_phrase(599), "Unknown Status");
    }

    #[tokio::test]
    async fn unexpected_shape_maps_to_decode_error() {
        let transport = CannedTransport::default();
        transport.respond(LIST_URL, 200, r#"{"items": []}"#);

        let err = client(&transport)
            .list_repositories(&credentials())
            .await
            .expect_err("missing value field");

        assert!(matches!(err, SourceError::Decode { .. }), "{err:?}");
    }
}
