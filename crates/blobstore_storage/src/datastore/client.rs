//! Datastore transport.
//!
//! The store talks to Datastore through the [`DatastoreClient`] trait so the
//! HTTP client can be swapped for the in-memory emulator in tests.

use super::types::{CommitRequest, CommitResponse, RunQueryRequest, RunQueryResponse};
use crate::config::StoreSettings;
use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// The two Datastore calls the store needs.
pub trait DatastoreClient: Send + Sync {
    /// Runs a query in `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Remote`] if the call fails.
    fn run_query(&self, project_id: &str, request: &RunQueryRequest)
        -> StoreResult<RunQueryResponse>;

    /// Commits mutations in `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Remote`] if the call fails or a mutation is
    /// rejected.
    fn commit(&self, project_id: &str, request: &CommitRequest) -> StoreResult<CommitResponse>;
}

impl<C: DatastoreClient + ?Sized> DatastoreClient for Arc<C> {
    fn run_query(
        &self,
        project_id: &str,
        request: &RunQueryRequest,
    ) -> StoreResult<RunQueryResponse> {
        (**self).run_query(project_id, request)
    }

    fn commit(&self, project_id: &str, request: &CommitRequest) -> StoreResult<CommitResponse> {
        (**self).commit(project_id, request)
    }
}

/// Blocking HTTP client for the Datastore v1 REST API.
///
/// Requests are `POST {endpoint}/projects/{projectId}:{method}` with JSON
/// bodies. Nothing is retried; the request timeout is the only limit.
#[derive(Debug, Clone)]
pub struct HttpDatastoreClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl HttpDatastoreClient {
    /// Creates a client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        access_token: Option<String>,
        timeout: Duration,
    ) -> StoreResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(format!("blobstore/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Config(format!("unable to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Creates a client from store settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn from_settings(settings: &StoreSettings) -> StoreResult<Self> {
        Self::new(
            settings.datastore_endpoint.clone(),
            settings.access_token.clone(),
            settings.request_timeout,
        )
    }

    /// Returns the REST endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn method_url(&self, project_id: &str, method: &str) -> String {
        format!("{}/projects/{}:{}", self.endpoint, project_id, method)
    }

    fn post<Req, Res>(&self, operation: &'static str, url: &str, body: &Req) -> StoreResult<Res>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| StoreError::remote(operation, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StoreError::remote(operation, format!("{status}: {body}")));
        }

        response
            .json()
            .map_err(|e| StoreError::remote(operation, format!("invalid response: {e}")))
    }
}

impl DatastoreClient for HttpDatastoreClient {
    fn run_query(
        &self,
        project_id: &str,
        request: &RunQueryRequest,
    ) -> StoreResult<RunQueryResponse> {
        let url = self.method_url(project_id, "runQuery");
        self.post("run query", &url, request)
    }

    fn commit(&self, project_id: &str, request: &CommitRequest) -> StoreResult<CommitResponse> {
        let url = self.method_url(project_id, "commit");
        self.post("commit", &url, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::types::{Key, Mutation, Query};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Accepts one connection, answers it, and returns the raw request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= header_end + 4 + content_length
    }

    #[test]
    fn trims_trailing_slash() {
        let client =
            HttpDatastoreClient::new("http://localhost:8081/v1/", None, Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8081/v1");
        assert_eq!(
            client.method_url("p", "commit"),
            "http://localhost:8081/v1/projects/p:commit"
        );
    }

    #[test]
    fn run_query_posts_json() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"batch":{"entityResults":[],"moreResults":"NO_MORE_RESULTS"}}"#,
        );
        let client =
            HttpDatastoreClient::new(url, Some("secret".into()), Duration::from_secs(5)).unwrap();

        let request = RunQueryRequest {
            partition_id: Key::named("proj", "kind", "a").partition_id,
            query: Query::kind("kind"),
        };
        let response = client.run_query("proj", &request).unwrap();
        assert!(response.batch.entity_results.is_empty());

        let raw = server.join().unwrap();
        assert!(raw.starts_with("POST /v1/projects/proj:runQuery HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(raw.contains(r#""kind":[{"name":"kind"}]"#));
    }

    #[test]
    fn error_status_is_remote_error() {
        let (url, server) = serve_once(
            "409 Conflict",
            r#"{"error":{"code":409,"status":"ALREADY_EXISTS"}}"#,
        );
        let client = HttpDatastoreClient::new(url, None, Duration::from_secs(5)).unwrap();

        let request = CommitRequest::single(Mutation::delete(Key::named("proj", "kind", "a")));
        let err = client.commit("proj", &request).unwrap_err();
        server.join().unwrap();

        match err {
            StoreError::Remote { operation, message } => {
                assert_eq!(operation, "commit");
                assert!(message.contains("409"));
                assert!(message.contains("ALREADY_EXISTS"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unreachable_endpoint_is_remote_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/v1", listener.local_addr().unwrap());
        drop(listener);

        let client = HttpDatastoreClient::new(url, None, Duration::from_secs(2)).unwrap();
        let request = CommitRequest::single(Mutation::delete(Key::named("p", "k", "a")));
        assert!(matches!(
            client.commit("p", &request),
            Err(StoreError::Remote { operation: "commit", .. })
        ));
    }
}
