//! Store backend over the remote REST API.

use presto_core::{Backend, Error, Result, Revision, Snapshot, Store, StoreDocument};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ETAG, IF_MATCH};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

/// Timeout applied to every request unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the whole-store endpoint, relative to the API base URL.
const STORE_PATH: &str = "store";

/// Connection settings for the API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:5005`.
    pub base_url: String,
    /// Bearer token from login/register.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ApiConfig {
    /// Settings for `base_url` with no token and the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub(crate) fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Backend(format!("Failed to build HTTP client: {}", e)))
    }

    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[derive(Serialize)]
struct StoreBody<'a> {
    store: &'a Store,
}

/// Build a readable message from an error response.
///
/// The API answers failures with `{"error": "..."}`; anything else falls back
/// to the status line.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|s| !s.is_empty());

    match detail {
        Some(detail) => format!("{} ({})", detail, status),
        None => format!("Request failed with status {}", status),
    }
}

/// Turn a non-success response into a backend error.
pub(crate) fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(Error::Backend(error_message(status, &body)))
}

pub(crate) fn transport_error(e: reqwest::Error) -> Error {
    Error::Backend(format!("Request failed: {}", e))
}

fn revision_of(response: &Response) -> Revision {
    response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(Revision::new)
        .unwrap_or_default()
}

/// Backend reading and writing the whole store through `GET`/`PUT /store`.
///
/// Revisions travel as `ETag`/`If-Match`. When the server does not send an
/// ETag every write is unconditional.
pub struct HttpBackend {
    config: ApiConfig,
    client: Client,
}

impl HttpBackend {
    /// Create a backend for the given API settings.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

impl Backend for HttpBackend {
    fn fetch(&self) -> Result<Snapshot> {
        let url = self.config.url(STORE_PATH);
        log::debug!("GET {}", url);

        let response = self
            .config
            .authorize(self.client.get(&url))
            .send()
            .map_err(transport_error)?;
        let response = check_status(response)?;

        let revision = revision_of(&response);
        let document: StoreDocument = response
            .json()
            .map_err(|e| Error::Backend(format!("Invalid store response: {}", e)))?;

        Ok(Snapshot {
            store: document.store,
            revision,
        })
    }

    fn replace(&self, store: &Store, base: &Revision) -> Result<Revision> {
        let url = self.config.url(STORE_PATH);
        log::debug!("PUT {} ({} presentations)", url, store.len());

        let mut request = self
            .config
            .authorize(self.client.put(&url))
            .json(&StoreBody { store });
        if let Some(tag) = base.as_str() {
            request = request.header(IF_MATCH, tag);
        }

        let response = request.send().map_err(transport_error)?;

        if response.status() == StatusCode::PRECONDITION_FAILED {
            return Err(Error::Conflict {
                expected: base.to_string(),
                found: revision_of(&response).to_string(),
            });
        }

        let response = check_status(response)?;
        Ok(revision_of(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    #[test]
    fn test_url_joining() {
        let config = ApiConfig::new("http://localhost:5005/");
        assert_eq!(config.url("store"), "http://localhost:5005/store");
        assert_eq!(
            config.url("/admin/auth/login"),
            "http://localhost:5005/admin/auth/login"
        );
    }

    #[test]
    fn test_config_builders() {
        let config = ApiConfig::new("http://api")
            .with_token("abc")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(ApiConfig::new("http://api").timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_error_message_uses_api_error_field() {
        let message = error_message(StatusCode::BAD_REQUEST, r#"{"error": "Invalid token"}"#);
        assert!(message.starts_with("Invalid token"));
        assert!(message.contains("400"));
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let message = error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert!(message.contains("500"));

        let message = error_message(StatusCode::FORBIDDEN, r#"{"error": ""}"#);
        assert!(message.contains("403"));
    }

    #[test]
    fn test_store_body_shape() {
        let store = Store::new();
        let value = serde_json::to_value(StoreBody { store: &store }).unwrap();
        assert_eq!(value, serde_json::json!({"store": {"presentations": []}}));
    }

    #[test]
    fn test_backend_construction() {
        let backend = HttpBackend::new(ApiConfig::new("http://localhost:5005")).unwrap();
        assert_eq!(backend.config().base_url, "http://localhost:5005");
    }

    /// Serve one canned response per connection and hand back the raw
    /// requests, lowercased, once all responses are sent.
    fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for response in responses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);

                let mut head = String::new();
                let mut content_length = 0;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        }
                    }
                    head.push_str(&line);
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                }
                let mut body = vec![0; content_length];
                reader.read_exact(&mut body).unwrap();
                let body = String::from_utf8(body).unwrap();
                requests.push(format!("{}{}", head, body).to_lowercase());

                let mut stream = reader.into_inner();
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            requests
        });

        (base_url, handle)
    }

    fn response(status: &str, etag: Option<&str>, body: &str) -> String {
        let etag = etag
            .map(|tag| format!("ETag: {}\r\n", tag))
            .unwrap_or_default();
        format!(
            "HTTP/1.1 {}\r\n{}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            etag,
            body.len(),
            body
        )
    }

    const STORE_RESPONSE: &str =
        r#"{"store": {"presentations": [{"id": "p1", "name": "Deck", "slides": [{"id": "s1"}]}]}}"#;

    #[test]
    fn test_revision_travels_as_etag_and_if_match() {
        let (base_url, server) = serve(vec![
            response("200 OK", Some("\"v1\""), STORE_RESPONSE),
            response("200 OK", Some("\"v2\""), "{}"),
        ]);
        let backend = HttpBackend::new(ApiConfig::new(base_url).with_token("tok")).unwrap();

        let snapshot = backend.fetch().unwrap();
        assert_eq!(snapshot.revision, Revision::new("\"v1\""));
        assert_eq!(snapshot.store.presentations[0].name, "Deck");
        assert_eq!(snapshot.store.presentations[0].slides[0].font_family, "Arial");

        let revision = backend.replace(&snapshot.store, &snapshot.revision).unwrap();
        assert_eq!(revision, Revision::new("\"v2\""));

        let requests = server.join().unwrap();
        assert!(requests[0].starts_with("get /store "));
        assert!(requests[0].contains("authorization: bearer tok"));
        assert!(requests[1].starts_with("put /store "));
        assert!(requests[1].contains("if-match: \"v1\""));
        assert!(requests[1].contains(r#"{"store":{"presentations":[{"id":"p1""#));
    }

    #[test]
    fn test_precondition_failed_is_conflict() {
        let (base_url, server) = serve(vec![response(
            "412 Precondition Failed",
            Some("\"v7\""),
            r#"{"error": "stale"}"#,
        )]);
        let backend = HttpBackend::new(ApiConfig::new(base_url)).unwrap();

        let result = backend.replace(&Store::new(), &Revision::new("\"v1\""));
        match result {
            Err(Error::Conflict { expected, found }) => {
                assert_eq!(expected, "\"v1\"");
                assert_eq!(found, "\"v7\"");
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_writes_are_unconditional_without_etag() {
        let (base_url, server) = serve(vec![
            response("200 OK", None, STORE_RESPONSE),
            response("200 OK", None, "{}"),
        ]);
        let backend = HttpBackend::new(ApiConfig::new(base_url)).unwrap();

        let snapshot = backend.fetch().unwrap();
        assert_eq!(snapshot.revision, Revision::unknown());

        let revision = backend.replace(&snapshot.store, &snapshot.revision).unwrap();
        assert_eq!(revision, Revision::unknown());

        let requests = server.join().unwrap();
        assert!(!requests[0].contains("authorization:"));
        assert!(!requests[1].contains("if-match:"));
    }

    #[test]
    fn test_api_error_body_becomes_backend_error() {
        let (base_url, server) = serve(vec![response(
            "403 Forbidden",
            None,
            r#"{"error": "Invalid token"}"#,
        )]);
        let backend = HttpBackend::new(ApiConfig::new(base_url)).unwrap();

        match backend.fetch() {
            Err(Error::Backend(message)) => assert!(message.starts_with("Invalid token")),
            other => panic!("expected backend error, got {:?}", other.map(|s| s.store)),
        }
        server.join().unwrap();
    }
}
