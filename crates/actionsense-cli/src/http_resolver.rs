//! HTTP-backed semantic resolver.
//!
//! POSTs `{ "input": ..., "actions": [...] }` to a configured endpoint and
//! accepts either a bare JSON array of action IDs or `{ "ids": [...] }`.
//! Non-2xx responses and malformed bodies are reported as
//! [`ActionError::SemanticFailed`], which the engine absorbs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use actionsense_core::{ActionDefinition, ActionError, Result, SemanticResolver};

/// Maximum response body accepted from the resolver (256 KB).
const MAX_BODY_BYTES: usize = 256 * 1024;

#[derive(Serialize)]
struct ResolveRequest<'a> {
    input: &'a str,
    actions: &'a [ActionDefinition],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ResolveResponse {
    Ids(Vec<String>),
    Wrapped { ids: Vec<String> },
}

impl ResolveResponse {
    fn into_ids(self) -> Vec<String> {
        match self {
            Self::Ids(ids) | Self::Wrapped { ids } => ids,
        }
    }
}

/// Semantic resolver that delegates to a remote HTTP service.
pub struct HttpResolver {
    client: reqwest::Client,
    endpoint: Url,
    bearer_token: Option<String>,
}

impl HttpResolver {
    /// Create a resolver for `endpoint`.  Only `http` and `https` are allowed.
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| ActionError::Config {
            reason: format!("invalid semantic endpoint `{endpoint}`: {e}"),
        })?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ActionError::Config {
                reason: format!(
                    "semantic endpoint must use http or https, got `{}`",
                    endpoint.scheme()
                ),
            });
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("actionsense/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Ok(Self {
            client,
            endpoint,
            bearer_token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SemanticResolver for HttpResolver {
    async fn resolve(&self, input: &str, actions: &[ActionDefinition]) -> Result<Vec<String>> {
        let failed = |reason: String| ActionError::SemanticFailed { reason };

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&ResolveRequest { input, actions });
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        debug!(endpoint = %self.endpoint, candidates = actions.len(), "calling semantic resolver");

        let response = request
            .send()
            .await
            .map_err(|e| failed(format!("request to `{}` failed: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("resolver returned HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| failed(format!("failed to read resolver response: {e}")))?;
        if body.len() > MAX_BODY_BYTES {
            return Err(failed(format!(
                "resolver response too large ({} bytes)",
                body.len()
            )));
        }

        parse_response(&body)
    }
}

fn parse_response(body: &[u8]) -> Result<Vec<String>> {
    serde_json::from_slice::<ResolveResponse>(body)
        .map(ResolveResponse::into_ids)
        .map_err(|e| ActionError::SemanticFailed {
            reason: format!("malformed resolver response: {e}"),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response and return the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/resolve", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (url, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    #[test]
    fn parse_bare_array() {
        assert_eq!(parse_response(br#"["a","b"]"#).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn parse_wrapped_object() {
        assert_eq!(parse_response(br#"{"ids":["debug"]}"#).unwrap(), vec!["debug"]);
    }

    #[test]
    fn parse_malformed_is_semantic_failure() {
        let err = parse_response(b"not json").unwrap_err();
        assert!(matches!(err, ActionError::SemanticFailed { .. }));
    }

    #[test]
    fn rejects_non_http_endpoint() {
        assert!(matches!(
            HttpResolver::new("ftp://example.com/resolve"),
            Err(ActionError::Config { .. })
        ));
        assert!(HttpResolver::new("not a url").is_err());
    }

    #[tokio::test]
    async fn posts_input_and_candidates() {
        let (url, server) = serve_once("200 OK", r#"{"ids":["debug"]}"#).await;
        let resolver = HttpResolver::new(&url).unwrap().with_bearer_token("secret");

        let actions = vec![ActionDefinition::new("debug", "Debug", "").with_keywords(["error"])];
        let ids = resolver.resolve("why is this failing", &actions).await.unwrap();
        assert_eq!(ids, vec!["debug"]);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /resolve"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(request.contains(r#""input":"why is this failing""#));
        assert!(request.contains(r#""id":"debug""#));
    }

    #[tokio::test]
    async fn non_success_status_is_semantic_failure() {
        let (url, server) = serve_once("503 Service Unavailable", "[]").await;
        let resolver = HttpResolver::new(&url).unwrap();

        let result = resolver.resolve("anything", &[]).await;
        match result {
            Err(ActionError::SemanticFailed { reason }) => assert!(reason.contains("503")),
            other => panic!("expected SemanticFailed, got {other:?}"),
        }
        server.await.unwrap();
    }
}
