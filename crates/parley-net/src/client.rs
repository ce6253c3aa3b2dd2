//! Credentialed JSON request wrapper.
//!
//! Every call carries the session cookie jar. Any failure is turned into a
//! human-readable message, published on the [`ErrorSignal`] (unless the
//! caller asked for a quiet request) and returned to the caller. There is
//! no retry and no backoff.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{cookie::Jar, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::signal::ErrorSignal;

/// Whether a failed request is announced on the error signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announce {
    Yes,
    Quiet,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    signal: ErrorSignal,
}

impl ApiClient {
    /// Build a client for `base_url`.
    ///
    /// `session_cookie` (`name=value`) is seeded into the cookie jar so an
    /// existing backend session can be reused; cookies set by the backend
    /// (e.g. after `/create/users`) are kept for the life of the client.
    pub fn new(
        base_url: &str,
        session_cookie: Option<&str>,
        timeout: Duration,
        signal: ErrorSignal,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|e| ApiError::Url(format!("{base_url}: {e}")))?;

        let jar = Jar::default();
        if let Some(cookie) = session_cookie {
            jar.add_cookie_str(cookie, &parsed);
        }

        let http = reqwest::Client::builder()
            .cookie_provider(Arc::new(jar))
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            signal,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn signal(&self) -> &ErrorSignal {
        &self.signal
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, announce: Announce) -> Result<T, ApiError> {
        self.request(Method::GET, path, None, announce).await
    }

    /// POST with a JSON content type but no body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::POST, path, None, Announce::Yes).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = match serde_json::to_value(body) {
            Ok(v) => v,
            Err(e) => return Err(self.fail(ApiError::Decode(e.to_string()), path, Announce::Yes)),
        };
        self.request(Method::POST, path, Some(body), Announce::Yes).await
    }

    /// Issue one request and decode the JSON reply.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        announce: Announce,
    ) -> Result<T, ApiError> {
        match self.execute(method.clone(), path, body).await {
            Ok(value) => {
                debug!(method = %method, path, "Request succeeded");
                Ok(value)
            }
            Err(e) => Err(self.fail(e, path, announce)),
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            req = req.json(&body);
        } else if method == Method::POST {
            req = req.body(Vec::new());
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: extract_error_message(status, &text),
            });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn fail(&self, error: ApiError, path: &str, announce: Announce) -> ApiError {
        warn!(path, error = %error, quiet = (announce == Announce::Quiet), "Request failed");
        if announce == Announce::Yes {
            self.signal.set_error(error.user_message());
        }
        error
    }
}

/// Pull a human-readable message out of a non-2xx body.
///
/// JSON `detail` string wins; any other `detail` value or a JSON body
/// without one is shown as JSON text; a non-JSON body is shown verbatim; an
/// empty body falls back to the status reason phrase.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    let message = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => match json.get("detail").filter(|d| is_truthy(d)) {
            Some(serde_json::Value::String(detail)) => detail.clone(),
            Some(detail) => detail.to_string(),
            None => json.to_string(),
        },
        Err(_) => body.to_string(),
    };

    if message.trim().is_empty() {
        status.canonical_reason().unwrap_or_default().to_string()
    } else {
        message
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn_stub() -> String {
        let app = Router::new()
            .route("/ok", get(|| async { Json(json!({ "server": "ok" })) }))
            .route(
                "/detail",
                post(|| async {
                    (
                        AxumStatus::BAD_REQUEST,
                        Json(json!({ "detail": "Dialog limit reached" })),
                    )
                }),
            )
            .route(
                "/no-detail",
                get(|| async { (AxumStatus::CONFLICT, Json(json!({ "reason": "taken" }))) }),
            )
            .route(
                "/plain",
                get(|| async { (AxumStatus::BAD_GATEWAY, "upstream exploded") }),
            )
            .route("/empty", get(|| async { AxumStatus::NOT_FOUND }))
            .route("/garbage", get(|| async { "not json" }))
            .route(
                "/cookie",
                get(|headers: HeaderMap| async move {
                    let cookie = headers
                        .get("cookie")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    Json(json!({ "cookie": cookie }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base: &str, cookie: Option<&str>) -> (ApiClient, ErrorSignal) {
        let signal = ErrorSignal::new();
        let client = ApiClient::new(base, cookie, Duration::from_secs(5), signal.clone()).unwrap();
        (client, signal)
    }

    #[test]
    fn test_extract_error_message() {
        let s = StatusCode::BAD_REQUEST;
        assert_eq!(extract_error_message(s, r#"{"detail":"nope"}"#), "nope");
        assert_eq!(
            extract_error_message(s, r#"{"detail":[{"msg":"bad"}]}"#),
            r#"[{"msg":"bad"}]"#
        );
        assert_eq!(extract_error_message(s, r#"{"error":"x"}"#), r#"{"error":"x"}"#);
        assert_eq!(extract_error_message(s, r#"{"detail":""}"#), r#"{"detail":""}"#);
        assert_eq!(extract_error_message(s, "plain text"), "plain text");
        assert_eq!(extract_error_message(s, ""), "Bad Request");
    }

    #[tokio::test]
    async fn test_success_decodes_body() {
        let base = spawn_stub().await;
        let (client, signal) = client(&base, None);

        let body: Value = client.get("/ok", Announce::Yes).await.unwrap();
        assert_eq!(body, json!({ "server": "ok" }));
        assert_eq!(signal.current(), None);
    }

    #[tokio::test]
    async fn test_detail_is_published() {
        let base = spawn_stub().await;
        let (client, signal) = client(&base, None);

        let err = client.post_empty::<Value>("/detail").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(signal.current().as_deref(), Some("Dialog limit reached"));
    }

    #[tokio::test]
    async fn test_fallbacks_without_detail() {
        let base = spawn_stub().await;
        let (client, signal) = client(&base, None);

        let _ = client.get::<Value>("/no-detail", Announce::Yes).await.unwrap_err();
        assert_eq!(signal.current().as_deref(), Some(r#"{"reason":"taken"}"#));

        let _ = client.get::<Value>("/plain", Announce::Yes).await.unwrap_err();
        assert_eq!(signal.current().as_deref(), Some("upstream exploded"));

        let _ = client.get::<Value>("/empty", Announce::Yes).await.unwrap_err();
        assert_eq!(signal.current().as_deref(), Some("Not Found"));
    }

    #[tokio::test]
    async fn test_undecodable_success_uses_generic_message() {
        let base = spawn_stub().await;
        let (client, signal) = client(&base, None);

        let err = client.get::<Value>("/garbage", Announce::Yes).await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(
            signal.current().as_deref(),
            Some(parley_shared::constants::GENERIC_REQUEST_ERROR)
        );
    }

    #[tokio::test]
    async fn test_quiet_request_does_not_publish() {
        let base = spawn_stub().await;
        let (client, signal) = client(&base, None);

        let err = client.get::<Value>("/plain", Announce::Quiet).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(signal.current(), None);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (client, signal) = client(&format!("http://{addr}"), None);
        let err = client.get::<Value>("/ok", Announce::Yes).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(
            signal.current().as_deref(),
            Some(parley_shared::constants::GENERIC_REQUEST_ERROR)
        );
    }

    #[tokio::test]
    async fn test_session_cookie_is_sent() {
        let base = spawn_stub().await;
        let (client, _signal) = client(&base, Some("session=abc123"));

        let body: Value = client.get("/cookie", Announce::Yes).await.unwrap();
        assert_eq!(body["cookie"], "session=abc123");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let signal = ErrorSignal::new();
        let err = ApiClient::new("not a url", None, Duration::from_secs(1), signal).unwrap_err();
        assert!(matches!(err, ApiError::Url(_)));
    }
}
