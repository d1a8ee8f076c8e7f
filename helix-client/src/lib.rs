//! Private Helix REST client for twitch-sdk
//!
//! This crate provides the one capability every higher layer needs: issue an
//! authenticated HTTP call against the Helix API and get back parsed JSON or
//! a typed error. Endpoint knowledge lives in `twitch-api`; this crate only
//! knows about tokens, scopes, and status codes.

mod error;

pub use error::HelixError;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Default base URL of the Helix API
pub const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";

/// HTTP method of a Helix call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Description of a single Helix call
///
/// `url` is relative to the client's base URL (e.g. `eventsub/subscriptions`).
/// `scopes` lists the scopes of which at least one must be granted to the
/// selected token; `user_id` selects a user token instead of the app token.
#[derive(Debug, Clone)]
pub struct ApiCallOptions {
    pub method: HttpMethod,
    pub url: String,
    pub scopes: Vec<String>,
    pub user_id: Option<String>,
    pub query: Vec<(String, String)>,
    pub json_body: Option<Value>,
}

impl ApiCallOptions {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            scopes: Vec::new(),
            user_id: None,
            query: Vec::new(),
            json_body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.json_body = Some(body);
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Capability to perform authenticated Helix calls.
///
/// Returns `Ok(None)` for successful calls without a body (204 No Content).
/// Implementations must be `Send + Sync` so one caller can be shared by the
/// EventSub listener and every subscription it tracks.
#[async_trait]
pub trait HelixCaller: Send + Sync {
    async fn call_api(&self, options: ApiCallOptions) -> Result<Option<Value>, HelixError>;
}

/// A token together with the scopes it was granted
#[derive(Debug, Clone)]
struct GrantedToken {
    access_token: String,
    scopes: Option<Vec<String>>,
}

impl GrantedToken {
    /// `None` scopes means the grants are unknown; the API decides.
    fn check_scopes(&self, required: &[String], user_id: Option<&str>) -> Result<(), HelixError> {
        let Some(granted) = &self.scopes else {
            return Ok(());
        };
        if required.is_empty() || required.iter().any(|s| granted.contains(s)) {
            return Ok(());
        }
        Err(HelixError::MissingScope {
            scope: required.join(" or "),
            user_id: user_id.map(str::to_string),
        })
    }
}

/// Configuration for [`HelixClient`]
#[derive(Debug, Clone)]
pub struct HelixClientConfig {
    pub client_id: String,
    pub app_access_token: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl HelixClientConfig {
    pub fn new(client_id: impl Into<String>, app_access_token: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            app_access_token: app_access_token.into(),
            base_url: HELIX_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// reqwest-backed [`HelixCaller`]
///
/// Calls carry the app access token unless they name a user for which a
/// user token has been registered with [`HelixClient::with_user_token`].
#[derive(Debug, Clone)]
pub struct HelixClient {
    http: reqwest::Client,
    client_id: String,
    base_url: Url,
    app_token: GrantedToken,
    user_tokens: HashMap<String, GrantedToken>,
}

impl HelixClient {
    pub fn new(config: HelixClientConfig) -> Result<Self, HelixError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        // Trailing slash so relative joins keep the `/helix` segment.
        let base = format!("{}/", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            client_id: config.client_id,
            base_url: Url::parse(&base)?,
            app_token: GrantedToken {
                access_token: config.app_access_token,
                scopes: None,
            },
            user_tokens: HashMap::new(),
        })
    }

    /// Register a user access token with its granted scopes.
    pub fn with_user_token(
        mut self,
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        self.user_tokens.insert(
            user_id.into(),
            GrantedToken {
                access_token: access_token.into(),
                scopes: Some(scopes),
            },
        );
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn token_for(&self, user_id: Option<&str>) -> &GrantedToken {
        user_id
            .and_then(|id| self.user_tokens.get(id))
            .unwrap_or(&self.app_token)
    }

    fn build_url(&self, options: &ApiCallOptions) -> Result<Url, HelixError> {
        let mut url = self.base_url.join(options.url.trim_start_matches('/'))?;
        if !options.query.is_empty() {
            url.query_pairs_mut().extend_pairs(options.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl HelixCaller for HelixClient {
    async fn call_api(&self, options: ApiCallOptions) -> Result<Option<Value>, HelixError> {
        let token = self.token_for(options.user_id.as_deref());
        token.check_scopes(&options.scopes, options.user_id.as_deref())?;

        let url = self.build_url(&options)?;
        tracing::debug!(method = ?options.method, %url, user_id = ?options.user_id, "Helix call");

        let mut request = self
            .http
            .request(options.method.as_reqwest(), url.clone())
            .header("Client-Id", &self.client_id)
            .bearer_auth(&token.access_token);
        if let Some(body) = &options.json_body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            return Err(HelixError::Http {
                status: status.as_u16(),
                url: url.to_string(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&text)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard) -> HelixClient {
        HelixClient::new(HelixClientConfig::new("client-123", "app-token").with_base_url(server.url()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_call_returns_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users")
            .match_query(mockito::Matcher::UrlEncoded("id".into(), "42".into()))
            .match_header("client-id", "client-123")
            .match_header("authorization", "Bearer app-token")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"42"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client
            .call_api(ApiCallOptions::new(HttpMethod::Get, "users").with_query("id", "42"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, Some(json!({"data": [{"id": "42"}]})));
    }

    #[tokio::test]
    async fn test_no_content_returns_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/eventsub/subscriptions")
            .match_query(mockito::Matcher::Any)
            .with_status(204)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client
            .call_api(
                ApiCallOptions::new(HttpMethod::Delete, "eventsub/subscriptions")
                    .with_query("id", "abc"),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_typed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/eventsub/subscriptions")
            .with_status(409)
            .with_body(r#"{"error":"Conflict","status":409,"message":"subscription already exists"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .call_api(ApiCallOptions::new(HttpMethod::Post, "eventsub/subscriptions").with_json(json!({})))
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        match err {
            HelixError::Http { status, message, .. } => {
                assert_eq!(status, 409);
                assert_eq!(message, "subscription already exists");
            }
            other => panic!("Expected HelixError::Http, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_user_token_scope_check() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server).with_user_token(
            "1001",
            "user-token",
            vec!["moderator:read:followers".to_string()],
        );

        let err = client
            .call_api(
                ApiCallOptions::new(HttpMethod::Get, "moderation/banned")
                    .for_user("1001")
                    .with_scope("moderation:read"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HelixError::MissingScope { .. }));
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn test_user_token_is_selected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/channels/followers")
            .match_header("authorization", "Bearer user-token")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = client_for(&server).with_user_token(
            "1001",
            "user-token",
            vec!["moderator:read:followers".to_string()],
        );
        client
            .call_api(
                ApiCallOptions::new(HttpMethod::Get, "channels/followers")
                    .for_user("1001")
                    .with_scope("moderator:read:followers"),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[test]
    fn test_build_url_keeps_base_path() {
        let client = HelixClient::new(HelixClientConfig::new("id", "token")).unwrap();
        let url = client
            .build_url(&ApiCallOptions::new(HttpMethod::Get, "/eventsub/subscriptions").with_query("after", "c1"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.twitch.tv/helix/eventsub/subscriptions?after=c1"
        );
    }
}
