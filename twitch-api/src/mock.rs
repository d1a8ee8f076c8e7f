//! In-memory [`HelixCaller`] for tests
//!
//! Simulates the subset of Helix the SDK uses: creating, listing and deleting
//! EventSub subscriptions (kept in a remote-side table) and user lookup.
//! Every call is recorded so tests can assert on what was sent.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use helix_client::{ApiCallOptions, HelixCaller, HelixError, HttpMethod};

type Handler =
    Box<dyn Fn(&ApiCallOptions) -> Option<Result<Option<Value>, HelixError>> + Send + Sync>;

pub struct MockHelixCaller {
    calls: Mutex<Vec<ApiCallOptions>>,
    failures: Mutex<Vec<(HttpMethod, String, u16)>>,
    remote: Mutex<Vec<Value>>,
    page_size: usize,
    handler: Option<Handler>,
}

impl Default for MockHelixCaller {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHelixCaller {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            remote: Mutex::new(Vec::new()),
            page_size: 100,
            handler: None,
        }
    }

    /// Custom responder; returning `None` falls through to the default behavior.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ApiCallOptions) -> Option<Result<Option<Value>, HelixError>> + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Make every call to `method url` fail with the given HTTP status.
    pub fn fail_with(&self, method: HttpMethod, url: &str, status: u16) {
        self.failures.lock().push((method, url.to_string(), status));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    pub fn calls(&self) -> Vec<ApiCallOptions> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: HttpMethod, url: &str) -> Vec<ApiCallOptions> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.url == url)
            .cloned()
            .collect()
    }

    pub fn remote_subscriptions(&self) -> Vec<Value> {
        self.remote.lock().clone()
    }

    /// Seed a remote subscription, as if created by an earlier process.
    pub fn insert_remote_subscription(
        &self,
        id: &str,
        subscription_type: &str,
        status: &str,
        callback: &str,
    ) {
        self.remote.lock().push(json!({
            "id": id,
            "status": status,
            "type": subscription_type,
            "version": "1",
            "condition": {},
            "created_at": "2024-01-01T00:00:00Z",
            "transport": { "method": "webhook", "callback": callback },
            "cost": 1
        }));
    }

    fn query_value<'a>(options: &'a ApiCallOptions, key: &str) -> Option<&'a str> {
        options
            .query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn default_response(&self, options: &ApiCallOptions) -> Result<Option<Value>, HelixError> {
        match (options.method, options.url.as_str()) {
            (HttpMethod::Post, "eventsub/subscriptions") => {
                let body = options.json_body.clone().unwrap_or(Value::Null);
                let created = json!({
                    "id": uuid::Uuid::new_v4().to_string(),
                    "status": "webhook_callback_verification_pending",
                    "type": body["type"],
                    "version": body["version"],
                    "condition": body["condition"],
                    "created_at": "2024-01-01T00:00:00Z",
                    "transport": {
                        "method": body["transport"]["method"],
                        "callback": body["transport"]["callback"],
                    },
                    "cost": 1
                });
                let mut remote = self.remote.lock();
                remote.push(created.clone());
                Ok(Some(json!({
                    "data": [created],
                    "total": remote.len(),
                    "total_cost": remote.len(),
                    "max_total_cost": 10000
                })))
            }
            (HttpMethod::Delete, "eventsub/subscriptions") => {
                let id = Self::query_value(options, "id").unwrap_or_default();
                self.remote.lock().retain(|s| s["id"] != id);
                Ok(None)
            }
            (HttpMethod::Get, "eventsub/subscriptions") => {
                let offset: usize = Self::query_value(options, "after")
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(0);
                let remote = self.remote.lock();
                let page: Vec<Value> = remote.iter().skip(offset).take(self.page_size).cloned().collect();
                let next = offset + page.len();
                let pagination = if next < remote.len() {
                    json!({ "cursor": next.to_string() })
                } else {
                    json!({})
                };
                Ok(Some(json!({ "data": page, "total": remote.len(), "pagination": pagination })))
            }
            (HttpMethod::Get, "users") => {
                let users: Vec<Value> = options
                    .query
                    .iter()
                    .filter(|(k, _)| k == "id")
                    .map(|(_, id)| {
                        json!({
                            "id": id,
                            "login": format!("user{id}"),
                            "display_name": format!("User{id}"),
                            "type": "",
                            "broadcaster_type": "affiliate"
                        })
                    })
                    .collect();
                Ok(Some(json!({ "data": users })))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl HelixCaller for MockHelixCaller {
    async fn call_api(&self, options: ApiCallOptions) -> Result<Option<Value>, HelixError> {
        self.calls.lock().push(options.clone());

        let failure = self
            .failures
            .lock()
            .iter()
            .find(|(method, url, _)| *method == options.method && *url == options.url)
            .map(|(_, _, status)| *status);
        if let Some(status) = failure {
            return Err(HelixError::Http {
                status,
                url: options.url.clone(),
                message: format!("mock failure {status}"),
            });
        }

        if let Some(handler) = &self.handler {
            if let Some(response) = handler(&options) {
                return response;
            }
        }

        self.default_response(&options)
    }
}
