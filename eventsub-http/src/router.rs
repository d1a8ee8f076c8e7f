//! Warp routes serving EventSub callbacks.
//!
//! All routes live under the adapter's path prefix when the adapter asks for
//! it in handlers:
//!
//! - `GET  {prefix}/`           health check, always 200
//! - `POST {prefix}/:id`        legacy callback path, 410 Gone
//! - `POST {prefix}/event/:id`  the only path dispatched to the listener
//!
//! Anything else is answered with 404.

use std::convert::Infallible;

use bytes::Bytes;
use eventsub::{DispatchResponse, EventSubHeaders, EventSubListener};
use warp::filters::BoxedFilter;
use warp::http::{HeaderMap, Method, StatusCode};
use warp::{Filter, Rejection, Reply};

/// Request rejected because of its Host header.
#[derive(Debug)]
struct HostDenied;

impl warp::reject::Reject for HostDenied {}

/// Build the full route tree for `listener`.
pub fn routes(
    listener: EventSubListener,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static {
    let prefix_segments: Vec<String> = if listener.adapter().use_path_prefix_in_handlers() {
        listener
            .adapter()
            .path_prefix()
            .map(|p| p.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    let prefix = prefix_filter(&prefix_segments);
    let guard = host_guard(listener.clone());

    let health = prefix
        .clone()
        .and(warp::path::end())
        .and(warp::get())
        .and(guard.clone())
        .map(|| StatusCode::OK.into_response());

    let event = prefix
        .clone()
        .and(warp::path("event"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::post())
        .and(guard.clone())
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .and_then({
            let listener = listener.clone();
            move |key: String, headers: HeaderMap, body: Bytes| {
                let listener = listener.clone();
                async move {
                    let headers = extract_headers(&headers);
                    let response = listener.handle_request(&key, &headers, &body).await;
                    Ok::<_, Rejection>(into_reply(response))
                }
            }
        });

    let legacy = prefix
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::post())
        .and(guard)
        .map(|key: String| {
            tracing::debug!(key = %key, "Rejected request on legacy callback path");
            StatusCode::GONE.into_response()
        });

    health
        .or(event)
        .unify()
        .or(legacy)
        .unify()
        .or(fallback(listener))
        .unify()
        .recover(handle_rejection)
        .unify()
        .with(warp::log::custom(|info| {
            tracing::debug!(
                method = %info.method(),
                path = info.path(),
                status = info.status().as_u16(),
                elapsed_ms = info.elapsed().as_millis() as u64,
                "Handled request"
            );
        }))
}

/// Match the prefix segments in order; matches anything when empty.
fn prefix_filter(segments: &[String]) -> BoxedFilter<()> {
    segments
        .iter()
        .fold(warp::any().boxed(), |filter, segment| filter.and(warp::path(segment.clone())).boxed())
}

fn host_guard(listener: EventSubListener) -> BoxedFilter<()> {
    warp::header::optional::<String>("host")
        .and_then(move |host: Option<String>| {
            let listener = listener.clone();
            async move {
                if listener.is_host_denied(host.as_deref()).await {
                    Err(warp::reject::custom(HostDenied))
                } else {
                    Ok(())
                }
            }
        })
        .untuple_one()
        .boxed()
}

/// 404 for every unmatched request; logged unless the host is denied.
fn fallback(
    listener: EventSubListener,
) -> impl Filter<Extract = (warp::reply::Response,), Error = Rejection> + Clone + Send + Sync + 'static {
    warp::method()
        .and(warp::path::full())
        .and(warp::header::optional::<String>("host"))
        .and_then(move |method: Method, path: warp::path::FullPath, host: Option<String>| {
            let listener = listener.clone();
            async move {
                if !listener.is_host_denied(host.as_deref()).await {
                    tracing::warn!(method = %method, path = path.as_str(), "No route for request");
                }
                Ok::<_, Rejection>(StatusCode::NOT_FOUND.into_response())
            }
        })
}

fn extract_headers(headers: &HeaderMap) -> EventSubHeaders {
    EventSubHeaders::from_lookup(|name| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    })
}

fn into_reply(response: DispatchResponse) -> warp::reply::Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match response.body {
        Some(body) => warp::reply::with_status(body, status).into_response(),
        None => status.into_response(),
    }
}

async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    let status = if err.is_not_found() || err.find::<HostDenied>().is_some() {
        StatusCode::NOT_FOUND
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        StatusCode::METHOD_NOT_ALLOWED
    } else {
        tracing::warn!(rejection = ?err, "Unhandled request rejection");
        StatusCode::BAD_REQUEST
    };
    Ok(status.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use eventsub::{ListenerConfig, ReverseProxyAdapter};
    use twitch_api::mock::MockHelixCaller;
    use twitch_api::TwitchApiClient;

    fn listener(adapter: ReverseProxyAdapter, config: ListenerConfig) -> EventSubListener {
        EventSubListener::new(
            TwitchApiClient::new(Arc::new(MockHelixCaller::new())),
            Arc::new(adapter),
            config,
        )
        .unwrap()
    }

    fn prefixed() -> EventSubListener {
        listener(
            ReverseProxyAdapter::new("events.example.com")
                .with_path_prefix("/hooks")
                .with_prefix_in_handlers(true),
            ListenerConfig::new("s3cretvalue"),
        )
    }

    #[tokio::test]
    async fn test_health_under_prefix() {
        let routes = routes(prefixed());

        let res = warp::test::request().method("GET").path("/hooks").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = warp::test::request().method("GET").path("/hooks/").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = warp::test::request().method("GET").path("/").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_legacy_path_is_gone() {
        let routes = routes(prefixed());
        let res = warp::test::request()
            .method("POST")
            .path("/hooks/channel.ban.1337")
            .body("{}")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_event_without_headers_is_bad_request() {
        let routes = routes(prefixed());
        let res = warp::test::request()
            .method("POST")
            .path("/hooks/event/channel.ban.1337")
            .body("{}")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_subscription_is_not_found() {
        let routes = routes(prefixed());
        let res = warp::test::request()
            .method("POST")
            .path("/hooks/event/channel.ban.1337")
            .header("twitch-eventsub-message-id", "m-1")
            .header("twitch-eventsub-message-type", "notification")
            .header("twitch-eventsub-message-timestamp", "2024-01-01T00:00:00Z")
            .header("twitch-eventsub-message-signature", "sha256=00")
            .body("{}")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_routes_without_prefix_in_handlers() {
        let routes = routes(listener(
            ReverseProxyAdapter::new("events.example.com").with_path_prefix("/hooks"),
            ListenerConfig::new("s3cretvalue"),
        ));

        let res = warp::test::request().method("GET").path("/").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = warp::test::request().method("GET").path("/hooks").reply(&routes).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_denied_host_gets_not_found() {
        let routes = routes(listener(
            ReverseProxyAdapter::new("events.example.com"),
            ListenerConfig::new("s3cretvalue").with_strict_host_check(true),
        ));

        let res = warp::test::request()
            .method("GET")
            .path("/")
            .header("host", "attacker.example.org")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = warp::test::request()
            .method("GET")
            .path("/")
            .header("host", "events.example.com:8080")
            .reply(&routes)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
