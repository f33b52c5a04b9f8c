use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Past this many tracked clients, expired windows are dropped on insert.
const PRUNE_THRESHOLD: usize = 1024;

/// Request ID, taken from `x-request-id` or generated. Stored as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// One counting window. Resets lazily on the first request after it ends.
#[derive(Debug)]
struct Window {
    opened: Instant,
    admitted: usize,
}

impl Window {
    /// Counts the request at `now`, or returns how long until the window resets.
    fn admit(&mut self, now: Instant, limit: usize, length: Duration) -> Result<(), Duration> {
        let age = now.saturating_duration_since(self.opened);
        if age >= length {
            self.opened = now;
            self.admitted = 0;
        } else if self.admitted >= limit {
            return Err(length - age);
        }
        if self.admitted >= limit {
            return Err(length);
        }
        self.admitted += 1;
        Ok(())
    }
}

/// Fixed-window limiter over the session and address routes, one window per
/// client. Health is exempt.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    limit: usize,
    length: Duration,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(limit: usize, length: Duration) -> Self {
        Self {
            limit,
            length,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    async fn admit(&self, client: &str, now: Instant) -> Result<(), Duration> {
        let mut windows = self.windows.lock().await;
        if windows.len() >= PRUNE_THRESHOLD && !windows.contains_key(client) {
            windows.retain(|_, w| now.saturating_duration_since(w.opened) < self.length);
        }
        windows
            .entry(client.to_string())
            .or_insert(Window {
                opened: now,
                admitted: 0,
            })
            .admit(now, self.limit, self.length)
    }
}

/// Client key: the first `x-forwarded-for` hop, else the peer address.
fn client_key(req: &Request) -> String {
    let forwarded = req
        .headers()
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(hop) = forwarded {
        return hop.to_string();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |ConnectInfo(addr)| addr.ip().to_string())
}

pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    tracing::debug!(request_id = %id, method = %req.method(), path = %req.uri().path(), "request");
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

/// Rejects requests past the window's limit with 429, the error envelope and
/// a `retry-after` header in whole seconds.
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);
    let verdict = limiter.admit(&client, Instant::now()).await;

    match verdict {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            let request_id = req
                .extensions()
                .get::<RequestId>()
                .map_or_else(String::new, |id| id.0.clone());
            let retry_secs = wait.as_secs().max(1);
            tracing::warn!(
                limit = limiter.limit,
                retry_secs,
                client = %client,
                path = %req.uri().path(),
                "request rejected by rate limit"
            );
            let mut res = ApiError::new(
                request_id,
                "rate_limited",
                format!("too many requests; retry in {retry_secs}s"),
            )
            .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_secs.to_string()) {
                res.headers_mut().insert(RETRY_AFTER, value);
            }
            res
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(opened: Instant) -> Window {
        Window {
            opened,
            admitted: 0,
        }
    }

    #[test]
    fn admits_up_to_the_limit_then_reports_remaining_time() {
        let start = Instant::now();
        let mut w = window(start);
        let length = Duration::from_secs(60);
        assert!(w.admit(start, 2, length).is_ok());
        assert!(w.admit(start, 2, length).is_ok());
        let wait = w
            .admit(start + Duration::from_secs(20), 2, length)
            .expect_err("third request is over the limit");
        assert_eq!(wait, Duration::from_secs(40));
    }

    #[test]
    fn window_resets_after_its_length() {
        let start = Instant::now();
        let mut w = window(start);
        let length = Duration::from_secs(10);
        assert!(w.admit(start, 1, length).is_ok());
        assert!(w.admit(start, 1, length).is_err());
        assert!(w.admit(start + length, 1, length).is_ok());
        assert_eq!(w.admitted, 1);
    }

    #[tokio::test]
    async fn clients_have_separate_windows() {
        let limiter = RateLimitState::per_minute(1);
        let now = Instant::now();
        assert!(limiter.admit("10.0.0.1", now).await.is_ok());
        assert!(limiter.admit("10.0.0.1", now).await.is_err());
        assert!(limiter.admit("10.0.0.2", now).await.is_ok());
    }

    #[test]
    fn client_key_prefers_first_forwarded_hop() {
        let req = axum::http::Request::builder()
            .header(FORWARDED_FOR_HEADER, "203.0.113.7, 10.0.0.1")
            .body(axum::body::Body::empty())
            .expect("request");
        assert_eq!(client_key(&req), "203.0.113.7");

        let bare = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .expect("request");
        assert_eq!(client_key(&bare), "unknown");
    }

    #[test]
    fn zero_limit_rejects_everything() {
        let start = Instant::now();
        let mut w = window(start);
        assert!(w.admit(start, 0, Duration::from_secs(5)).is_err());
    }
}
