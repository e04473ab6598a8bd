use super::{ApiRequest, Transport};
use crate::error::{ApiError, ApiErrorKind, ApiResult};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::task::{Context, Poll};

/// A recording transport for tests.
///
/// Requests are captured in order. Responses are replayed from a script;
/// once it runs dry every request succeeds with `{}`.
#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Mutex<Vec<ApiRequest>>,
    responses: Mutex<VecDeque<ApiResult<serde_json::Value>>>,
    /// Scheduler turns to give up before answering.
    yields: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: serde_json::Value) {
        self.lock_responses().push_back(Ok(response));
    }

    pub fn push_http_error(&self, status: u16, body: &str) {
        let status =
            reqwest::StatusCode::from_u16(status).unwrap_or(reqwest::StatusCode::BAD_REQUEST);
        self.lock_responses()
            .push_back(Err(ApiError::http(status, body.to_string(), "Request failed")));
    }

    pub fn push_network_error(&self, message: &str) {
        self.lock_responses().push_back(Err(ApiError {
            kind: ApiErrorKind::Network,
            message: message.to_string(),
        }));
    }

    /// Makes every subsequent send suspend `n` times before resolving.
    pub fn set_yields(&self, n: usize) {
        self.yields.store(n, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<ApiResult<serde_json::Value>>> {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<serde_json::Value> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request);

        // Pick the response up front so replay order follows send order.
        let response = self
            .lock_responses()
            .pop_front()
            .unwrap_or_else(|| Ok(serde_json::json!({})));

        for _ in 0..self.yields.load(Ordering::SeqCst) {
            YieldNow(false).await;
        }

        response
    }
}

struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
