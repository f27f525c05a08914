use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

#[derive(Debug)]
struct Window {
    opened: Instant,
    count: u32,
}

/// Fixed-window request limiter shared across a router.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    limit: u32,
    window_len: Duration,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    pub fn per_second(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(1))
    }

    pub fn new(limit: u32, window_len: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window_len,
            window: Arc::new(Mutex::new(Window {
                opened: Instant::now(),
                count: 0,
            })),
        }
    }

    fn allow(&self) -> bool {
        let mut guard = self.window.lock().expect("rate limiter mutex poisoned");
        let now = Instant::now();
        if now.duration_since(guard.opened) >= self.window_len {
            guard.opened = now;
            guard.count = 0;
        }
        if guard.count < self.limit {
            guard.count += 1;
            true
        } else {
            false
        }
    }
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.allow() {
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_refills_after_elapsing() {
        let limiter = RateLimiter::new(2, Duration::from_millis(20));
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.allow());
    }
}
