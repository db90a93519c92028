//! Per-client rate limiting.
//!
//! Every client (keyed by peer IP address) gets its own token bucket. The
//! check runs before routing extracts anything from the request, so an
//! exhausted client gets 429 whatever the payload looks like.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use aieditor_core::error::CoreError;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tokio_util::sync::CancellationToken;

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Key used when the peer address is not available (e.g. in-process
/// requests in tests). All such requests share one bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// How often idle client buckets are dropped.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Token buckets keyed by client.
pub struct ClientRateLimiter {
    limiter: KeyedLimiter,
    retry_after_secs: u64,
}

impl ClientRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let quota = Quota::per_minute(config.per_minute).allow_burst(config.burst);
        // One token comes back every replenish interval.
        let retry_after_secs = quota.replenish_interval().as_secs_f64().ceil().max(1.0) as u64;

        Self {
            limiter: RateLimiter::keyed(quota),
            retry_after_secs,
        }
    }

    /// Take one token from `client`'s bucket.
    pub fn check(&self, client: &str) -> Result<(), CoreError> {
        self.limiter
            .check_key(&client.to_string())
            .map_err(|_| CoreError::RateLimited {
                retry_after_secs: self.retry_after_secs,
            })
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    /// Forget clients whose buckets are full again.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }
}

/// Identify the client of `req` by peer IP address.
pub fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Reject the request with 429 once the client's bucket is empty.
pub async fn enforce(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&req);

    if let Err(err) = state.rate_limiter.check(&client) {
        tracing::warn!(
            client = %client,
            method = %req.method(),
            path = %req.uri().path(),
            "Rate limit exceeded",
        );
        return Err(err.into());
    }

    Ok(next.run(req).await)
}

/// Drop idle client buckets every `every` until `cancel` fires.
pub async fn run_pruner(
    limiter: Arc<ClientRateLimiter>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Rate limit pruner stopped");
                return;
            }
            _ = interval.tick() => {
                limiter.prune();
                tracing::trace!(clients = limiter.tracked_clients(), "Pruned rate limit buckets");
            }
        }
    }
}
