//! Rate Limiting Module
//!
//! Fixed-window request counting per client IP.
//!
//! Clients are keyed on the TCP peer address. Behind a reverse proxy every
//! request shares the proxy's address unless the limiter is told to trust
//! the first `X-Forwarded-For` hop.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ApiError;

/// Window length for `requests per minute`.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Past this many tracked clients, expired windows are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

// == Rate Limiter ==
/// Allows `limit` requests per client per window.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    trust_forwarded_for: bool,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `per_minute` requests per client per minute.
    pub fn per_minute(per_minute: u32) -> Self {
        Self::new(per_minute, WINDOW)
    }

    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            trust_forwarded_for: false,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Keys clients on the first `X-Forwarded-For` hop when present. Only
    /// safe when a proxy in front of the server sets the header.
    pub fn trusting_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// The address a request is counted against.
    ///
    /// The forwarded hop when trusted, else the peer address, else
    /// unspecified.
    pub fn client_ip(&self, request: &Request) -> IpAddr {
        let forwarded = self
            .trust_forwarded_for
            .then(|| forwarded_for(request))
            .flatten();
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        forwarded
            .or(peer)
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    // == Check ==
    /// Counts a request from `client`.
    ///
    /// Returns the time until the window resets when the client is over its
    /// limit.
    pub async fn check(&self, client: IpAddr) -> Result<(), Duration> {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;

        if clients.len() > PRUNE_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = clients.entry(client).or_insert(Window { started: now, count: 0 });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.limit {
            let elapsed = now.duration_since(entry.started);
            return Err(self.window.saturating_sub(elapsed));
        }

        entry.count += 1;
        Ok(())
    }
}

// == Middleware ==
/// Rejects requests over the per-IP limit with 429.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = limiter.client_ip(&request);

    if let Err(retry_in) = limiter.check(client).await {
        debug!("rate limit exceeded for {}", client);
        // Round up so clients never retry early
        let retry_after = retry_in.as_secs() + u64::from(retry_in.subsec_nanos() > 0);
        return Err(ApiError::RateLimited { retry_after });
    }

    Ok(next.run(request).await)
}

fn forwarded_for(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}
