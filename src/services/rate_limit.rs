use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::pipeline::{Outcome, RequestContext};
use crate::processor::Processor;

/// Class annotation that installs the rate limiter.
pub const RATE_LIMITED: &str = "RateLimited";

/// Limits applied to every client of every `RateLimited` controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Accesses allowed per client inside one window
    pub max_requests: u32,
    pub window_secs: u64,
    /// Upper bound on tracked clients
    pub max_clients: usize,
    /// Expired records are swept every this many checks
    pub sweep_interval: u64,
    /// Status returned when a client is over the limit
    pub status: u16,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60,
            max_clients: 10_000,
            sweep_interval: 1024,
            status: 429,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Access timestamps of one client still inside the window, oldest first.
#[derive(Debug, Clone, Default)]
pub struct ClientAccessRecord {
    accesses: VecDeque<Instant>,
}

impl ClientAccessRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop accesses at least `window` old.
    pub fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.accesses.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.accesses.pop_front();
            } else {
                break;
            }
        }
    }

    /// Record an access, keeping at most `cap` entries.
    ///
    /// Only the newest entries matter for a limit of `cap - 1`, so dropping
    /// the oldest never changes a decision.
    pub fn record(&mut self, now: Instant, cap: usize) {
        self.accesses.push_back(now);
        while self.accesses.len() > cap {
            self.accesses.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accesses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accesses.is_empty()
    }

    pub fn last_access(&self) -> Option<Instant> {
        self.accesses.back().copied()
    }

    /// `true` when no access falls inside the window any more.
    #[must_use]
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        self.last_access()
            .map_or(true, |last| now.saturating_duration_since(last) >= window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Sliding-log rate limiter keyed by client identity.
///
/// Each check is an atomic read-modify-write on the client's own shard of
/// the map; checks for different clients do not contend on a common lock.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clients: DashMap<String, ClientAccessRecord>,
    checks: AtomicU64,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            max_requests = config.max_requests,
            window_secs = config.window_secs,
            max_clients = config.max_clients,
            "Rate limiter created"
        );
        Self {
            config,
            clients: DashMap::new(),
            checks: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now())
    }

    /// [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, client: &str, now: Instant) -> Decision {
        let window = self.config.window();
        let checks = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.sweep_interval > 0 && checks % self.config.sweep_interval == 0 {
            self.sweep(now);
        }
        let is_new = !self.clients.contains_key(client);
        if is_new && self.clients.len() >= self.config.max_clients {
            self.make_room(now);
        }

        // The entry guard holds the shard lock; nothing below may touch the map.
        let count = {
            let mut record = self.clients.entry(client.to_string()).or_default();
            record.prune(now, window);
            record.record(now, self.config.max_requests as usize + 1);
            record.len()
        };
        // Concurrent first requests can all pass the room check above.
        if is_new {
            self.shrink_to_bound(client);
        }

        if count > self.config.max_requests as usize {
            debug!(client = %client, count = count, "Rate limit exceeded");
            Decision::Deny
        } else {
            Decision::Allow
        }
    }

    /// Remove every client with no access inside the window.
    pub fn sweep(&self, now: Instant) -> usize {
        let window = self.config.window();
        let before = self.clients.len();
        self.clients.retain(|_, record| !record.is_expired(now, window));
        let removed = before.saturating_sub(self.clients.len());
        if removed > 0 {
            debug!(removed = removed, remaining = self.clients.len(), "Expired clients swept");
        }
        removed
    }

    fn make_room(&self, now: Instant) {
        self.sweep(now);
        if self.clients.len() < self.config.max_clients {
            return;
        }
        let oldest = self
            .clients
            .iter()
            .min_by_key(|entry| entry.value().last_access())
            .map(|entry| entry.key().clone());
        if let Some(client) = oldest {
            warn!(
                client = %client,
                max_clients = self.config.max_clients,
                "Client store full, evicting least recently seen client"
            );
            self.clients.remove(&client);
        }
    }

    /// Evict least recently seen clients other than `keep` until within `max_clients`.
    fn shrink_to_bound(&self, keep: &str) {
        while self.clients.len() > self.config.max_clients {
            let oldest = self
                .clients
                .iter()
                .filter(|entry| entry.key() != keep)
                .min_by_key(|entry| entry.value().last_access())
                .map(|entry| entry.key().clone());
            match oldest {
                Some(client) => {
                    warn!(
                        client = %client,
                        max_clients = self.config.max_clients,
                        "Client store over bound, evicting least recently seen client"
                    );
                    self.clients.remove(&client);
                }
                None => break,
            }
        }
    }

    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Accesses currently logged for `client`.
    pub fn accesses(&self, client: &str) -> usize {
        self.clients.get(client).map_or(0, |r| r.len())
    }
}

/// Rejects over-limit clients before any filter or handler runs.
#[derive(Debug, Clone)]
pub struct RateLimitProcessor {
    limiter: Arc<RateLimiter>,
}

impl RateLimitProcessor {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

impl Processor for RateLimitProcessor {
    fn name(&self) -> &str {
        "rate_limit"
    }

    fn pre_handle(&self, ctx: &mut RequestContext) -> Outcome {
        match self.limiter.check(&ctx.request.client) {
            Decision::Allow => Outcome::Continue,
            Decision::Deny => {
                warn!(
                    request_id = %ctx.request_id,
                    client = %ctx.request.client,
                    "Client over rate limit"
                );
                Outcome::Fail(PipelineError::rate_limited(self.limiter.config.status))
            }
        }
    }
}
