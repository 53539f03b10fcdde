use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window: Duration::minutes(15),
        }
    }
}

#[derive(Debug)]
struct ClientWindow {
    count: u32,
    resets_at: DateTime<Utc>,
}

/// Per-IP fixed-window counter guarding the signup endpoints.
///
/// Counters reset lazily when a request arrives past the window. Stale
/// entries are dropped opportunistically on roughly one in ten checks so the
/// map stays bounded without a dedicated sweeper task.
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, ClientWindow>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Returns `Err(RateLimited)` with the seconds until the window resets
    /// once the caller has exceeded `max_requests` within the window.
    pub async fn check(&self, client_ip: &str) -> Result<(), AuthError> {
        let now = Utc::now();
        let mut windows = self.windows.write().await;

        if rand::thread_rng().gen_ratio(1, 10) {
            windows.retain(|_, w| w.resets_at > now);
        }

        let window = windows
            .entry(client_ip.to_string())
            .or_insert_with(|| ClientWindow {
                count: 0,
                resets_at: now + self.config.window,
            });

        if now >= window.resets_at {
            window.count = 0;
            window.resets_at = now + self.config.window;
        }

        if window.count < self.config.max_requests {
            window.count += 1;
            Ok(())
        } else {
            let retry_after_secs = (window.resets_at - now).num_seconds().max(1);
            Err(AuthError::RateLimited { retry_after_secs })
        }
    }

    pub async fn tracked_clients(&self) -> usize {
        self.windows.read().await.len()
    }
}
