//! Backend liveness: health check results and the time-based memo in front of them.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::config::BackendConfig;
use crate::error::TransportError;

/// Payload fields worth surfacing from a JSON health body.
const VERSION_KEYS: &[&str] = &["version", "revision", "status"];

/// Result of one health check.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub detail: HealthDetail,
}

impl HealthStatus {
    pub fn not_configured() -> Self {
        Self {
            healthy: false,
            detail: HealthDetail::NotConfigured,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthDetail {
    NotConfigured,
    /// Backend answered; body was not a JSON object.
    Status { url: String, status: u16 },
    /// Backend answered with a JSON object body.
    Payload {
        url: String,
        status: u16,
        payload: Value,
    },
    /// Health check never got an HTTP answer.
    Failed { url: String, error: TransportError },
}

impl fmt::Display for HealthDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthDetail::NotConfigured => write!(f, "Backend not configured."),
            HealthDetail::Status { url, status } => write!(f, "GET {} → {}", url, status),
            HealthDetail::Payload {
                url,
                status,
                payload,
            } => {
                write!(f, "GET {} → {}", url, status)?;
                let fields: Vec<String> = VERSION_KEYS
                    .iter()
                    .filter_map(|k| payload.get(*k).map(|v| format!("{}={}", k, plain(v))))
                    .collect();
                if !fields.is_empty() {
                    write!(f, " ({})", fields.join(", "))?;
                }
                Ok(())
            }
            HealthDetail::Failed { url, error } => write!(f, "GET {} failed: {}", url, error),
        }
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
struct CachedHealth {
    checked_at: Instant,
    status: HealthStatus,
}

/// Health results keyed by `(base_url, path)`, valid for a fixed window.
///
/// Expiry is the only invalidation; changing the URL or path simply looks up
/// a different key.
#[derive(Debug, Clone)]
pub struct HealthCache {
    ttl: Duration,
    entries: HashMap<BackendConfig, CachedHealth>,
}

impl HealthCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached status for `key` if it was stored less than `ttl` before `now`.
    pub fn get(&self, key: &BackendConfig, now: Instant) -> Option<&HealthStatus> {
        let entry = self.entries.get(key)?;
        let age = now.saturating_duration_since(entry.checked_at);
        (age < self.ttl).then_some(&entry.status)
    }

    pub fn insert(&mut self, key: BackendConfig, status: HealthStatus, now: Instant) {
        // Stale entries for other keys would otherwise pile up over a long session.
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.checked_at) < ttl);
        self.entries.insert(
            key,
            CachedHealth {
                checked_at: now,
                status,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HealthCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::config::DEFAULT_HEALTH_TTL_SECS))
    }
}
