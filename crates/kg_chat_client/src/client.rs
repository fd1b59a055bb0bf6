//! Backend client: health check and question round trip over a [`Transport`].

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{self, BackendConfig, Config};
use crate::error::{ClientError, TransportErrorKind};
use crate::health::{HealthDetail, HealthStatus};
use crate::messages::{QueryRequest, QueryResponse};
use crate::transport::{HttpTransport, Transport};

/// Query string appended to health checks when enabled.
pub const HEALTH_QUERY: &str = "health=1";

/// Timeouts and health check shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub health_timeout: Duration,
    pub query_timeout: Duration,
    /// Check `<endpoint>?health=1` instead of `<endpoint>`.
    pub health_query_param: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            health_timeout: Duration::from_secs(config::DEFAULT_HEALTH_TIMEOUT_SECS),
            query_timeout: Duration::from_secs(config::DEFAULT_QUERY_TIMEOUT_SECS),
            health_query_param: false,
        }
    }
}

impl From<&Config> for ClientOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            health_timeout: cfg.health_timeout(),
            query_timeout: cfg.query_timeout(),
            health_query_param: cfg.health.query_param,
        }
    }
}

/// Talks to one backend at a time; the target comes with each call.
pub struct BackendClient<T = HttpTransport> {
    transport: T,
    options: ClientOptions,
}

impl BackendClient<HttpTransport> {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let transport = HttpTransport::new()?;
        Ok(Self::with_transport(transport, options))
    }
}

impl<T: Transport> BackendClient<T> {
    pub fn with_transport(transport: T, options: ClientOptions) -> Self {
        Self { transport, options }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn health_url(&self, config: &BackendConfig) -> String {
        let endpoint = config.endpoint();
        if self.options.health_query_param {
            let sep = if endpoint.contains('?') { '&' } else { '?' };
            format!("{}{}{}", endpoint, sep, HEALTH_QUERY)
        } else {
            endpoint
        }
    }

    /// Check the backend once. Never fails; failures become an unhealthy status.
    pub async fn check_health(&self, config: &BackendConfig) -> HealthStatus {
        if !config.is_configured() {
            return HealthStatus::not_configured();
        }
        let url = self.health_url(config);
        debug!(%url, "health check");
        match self.transport.get(&url, self.options.health_timeout).await {
            Ok(resp) => {
                let healthy = resp.is_success();
                let detail = match serde_json::from_str::<Value>(&resp.body) {
                    Ok(payload @ Value::Object(_)) => HealthDetail::Payload {
                        url,
                        status: resp.status,
                        payload,
                    },
                    _ => HealthDetail::Status {
                        url,
                        status: resp.status,
                    },
                };
                if !healthy {
                    warn!(status = resp.status, "health check returned non-success status");
                }
                HealthStatus { healthy, detail }
            }
            Err(error) => {
                warn!(%url, %error, "health check failed");
                HealthStatus {
                    healthy: false,
                    detail: HealthDetail::Failed { url, error },
                }
            }
        }
    }

    /// POST `{"text": question}` and return the parsed answer.
    ///
    /// Single attempt, no retries. The question is trimmed; blank input is
    /// rejected before any I/O.
    pub async fn ask(
        &self,
        config: &BackendConfig,
        question: &str,
    ) -> Result<QueryResponse, ClientError> {
        if !config.is_configured() {
            return Err(ClientError::NotConfigured);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(ClientError::Validation);
        }
        let url = config.endpoint();
        let body = serde_json::to_value(QueryRequest::new(question)).map_err(|e| {
            ClientError::Transport {
                kind: TransportErrorKind::Request,
                message: e.to_string(),
            }
        })?;

        debug!(%url, chars = question.chars().count(), "sending question");
        let started = Instant::now();
        let resp = self
            .transport
            .post_json(&url, &body, self.options.query_timeout)
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "question request failed");
                ClientError::from(e)
            })?;
        let took_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !resp.is_success() {
            warn!(status = resp.status, took_ms, "backend returned error status");
            return Err(ClientError::http_status(resp.status, &resp.body));
        }

        let response = QueryResponse::from_body(&resp.body, took_ms);
        if response.degraded {
            warn!(took_ms, "backend body is not JSON; showing raw text");
        } else {
            debug!(status = resp.status, took_ms, "backend answered");
        }
        Ok(response)
    }
}
