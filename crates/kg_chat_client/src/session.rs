//! Per-user session: the editable inputs, the health cache, and the send
//! state machine (`Idle → Sending → DisplayingResult | DisplayingError → Idle`).

use std::time::Instant;

use tracing::debug;

use crate::client::BackendClient;
use crate::config::{self, BackendConfig, Defaults};
use crate::error::ClientError;
use crate::health::{HealthCache, HealthStatus};
use crate::messages::{QueryResponse, ResponseView};
use crate::transport::{HttpTransport, Transport};

/// Preset questions offered next to the question input.
pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "Top 10 products by revenue in 2025",
    "Which customers bought the most items last month?",
    "Show products frequently bought together with headphones",
    "Average order value by category",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sending,
    DisplayingResult,
    DisplayingError,
}

/// What one submit produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rejected before any I/O (`NotConfigured` or `Validation`).
    Warning(ClientError),
    Answered(QueryResponse),
    Failed(ClientError),
}

pub struct Session<T = HttpTransport> {
    client: BackendClient<T>,
    cache: HealthCache,
    backend_url: String,
    path: String,
    question: String,
    phase: Phase,
}

impl<T: Transport> Session<T> {
    pub fn new(client: BackendClient<T>, cache: HealthCache, defaults: Defaults) -> Self {
        Self {
            client,
            cache,
            backend_url: defaults.base_url,
            path: defaults.path,
            question: String::new(),
            phase: Phase::Idle,
        }
    }

    pub fn client(&self) -> &BackendClient<T> {
        &self.client
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn set_backend_url(&mut self, url: impl Into<String>) {
        self.backend_url = url.into();
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    /// Copy preset `index` into the question input. Returns the preset text.
    pub fn apply_example(&mut self, index: usize) -> Option<&'static str> {
        let example = EXAMPLE_QUESTIONS.get(index).copied()?;
        self.question = example.to_string();
        Some(example)
    }

    /// Current inputs resolved into the target of the next request.
    pub fn config(&self) -> BackendConfig {
        config::resolve(&self.backend_url, &self.path)
    }

    /// Health of the current target, served from cache inside the TTL window.
    pub async fn health(&mut self) -> HealthStatus {
        self.health_at(Instant::now()).await
    }

    /// [`Session::health`] with an explicit clock reading.
    pub async fn health_at(&mut self, now: Instant) -> HealthStatus {
        let config = self.config();
        if !config.is_configured() {
            return HealthStatus::not_configured();
        }
        if let Some(hit) = self.cache.get(&config, now) {
            debug!(endpoint = %config.endpoint(), "health served from cache");
            return hit.clone();
        }
        let status = self.client.check_health(&config).await;
        self.cache.insert(config, status.clone(), now);
        status
    }

    /// Send the current question to the current target.
    ///
    /// Warnings leave the session idle. Otherwise the session ends in one of
    /// the display phases until [`Session::acknowledge`].
    pub async fn submit(&mut self) -> Outcome {
        let config = self.config();
        if !config.is_configured() {
            return Outcome::Warning(ClientError::NotConfigured);
        }
        let question = self.question.trim().to_string();
        if question.is_empty() {
            return Outcome::Warning(ClientError::Validation);
        }

        self.phase = Phase::Sending;
        match self.client.ask(&config, &question).await {
            Ok(response) => {
                // A 2xx body carrying `error` is still a failure to the user.
                self.phase = match response.view() {
                    ResponseView::BackendError { .. } => Phase::DisplayingError,
                    _ => Phase::DisplayingResult,
                };
                Outcome::Answered(response)
            }
            Err(e) => {
                self.phase = Phase::DisplayingError;
                Outcome::Failed(e)
            }
        }
    }

    /// Result has been shown; ready for the next send.
    pub fn acknowledge(&mut self) {
        self.phase = Phase::Idle;
    }
}
