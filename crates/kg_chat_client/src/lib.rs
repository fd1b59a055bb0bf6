//! Client library for a knowledge-graph question-answering backend
//! (config, HTTP contract, health cache, session state, rendering).
//! Used by the `kg-chat` terminal front end.

pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod messages;
pub mod render;
pub mod session;
pub mod transport;

pub use client::{BackendClient, ClientOptions};
pub use config::{default_config_path, resolve, BackendConfig, Config, ConfigError, Defaults};
pub use error::{ClientError, TransportError, TransportErrorKind};
pub use health::{HealthCache, HealthDetail, HealthStatus};
pub use messages::{normalize, QueryRequest, QueryResponse, ResponseView, Table};
pub use session::{Outcome, Phase, Session, EXAMPLE_QUESTIONS};
pub use transport::{HttpTransport, RawResponse, Transport};
