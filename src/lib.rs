//! LLM Council - query a panel of models in parallel
//!
//! Fans one conversation out to every council member, waits for all of them
//! to settle, and returns each model's answer keyed by model identifier.

pub mod config;
pub mod error;
pub mod llm;

pub use config::{Config, RouterType};
pub use error::{ConfigError, FailureKind, QueryError};
pub use llm::{
    create_client, Council, CouncilOutcome, Message, ModelClient, ModelResult, OllamaClient,
    OpenRouterClient, QueryObserver, Role, TracingObserver,
};
