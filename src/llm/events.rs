//! Diagnostics side channel for model queries

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::QueryError;

/// Receives the outcome of every model query.
///
/// Failures never reach the council's caller, so this is where they become
/// observable.
pub trait QueryObserver: Send + Sync {
    fn on_success(&self, _model: &str, _elapsed: Duration) {}

    fn on_failure(&self, model: &str, error: &QueryError);
}

/// Default observer that writes tracing events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn on_success(&self, model: &str, elapsed: Duration) {
        debug!(model, elapsed_ms = elapsed.as_millis() as u64, "model responded");
    }

    fn on_failure(&self, model: &str, error: &QueryError) {
        match error {
            QueryError::Status { status, body } => {
                warn!(model, kind = %error.kind(), status, body = %body, "model query failed");
            }
            QueryError::Timeout { timeout } => {
                warn!(
                    model,
                    kind = %error.kind(),
                    timeout_secs = timeout.as_secs_f64(),
                    "model query failed"
                );
            }
            _ => {
                warn!(model, kind = %error.kind(), error = %error, "model query failed");
            }
        }
    }
}
