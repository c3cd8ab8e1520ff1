//! LLM Council - parallel fan-out of one conversation to many models

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::QueryError;
use crate::llm::events::{QueryObserver, TracingObserver};
use crate::llm::provider::ModelClient;
use crate::llm::types::{CouncilOutcome, Message};

/// Dispatches each council round to every member concurrently
pub struct Council {
    client: Arc<dyn ModelClient>,
    timeout: Option<Duration>,
    observer: Arc<dyn QueryObserver>,
}

impl Council {
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            timeout: None,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Observer told about query tasks that die before settling
    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Per-model timeout; the client's default applies when unset
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Query every model with the same conversation and wait for all of them.
    ///
    /// The outcome holds one entry per distinct model. A model that failed,
    /// timed out or whose task panicked maps to `None`; siblings are never
    /// affected. Repeated identifiers are queried once.
    pub async fn dispatch(&self, models: &[String], conversation: &[Message]) -> CouncilOutcome {
        let members = distinct(models);
        let mut outcome = CouncilOutcome::with_members(members.iter().copied());

        if members.is_empty() {
            return outcome;
        }

        info!(
            backend = self.client.name(),
            models = members.len(),
            "Dispatching council round"
        );

        let conversation: Arc<[Message]> = Arc::from(conversation);
        let mut join_set = JoinSet::new();
        let mut tasks = HashMap::with_capacity(members.len());

        for model in members {
            let client = Arc::clone(&self.client);
            let conversation = Arc::clone(&conversation);
            let model = model.to_string();
            let timeout = self.timeout;

            let handle = join_set.spawn({
                let model = model.clone();
                async move {
                    let result = client.query(&model, &conversation, timeout).await;
                    (model, result)
                }
            });
            tasks.insert(handle.id(), model);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            match joined {
                Ok((_, (model, result))) => {
                    debug!(model = %model, answered = result.is_some(), "Model settled");
                    outcome.record(model, result);
                }
                Err(e) => {
                    // Slot stays absent
                    let model = tasks.get(&e.id()).map(String::as_str).unwrap_or("<unknown>");
                    let error = QueryError::Unclassified(format!("query task failed: {}", e));
                    self.observer.on_failure(model, &error);
                }
            }
        }

        info!(
            answered = outcome.responded().count(),
            total = outcome.len(),
            "Council round complete"
        );

        outcome
    }
}

/// First occurrence of each identifier, in input order
fn distinct(models: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(models.len());
    for model in models {
        if seen.insert(model.as_str()) {
            members.push(model.as_str());
        } else {
            warn!(model = %model, "Duplicate council member ignored");
        }
    }
    members
}
