//! Conversation and result types shared by clients and the council

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message, sent to backends exactly as given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A successful answer from one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResult {
    /// The model's answer text
    pub content: Option<String>,

    /// Provider-supplied reasoning trace, when the backend exposes one
    pub reasoning: Option<String>,
}

impl ModelResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// Results of one council round keyed by model identifier.
///
/// Holds an entry for every distinct model that was dispatched; the value is
/// `None` when that model failed to answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouncilOutcome {
    results: HashMap<String, Option<ModelResult>>,
}

impl CouncilOutcome {
    pub(crate) fn with_members<'a>(models: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            results: models.into_iter().map(|m| (m.to_string(), None)).collect(),
        }
    }

    pub(crate) fn record(&mut self, model: String, result: Option<ModelResult>) {
        self.results.insert(model, result);
    }

    /// Result for `model`; outer `None` if the model was not part of the round
    pub fn get(&self, model: &str) -> Option<Option<&ModelResult>> {
        self.results.get(model).map(Option::as_ref)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.results.contains_key(model)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&ModelResult>)> {
        self.results.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Models that answered, with their results
    pub fn responded(&self) -> impl Iterator<Item = (&str, &ModelResult)> {
        self.results
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|r| (k.as_str(), r)))
    }

    /// Models that failed or timed out
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
    }

    pub fn into_inner(self) -> HashMap<String, Option<ModelResult>> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::system("be brief")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"be brief"}"#);

        let msg: Message = serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).unwrap();
        assert_eq!(msg, Message::assistant("ok"));
    }

    #[test]
    fn test_outcome_starts_absent() {
        let outcome = CouncilOutcome::with_members(["a", "b"]);

        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.get("a"), Some(None));
        assert_eq!(outcome.get("zzz"), None);
        assert_eq!(outcome.responded().count(), 0);
    }

    #[test]
    fn test_outcome_responded_and_missing() {
        let mut outcome = CouncilOutcome::with_members(["a", "b", "c"]);
        outcome.record("b".to_string(), Some(ModelResult::new("hello")));

        let responded: Vec<_> = outcome.responded().map(|(m, _)| m).collect();
        assert_eq!(responded, vec!["b"]);

        let mut missing: Vec<_> = outcome.missing().collect();
        missing.sort();
        assert_eq!(missing, vec!["a", "c"]);
    }

    #[test]
    fn test_outcome_lookup_and_iteration() {
        let mut outcome = CouncilOutcome::with_members(["a", "b"]);
        outcome.record("a".to_string(), Some(ModelResult::new("yes")));

        assert!(outcome.contains("a"));
        assert!(outcome.contains("b"));
        assert!(!outcome.contains("c"));

        let mut entries: Vec<_> = outcome
            .iter()
            .map(|(m, r)| (m.to_string(), r.cloned()))
            .collect();
        entries.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(
            entries,
            vec![
                ("a".to_string(), Some(ModelResult::new("yes"))),
                ("b".to_string(), None),
            ]
        );

        let inner = outcome.into_inner();
        assert_eq!(inner.len(), 2);
        assert_eq!(inner["a"], Some(ModelResult::new("yes")));
        assert_eq!(inner["b"], None);
    }

    #[test]
    fn test_outcome_serializes_as_map() {
        let mut outcome = CouncilOutcome::with_members(["a"]);
        outcome.record(
            "a".to_string(),
            Some(ModelResult::new("hi").with_reasoning("because")),
        );

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"a": {"content": "hi", "reasoning": "because"}})
        );
    }
}
