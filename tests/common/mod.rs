//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use deckexplain::{LlmBackend, LlmError, LlmInvocation, LlmResult};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Answers the topic prompt with a fixed topic and every slide prompt with
/// `explained <label>`. Labels in `failing` always fail with an outage.
pub struct FakeBackend {
    topic: String,
    failing: HashSet<String>,
    calls: AtomicU32,
    labels: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            failing: HashSet::new(),
            calls: AtomicU32::new(0),
            labels: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.failing.extend(labels);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for FakeBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.labels.lock().unwrap().push(inv.label.clone());

        if self.failing.contains(&inv.label) {
            return Err(LlmError::ProviderOutage("503 Service Unavailable".to_string()));
        }
        let reply = if inv.label == "topic" {
            self.topic.clone()
        } else {
            format!("explained {}", inv.label)
        };
        Ok(LlmResult::new(reply, "fake", "fake-model"))
    }
}
