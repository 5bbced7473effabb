//! Scripted backends for unit tests.

use async_trait::async_trait;
use deckexplain_llm::{LlmBackend, LlmError, LlmInvocation, LlmResult};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

type Script = dyn Fn(&LlmInvocation, u32) -> Result<String, LlmError> + Send + Sync;

/// Backend whose reply is computed by a closure from the invocation and the
/// 1-based global call number. Records every invocation it sees.
pub(crate) struct ScriptedBackend {
    script: Box<Script>,
    calls: AtomicU32,
    seen: Mutex<Vec<LlmInvocation>>,
}

impl ScriptedBackend {
    pub(crate) fn new(
        script: impl Fn(&LlmInvocation, u32) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always answers `reply`.
    pub(crate) fn replying(reply: &'static str) -> Self {
        Self::new(move |_, _| Ok(reply.to_string()))
    }

    /// Always fails with `err`.
    pub(crate) fn failing(err: LlmError) -> Self {
        Self::new(move |_, _| Err(err.clone()))
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn seen(&self) -> Vec<LlmInvocation> {
        self.seen.lock().unwrap().clone()
    }
}

/// Text of the user message of an invocation.
pub(crate) fn user_text(inv: &LlmInvocation) -> &str {
    inv.messages
        .last()
        .map(|m| m.content.as_str())
        .unwrap_or_default()
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(inv.clone());
        (self.script)(&inv, n).map(|text| LlmResult::new(text, "scripted", "scripted-model"))
    }
}
