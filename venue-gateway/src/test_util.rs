//! Test doubles shared by unit and integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::transport::{GenerationRequest, InferenceTransport, TransportError};

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<String, TransportError>>,
    requests: Vec<GenerationRequest>,
    started_at: Vec<Instant>,
    delay: Option<Duration>,
}

/// Transport that replays queued replies and records every call.
///
/// With an empty queue a call fails with a communication error.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_ok(&self, text: &str) {
        self.script().replies.push_back(Ok(text.to_string()));
    }

    pub fn push_err(&self, error: TransportError) {
        self.script().replies.push_back(Err(error));
    }

    /// Hold every reply for `delay` before returning it.
    pub fn set_delay(&self, delay: Duration) {
        self.script().delay = Some(delay);
    }

    pub fn call_count(&self) -> usize {
        self.script().requests.len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.script().requests.clone()
    }

    /// Start time of each call, on the tokio clock.
    pub fn call_starts(&self) -> Vec<Instant> {
        self.script().started_at.clone()
    }
}

#[async_trait]
impl InferenceTransport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, TransportError> {
        let (reply, delay) = {
            let mut script = self.script();
            script.requests.push(request.clone());
            script.started_at.push(Instant::now());
            let reply = script.replies.pop_front().unwrap_or_else(|| {
                Err(TransportError::Communication("no scripted reply".to_string()))
            });
            (reply, script.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}
