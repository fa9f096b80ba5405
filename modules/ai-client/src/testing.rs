// Test double for ChatAgent.
//
// ScriptedAgent replays queued replies in order and records every message it
// was sent, so callers can assert on prompts without any network.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::traits::ChatAgent;

enum Scripted {
    Reply(String),
    Fail(String),
}

/// Queue-backed agent. Once the queue is drained it falls back to the
/// `always` reply, or fails if none was set.
#[derive(Default)]
pub struct ScriptedAgent {
    queue: Mutex<VecDeque<Scripted>>,
    always: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// An agent that answers every message with the same text.
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            always: Some(reply.into()),
            ..Self::default()
        }
    }

    pub fn reply_with(self, reply: impl Into<String>) -> Self {
        self.push(Scripted::Reply(reply.into()));
        self
    }

    pub fn fail_with(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Fail(message.into()));
        self
    }

    fn push(&self, entry: Scripted) {
        self.queue
            .lock()
            .expect("scripted queue poisoned")
            .push_back(entry);
    }

    /// Messages received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call log poisoned").len()
    }
}

#[async_trait]
impl ChatAgent for ScriptedAgent {
    async fn reply(&self, message: &str) -> Result<String> {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(message.to_string());

        let next = self.queue.lock().expect("scripted queue poisoned").pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(msg)) => Err(anyhow!(msg)),
            None => self
                .always
                .clone()
                .ok_or_else(|| anyhow!("ScriptedAgent: no reply scripted for {message:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_falls_back() {
        let agent = ScriptedAgent {
            always: Some("fallback".to_string()),
            ..ScriptedAgent::default()
        }
        .reply_with("first")
        .fail_with("boom");

        assert_eq!(agent.reply("a").await.unwrap(), "first");
        assert!(agent.reply("b").await.is_err());
        assert_eq!(agent.reply("c").await.unwrap(), "fallback");
        assert_eq!(agent.calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn empty_script_fails() {
        let agent = ScriptedAgent::new();
        assert!(agent.reply("hello").await.is_err());
        assert_eq!(agent.call_count(), 1);
    }
}
