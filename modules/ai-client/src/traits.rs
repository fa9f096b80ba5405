use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// ChatAgent Trait
// =============================================================================

/// A hosted LLM endpoint that answers one user message with one reply.
///
/// No conversation state is kept between calls: every `reply` is a fresh
/// single-message exchange.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String>;
}
