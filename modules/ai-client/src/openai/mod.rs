mod client;
pub(crate) mod types;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::traits::ChatAgent;
use crate::util::truncate_to_char_boundary;
use client::{OpenAiClient, OPENAI_API_URL};

// =============================================================================
// OpenAi Agent
// =============================================================================

/// Chat client for any OpenAI-compatible `/chat/completions` endpoint.
///
/// Hosted agents are addressed by swapping the base URL and using the agent id
/// as the model name; each agent carries its own API key.
#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    preamble: Option<String>,
    web_search: bool,
    max_completion_tokens: Option<u32>,
    http: reqwest::Client,
}

impl std::fmt::Debug for OpenAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAi")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("web_search", &self.web_search)
            .finish_non_exhaustive()
    }
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            preamble: None,
            web_search: false,
            max_completion_tokens: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Share a preconfigured HTTP client (timeouts, pools) across agents.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// System message sent ahead of every user message.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    /// Enable browsing on search-capable models.
    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }

    pub fn with_max_completion_tokens(mut self, max: u32) -> Self {
        self.max_completion_tokens = Some(max);
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    fn client(&self) -> OpenAiClient<'_> {
        OpenAiClient::new(&self.api_key, &self.http, self.base_url())
    }

    fn build_request(&self, user: &str) -> types::ChatRequest {
        let mut request = types::ChatRequest::new(&self.model);

        if let Some(ref preamble) = self.preamble {
            request = request.message(types::WireMessage::system(preamble));
        }
        request = request.message(types::WireMessage::user(user));

        if let Some(max) = self.max_completion_tokens {
            request = if types::uses_max_completion_tokens(&self.model) {
                request.max_completion_tokens(max)
            } else {
                request.max_tokens(max)
            };
        }

        if self.web_search {
            request = request.web_search();
        }

        request
    }

    /// Send one user message and return the assistant's reply.
    pub async fn ask(&self, user: &str) -> Result<String> {
        let request = self.build_request(user);
        let reply = self.client().first_reply(&request).await?;
        debug!(
            model = %self.model,
            reply = truncate_to_char_boundary(&reply, 200),
            "Agent replied"
        );
        Ok(reply)
    }
}

// =============================================================================
// ChatAgent Implementation
// =============================================================================

#[async_trait]
impl ChatAgent for OpenAi {
    async fn reply(&self, message: &str) -> Result<String> {
        self.ask(message).await
    }
}
