use ai_client::{strip_code_blocks, OpenAi};
use serde::Deserialize;
use tracing::warn;

pub const DISCOVERY_PREAMBLE: &str = "You are a helpful assistant that finds the most recent natural or human-made disaster \
in the world using up-to-date web search. \
Respond STRICTLY in the following JSON format:\n\n\
{\n  \"title\": \"short title of the disaster\",\n  \"description\": \"concise summary within 150 characters\",\n  \"readmore\": \"URL to read more\",\n  \"location\": \"place or country where the disaster occurred\"\n}\n\n\
MOST IMPORTANT: The output should NEVER have words like ```json and so on. Just the JSON styled output in the specified format should be present. \
NOTE: The entire content including the title, description, readmore and location should be within 200 characters. \
Do not include anything else outside this JSON structure.";

pub const DISCOVERY_QUERY: &str = "Find the most recent natural disaster in the world";

const DISCOVERY_MAX_TOKENS: u32 = 500;

/// Web-search chat model that answers the discovery query.
pub fn discovery_agent(api_key: &str, model: &str, http: reqwest::Client) -> OpenAi {
    OpenAi::new(api_key, model)
        .with_http_client(http)
        .with_preamble(DISCOVERY_PREAMBLE)
        .with_web_search()
        .with_max_completion_tokens(DISCOVERY_MAX_TOKENS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDisaster {
    pub title: String,
    pub description: String,
    pub read_more: String,
    pub location: String,
}

#[derive(Deserialize)]
struct DiscoveryJson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    readmore: String,
    #[serde(default)]
    location: String,
}

/// Read the discovery reply. JSON first, then one field per line.
pub fn parse_discovery(reply: &str) -> DiscoveredDisaster {
    match serde_json::from_str::<DiscoveryJson>(strip_code_blocks(reply)) {
        Ok(json) => DiscoveredDisaster {
            title: json.title.trim().to_string(),
            description: json.description.trim().to_string(),
            read_more: json.readmore.trim().to_string(),
            location: json.location.trim().to_string(),
        },
        Err(e) => {
            warn!(error = %e, "Discovery reply is not JSON, reading fields by line");
            parse_positional(reply)
        }
    }
}

fn parse_positional(reply: &str) -> DiscoveredDisaster {
    let lines: Vec<&str> = reply.split('\n').collect();
    let field = |index: usize, prefix: &str, default: &str| {
        lines
            .get(index)
            .map(|line| line.replace(prefix, "").trim().to_string())
            .unwrap_or_else(|| default.to_string())
    };
    DiscoveredDisaster {
        title: field(0, "Title: ", "Unknown Disaster"),
        description: field(1, "Description: ", "No description available"),
        read_more: field(2, "Read More: ", ""),
        location: field(3, "Disaster Location: ", "Unknown Location"),
    }
}
