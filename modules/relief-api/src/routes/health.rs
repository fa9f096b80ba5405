use axum::Json;
use relief_common::{parse_agent_response, SELF_TEST_FIXTURES};
use serde_json::{json, Value};

pub const SERVICE_NAME: &str = "disaster-relief-fact-checker";

/// GET|HEAD /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

/// GET /test-parser: run the reply parser over canned agent replies.
pub async fn test_parser() -> Json<Value> {
    let results: Vec<Value> = SELF_TEST_FIXTURES
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let parsed = parse_agent_response(input);
            json!({
                "test_case": i + 1,
                "input": input,
                "parsed": parsed.value,
                "strategy": parsed.strategy.to_string(),
                "status": "success",
            })
        })
        .collect();
    Json(json!({ "test_results": results }))
}
