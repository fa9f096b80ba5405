//! The settlement service over a real listener, with in-memory claims and
//! scripted agents.

use std::sync::{Arc, Mutex};

use ai_client::testing::ScriptedAgent;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use relief_api::{build_router, AppState, FundingSource, FundsUnlocker};
use relief_api_client::{UnlockReceipt, UnlockRequest};
use relief_common::{ClaimRecord, ClaimState, DisasterFunding, ReliefError, UNLOCK_COMPLETED};
use relief_store::MemoryStore;
use serde_json::{json, Value};

// --- Doubles ---

struct StubFunding {
    funding: DisasterFunding,
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl FundingSource for StubFunding {
    async fn disaster_funding(&self, disaster_hash: &str) -> Result<DisasterFunding, ReliefError> {
        self.requested
            .lock()
            .unwrap()
            .push(disaster_hash.to_string());
        self.funding.clone().require_active()
    }
}

enum UnlockOutcome {
    Succeed(Option<String>),
    Fail,
}

struct StubUnlocker {
    outcome: UnlockOutcome,
    requests: Mutex<Vec<UnlockRequest>>,
}

#[async_trait]
impl FundsUnlocker for StubUnlocker {
    async fn unlock(&self, request: &UnlockRequest) -> Result<UnlockReceipt> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.outcome {
            UnlockOutcome::Succeed(tx) => Ok(UnlockReceipt {
                transaction_hash: tx.clone(),
                raw: json!({"success": true, "data": {"transactionHash": tx}}),
            }),
            UnlockOutcome::Fail => Err(anyhow!("Unlock funds failed: insufficient escrow")),
        }
    }
}

// --- Fixture ---

fn active_funding() -> DisasterFunding {
    DisasterFunding {
        title: "Valencia floods".into(),
        description: "Flash floods across the region".into(),
        target_amount: 1500.0,
        total_donated: 375.0,
        funding_progress: 25.0,
        is_active: true,
        creator: "0xabab".into(),
        timestamp: "1719999999".into(),
        donation_count: "0".into(),
    }
}

fn voting_claim() -> ClaimRecord {
    ClaimRecord {
        id: "claim-1".into(),
        event_id: Some("evt-1".into()),
        organization_name: Some("New Life Foundation".into()),
        organization_address: Some("0xorg".into()),
        claimed_amount: Some(5000.0),
        reason: "Temporary shelter for 200 families".into(),
        claim_state: ClaimState::Voting,
        claims_hash: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

struct Fixture {
    base: String,
    http: reqwest::Client,
    funding: Arc<StubFunding>,
    unlocker: Arc<StubUnlocker>,
    store: Arc<MemoryStore>,
    verify_agent: Arc<ScriptedAgent>,
    vote_agent: Arc<ScriptedAgent>,
}

struct Setup {
    funding: DisasterFunding,
    unlock: UnlockOutcome,
    store: MemoryStore,
    verify_agent: ScriptedAgent,
    vote_agent: ScriptedAgent,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            funding: active_funding(),
            unlock: UnlockOutcome::Succeed(Some("0xtx".into())),
            store: MemoryStore::new().with_claim(voting_claim()),
            verify_agent: ScriptedAgent::new(),
            vote_agent: ScriptedAgent::new(),
        }
    }
}

async fn start(setup: Setup) -> Fixture {
    let funding = Arc::new(StubFunding {
        funding: setup.funding,
        requested: Mutex::default(),
    });
    let unlocker = Arc::new(StubUnlocker {
        outcome: setup.unlock,
        requests: Mutex::default(),
    });
    let store = Arc::new(setup.store);
    let verify_agent = Arc::new(setup.verify_agent);
    let vote_agent = Arc::new(setup.vote_agent);

    let state = Arc::new(AppState {
        funding: funding.clone(),
        unlocker: unlocker.clone(),
        claims: store.clone(),
        verify_agent: verify_agent.clone(),
        vote_agent: vote_agent.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Fixture {
        base: format!("http://{addr}"),
        http: reqwest::Client::new(),
        funding,
        unlocker,
        store,
        verify_agent,
        vote_agent,
    }
}

impl Fixture {
    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .http
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn vote(&self, vote: &str) -> (u16, Value) {
        self.post(
            "/process-vote/",
            json!({"voteResult": vote, "uuid": "claim-1", "disasterHash": "0xdisaster"}),
        )
        .await
    }

    fn claim(&self) -> ClaimRecord {
        self.store.claim("claim-1").unwrap()
    }
}

// --- Fact-check ---

#[tokio::test]
async fn fact_check_returns_normalized_verdict_with_context() {
    let fx = start(Setup {
        verify_agent: ScriptedAgent::always(
            r#"{"amount": "$1,200.50 USD", "comment": "Work verified", "sources": "https://ngo.example/report"}"#,
        ),
        ..Setup::default()
    })
    .await;

    let (status, body) = fx
        .post(
            "/fact-check",
            json!({"statement": "We fed 300 families", "disaster_hash": "abc123"}),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["amount"], 1200.5);
    assert_eq!(body["comment"], "Work verified");
    assert_eq!(body["sources"], json!(["https://ngo.example/report"]));
    assert_eq!(body["disaster_title"], "Valencia floods");
    assert_eq!(body["target_amount_usdc"], 1500.0);
    assert_eq!(body["total_donated_usdc"], 375.0);
    assert_eq!(body["funding_progress"], 25.0);
    assert_eq!(body["donation_count"], "0");
    assert_eq!(body["created_timestamp"], "1719999999");

    assert_eq!(*fx.funding.requested.lock().unwrap(), vec!["0xabc123"]);
    let prompt = &fx.verify_agent.calls()[0];
    assert!(prompt.starts_with("Petition: We fed 300 families\nDisaster: Valencia floods\n"));
}

#[tokio::test]
async fn fact_check_with_unstructured_reply_keeps_text_as_comment() {
    let fx = start(Setup {
        verify_agent: ScriptedAgent::always("I could not verify this petition."),
        ..Setup::default()
    })
    .await;

    let (status, body) = fx
        .post(
            "/fact-check",
            json!({"statement": "Shelter", "disaster_hash": "0xabc"}),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["amount"], Value::Null);
    assert_eq!(body["comment"], "I could not verify this petition.");
    assert_eq!(body["sources"], json!([]));
    assert_eq!(body["raw_agent_response"], "I could not verify this petition.");
}

#[tokio::test]
async fn fact_check_rejects_inactive_disaster() {
    let fx = start(Setup {
        funding: DisasterFunding {
            is_active: false,
            ..active_funding()
        },
        verify_agent: ScriptedAgent::always("unused"),
        ..Setup::default()
    })
    .await;

    let (status, body) = fx
        .post("/fact-check", json!({"statement": "s", "disaster_hash": "0xabc"}))
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "upstream");
    assert_eq!(body["message"], "Disaster is not active");
    assert_eq!(fx.verify_agent.call_count(), 0);
}

#[tokio::test]
async fn fact_check_agent_failure_is_internal() {
    let fx = start(Setup {
        verify_agent: ScriptedAgent::new().fail_with("agent offline"),
        ..Setup::default()
    })
    .await;

    let (status, body) = fx
        .post("/fact-check", json!({"statement": "s", "disaster_hash": "0xabc"}))
        .await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "internal");
}

// --- Votes ---

#[tokio::test]
async fn fact_check_without_statement_is_a_json_bad_request() {
    let fx = start(Setup::default()).await;

    let (status, body) = fx
        .post("/fact-check", json!({"disaster_hash": "0xabc"}))
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "bad_request");
    assert!(body["message"].as_str().unwrap().contains("statement"));
    assert!(fx.funding.requested.lock().unwrap().is_empty());
    assert_eq!(fx.verify_agent.call_count(), 0);
}

#[tokio::test]
async fn unknown_vote_is_rejected_before_storage() {
    let fx = start(Setup {
        store: MemoryStore::new(),
        ..Setup::default()
    })
    .await;

    let (status, body) = fx.vote("maybe").await;

    assert_eq!(status, 400);
    assert_eq!(
        body["message"],
        "Invalid vote result 'maybe'. Must be: approve, reject, higher, or lower."
    );
    assert_eq!(fx.store.claim_writes(), 0);
}

#[tokio::test]
async fn vote_without_result_is_a_json_bad_request() {
    let fx = start(Setup::default()).await;

    let (status, body) = fx
        .post("/process-vote/", json!({"uuid": "claim-1"}))
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(fx.store.claim_writes(), 0);
    assert_eq!(fx.claim().claim_state, ClaimState::Voting);
}

#[tokio::test]
async fn unparseable_vote_body_is_a_json_bad_request() {
    let fx = start(Setup::default()).await;

    let resp = fx
        .http
        .post(format!("{}/process-vote/", fx.base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");
    assert_eq!(fx.store.claim_writes(), 0);
}

#[tokio::test]
async fn missing_claim_is_not_found() {
    let fx = start(Setup {
        store: MemoryStore::new(),
        ..Setup::default()
    })
    .await;

    let (status, body) = fx.vote("reject").await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "UUID not found in DB.");
}

#[tokio::test]
async fn reject_marks_claim_rejected() {
    let fx = start(Setup::default()).await;

    let (status, body) = fx.vote("reject").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "❌ Claim rejected.");
    assert_eq!(fx.claim().claim_state, ClaimState::Rejected);
    assert_eq!(fx.claim().claimed_amount, Some(5000.0));
}

#[tokio::test]
async fn approve_unlocks_funds_and_records_transaction() {
    let fx = start(Setup::default()).await;

    let (status, body) = fx.vote("  Approve ").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "✅ Claim approved & funds unlocked successfully.");
    assert_eq!(body["claimed_amount_usdc"], "5000");
    assert_eq!(body["recipient"], "0xorg");
    assert_eq!(body["disasterHash"], "0xdisaster");
    assert_eq!(body["unlockResponse"]["data"]["transactionHash"], "0xtx");

    let requests = fx.unlocker.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, "5000");
    assert_eq!(requests[0].recipient, "0xorg");

    let claim = fx.claim();
    assert_eq!(claim.claim_state, ClaimState::Approved);
    assert_eq!(claim.claims_hash.as_deref(), Some("0xtx"));
}

#[tokio::test]
async fn approve_without_transaction_hash_records_placeholder() {
    let fx = start(Setup {
        unlock: UnlockOutcome::Succeed(None),
        ..Setup::default()
    })
    .await;

    let (status, _) = fx.vote("approve").await;
    assert_eq!(status, 200);
    assert_eq!(fx.claim().claims_hash.as_deref(), Some(UNLOCK_COMPLETED));
}

#[tokio::test]
async fn failed_unlock_leaves_claim_untouched() {
    let fx = start(Setup {
        unlock: UnlockOutcome::Fail,
        ..Setup::default()
    })
    .await;

    let (status, body) = fx.vote("approve").await;

    assert_eq!(status, 500);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Approval failed:"));
    assert_eq!(fx.store.claim_writes(), 0);
    assert_eq!(fx.claim().claim_state, ClaimState::Voting);
}

#[tokio::test]
async fn approve_requires_recipient_address() {
    let fx = start(Setup {
        store: MemoryStore::new().with_claim(ClaimRecord {
            organization_address: None,
            ..voting_claim()
        }),
        ..Setup::default()
    })
    .await;

    let (status, body) = fx.vote("approve").await;

    assert_eq!(status, 400);
    assert_eq!(body["message"], "Missing organization_address in DB.");
    assert!(fx.unlocker.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn approve_requires_disaster_hash() {
    let fx = start(Setup::default()).await;

    let (status, _) = fx
        .post(
            "/process-vote",
            json!({"voteResult": "approve", "uuid": "claim-1"}),
        )
        .await;

    assert_eq!(status, 400);
    assert!(fx.unlocker.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn lower_vote_requeues_with_revised_amount() {
    let fx = start(Setup {
        vote_agent: ScriptedAgent::always("I suggest 3200 USDC instead."),
        ..Setup::default()
    })
    .await;

    let (status, body) = fx.vote("LOWER").await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "🔁 Claim sent back for re-voting with updated amount.");
    assert_eq!(body["newAmount"], 3200);
    assert_eq!(body["previousAmount"], 5000.0);

    let prompt = &fx.vote_agent.calls()[0];
    assert!(prompt.contains("requested 5000 USDC"));
    assert!(prompt.contains("Voters believe the amount should be 'lower'."));

    let claim = fx.claim();
    assert_eq!(claim.claim_state, ClaimState::Voting);
    assert_eq!(claim.claimed_amount, Some(3200.0));
}

#[tokio::test]
async fn revised_amount_is_at_least_one() {
    let fx = start(Setup {
        vote_agent: ScriptedAgent::always("0"),
        ..Setup::default()
    })
    .await;

    let (status, body) = fx.vote("lower").await;
    assert_eq!(status, 200);
    assert_eq!(body["newAmount"], 1);
    assert_eq!(fx.claim().claimed_amount, Some(1.0));
}

#[tokio::test]
async fn reply_without_digits_changes_nothing() {
    let fx = start(Setup {
        vote_agent: ScriptedAgent::always("Keep the amount as is."),
        ..Setup::default()
    })
    .await;

    let (status, _) = fx.vote("higher").await;
    assert_eq!(status, 500);
    assert_eq!(fx.store.claim_writes(), 0);
    assert_eq!(fx.claim().claimed_amount, Some(5000.0));
}

// --- Health and parser self-test ---

#[tokio::test]
async fn health_answers_get_and_head() {
    let fx = start(Setup::default()).await;

    let resp = fx.http.get(format!("{}/health", fx.base)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"status": "healthy", "service": "disaster-relief-fact-checker"})
    );

    let resp = fx.http.head(format!("{}/health", fx.base)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn parser_self_test_reports_each_fixture() {
    let fx = start(Setup::default()).await;

    let body: Value = fx
        .http
        .get(format!("{}/test-parser", fx.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let results = body["test_results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["test_case"], 1);
    assert_eq!(results[0]["parsed"]["comment"], "Test JSON");
    assert_eq!(results[1]["parsed"]["amount"], 2000);
    assert_eq!(results[1]["parsed"]["sources"], "http://example.com");
    assert_eq!(
        results[2]["parsed"]["reasoning"],
        "The New Life Foundation has provided essential services"
    );
    assert!(results.iter().all(|r| r["status"] == "success"));
}
