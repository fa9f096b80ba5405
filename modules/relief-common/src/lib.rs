pub mod agent_response;
pub mod amount;
pub mod config;
pub mod error;
pub mod settlement;
pub mod types;

pub use agent_response::{
    parse_agent_response, ParseStrategy, ParsedResponse, SELF_TEST_FIXTURES,
};
pub use amount::{first_digit_run, normalize_amount};
pub use config::{AgentConfig, FundingSourceKind, IngestConfig, ServiceConfig};
pub use error::ReliefError;
pub use settlement::{
    adjustment_prompt, revised_amount, transition, AmountDirection, ClaimUpdate,
    SettlementAction, Transition, VoteResult, UNLOCK_COMPLETED,
};
pub use types::*;
