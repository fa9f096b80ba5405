// Seams between the HTTP handlers and the systems they settle claims against.
//
// FundingSource has two implementations: the disaster read API and the relief
// contract itself. Both reject unknown and inactive disasters with the
// matching ReliefError so handlers map them the same way.

use anyhow::Result;
use async_trait::async_trait;
use relief_api_client::{DisasterFetchClient, UnlockClient, UnlockReceipt, UnlockRequest};
use relief_chain::{ChainError, ContractReader};
use relief_common::{DisasterFunding, ReliefError};

#[async_trait]
pub trait FundingSource: Send + Sync {
    /// Funding state of an active disaster.
    async fn disaster_funding(&self, disaster_hash: &str) -> Result<DisasterFunding, ReliefError>;
}

#[async_trait]
impl FundingSource for DisasterFetchClient {
    async fn disaster_funding(&self, disaster_hash: &str) -> Result<DisasterFunding, ReliefError> {
        self.fetch(disaster_hash)
            .await
            .map_err(|e| ReliefError::Upstream(e.to_string()))?
            .require_active()
    }
}

#[async_trait]
impl FundingSource for ContractReader {
    async fn disaster_funding(&self, disaster_hash: &str) -> Result<DisasterFunding, ReliefError> {
        ContractReader::disaster_funding(self, disaster_hash)
            .await
            .map_err(|e| match e {
                ChainError::NotFound => ReliefError::DisasterNotFound(e.to_string()),
                ChainError::Inactive => ReliefError::DisasterInactive(e.to_string()),
                other => ReliefError::Upstream(other.to_string()),
            })
    }
}

/// Releases escrowed funds to an approved claimant.
#[async_trait]
pub trait FundsUnlocker: Send + Sync {
    async fn unlock(&self, request: &UnlockRequest) -> Result<UnlockReceipt>;
}

#[async_trait]
impl FundsUnlocker for UnlockClient {
    async fn unlock(&self, request: &UnlockRequest) -> Result<UnlockReceipt> {
        Ok(UnlockClient::unlock(self, request).await?)
    }
}
