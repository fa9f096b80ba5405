use async_trait::async_trait;
use relief_common::{ClaimRecord, ClaimUpdate, DisasterRecord};

use crate::error::Result;

/// Append-only table of discovered disasters.
#[async_trait]
pub trait DisasterStore: Send + Sync {
    async fn put_disaster(&self, record: &DisasterRecord) -> Result<()>;
}

/// Claims keyed by id.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn get_claim(&self, id: &str) -> Result<Option<ClaimRecord>>;

    /// Write the fields set in `update`. Fails with `ClaimNotFound` if the
    /// claim does not exist.
    async fn apply_claim_update(&self, id: &str, update: &ClaimUpdate) -> Result<()>;
}
