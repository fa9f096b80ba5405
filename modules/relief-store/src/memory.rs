//! In-memory tables for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use relief_common::{ClaimRecord, ClaimUpdate, DisasterRecord};

use crate::error::{Result, StoreError};
use crate::traits::{ClaimStore, DisasterStore};

#[derive(Default)]
pub struct MemoryStore {
    disasters: Mutex<Vec<DisasterRecord>>,
    claims: Mutex<HashMap<String, ClaimRecord>>,
    claim_writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_claim(self, claim: ClaimRecord) -> Self {
        self.claims
            .lock()
            .expect("claims lock poisoned")
            .insert(claim.id.clone(), claim);
        self
    }

    /// Make every subsequent write fail with a database error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn disasters(&self) -> Vec<DisasterRecord> {
        self.disasters.lock().expect("disasters lock poisoned").clone()
    }

    pub fn claim(&self, id: &str) -> Option<ClaimRecord> {
        self.claims.lock().expect("claims lock poisoned").get(id).cloned()
    }

    /// Number of claim updates applied so far.
    pub fn claim_writes(&self) -> usize {
        self.claim_writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl DisasterStore for MemoryStore {
    async fn put_disaster(&self, record: &DisasterRecord) -> Result<()> {
        self.check_writable()?;
        self.disasters
            .lock()
            .expect("disasters lock poisoned")
            .push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl ClaimStore for MemoryStore {
    async fn get_claim(&self, id: &str) -> Result<Option<ClaimRecord>> {
        Ok(self.claim(id))
    }

    async fn apply_claim_update(&self, id: &str, update: &ClaimUpdate) -> Result<()> {
        self.check_writable()?;
        let mut claims = self.claims.lock().expect("claims lock poisoned");
        let claim = claims
            .get_mut(id)
            .ok_or_else(|| StoreError::ClaimNotFound(id.to_string()))?;

        claim.claim_state = update.claim_state;
        if let Some(hash) = &update.claims_hash {
            claim.claims_hash = Some(hash.clone());
        }
        if let Some(amount) = update.claimed_amount {
            claim.claimed_amount = Some(amount);
        }
        claim.updated_at = Utc::now();
        self.claim_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
