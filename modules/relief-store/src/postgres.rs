use async_trait::async_trait;
use chrono::{DateTime, Utc};
use relief_common::{ClaimRecord, ClaimUpdate, DisasterRecord};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::traits::{ClaimStore, DisasterStore};

/// Postgres-backed disaster and claim tables.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    id: String,
    event_id: Option<String>,
    organization_name: Option<String>,
    organization_address: Option<String>,
    claimed_amount: Option<f64>,
    reason: String,
    claim_state: String,
    claims_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for ClaimRecord {
    type Error = StoreError;

    fn try_from(row: ClaimRow) -> Result<Self> {
        let claim_state = row
            .claim_state
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("claim {}: state '{}'", row.id, row.claim_state)))?;
        Ok(ClaimRecord {
            id: row.id,
            event_id: row.event_id,
            organization_name: row.organization_name,
            organization_address: row.organization_address,
            claimed_amount: row.claimed_amount,
            reason: row.reason,
            claim_state,
            claims_hash: row.claims_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Store migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DisasterStore for PgStore {
    async fn put_disaster(&self, record: &DisasterRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO disaster_events
                (id, title, description, source, disaster_location,
                 estimated_amount_required, disaster_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.source)
        .bind(&record.disaster_location)
        .bind(record.estimated_amount_required.to_string())
        .bind(&record.disaster_hash)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ClaimStore for PgStore {
    async fn get_claim(&self, id: &str) -> Result<Option<ClaimRecord>> {
        let row = sqlx::query_as::<_, ClaimRow>(
            r#"
            SELECT id, event_id, organization_name, organization_address, claimed_amount,
                   reason, claim_state, claims_hash, created_at, updated_at
            FROM relief_claims
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ClaimRecord::try_from).transpose()
    }

    async fn apply_claim_update(&self, id: &str, update: &ClaimUpdate) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE relief_claims
            SET claim_state    = $2,
                claims_hash    = COALESCE($3, claims_hash),
                claimed_amount = COALESCE($4, claimed_amount),
                updated_at     = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.claim_state.as_str())
        .bind(update.claims_hash.as_deref())
        .bind(update.claimed_amount)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ClaimNotFound(id.to_string()));
        }
        Ok(())
    }
}
