use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::info;

use crate::types::{DonationRecord, PurchaseRecord};

pub const PURCHASES_TABLE: &str = "ticket_purchases";
pub const DONATIONS_TABLE: &str = "donations";

const CREATE_PURCHASES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ticket_purchases (
    user_token TEXT,
    place_id INT,
    event_time TIMESTAMP,
    purchase_time TIMESTAMP DEFAULT (now() AT TIME ZONE 'utc'),
    cost INT
)"#;

const CREATE_DONATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS donations (
    user_token TEXT,
    collection_id INT,
    donation_time TIMESTAMP DEFAULT (now() AT TIME ZONE 'utc'),
    amount INT
)"#;

/// Enumeration of errors for operations with the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failed with: {0}")]
    Connection(sqlx::Error),
    #[error("failed to create tables: {0}")]
    Schema(sqlx::Error),
    #[error("insert into {table} failed with: {error}")]
    Insert {
        table: &'static str,
        error: sqlx::Error,
    },
}

/// Destination of validated records.
#[async_trait]
pub trait RecordSink {
    async fn insert_purchase(&self, purchase: &PurchaseRecord) -> Result<(), StoreError>;

    async fn insert_donation(&self, donation: &DonationRecord) -> Result<(), StoreError>;
}

/// Append-only record store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(StoreError::Connection)?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create both tables unless they already exist. Safe to run on every start.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        for statement in [CREATE_PURCHASES_TABLE, CREATE_DONATIONS_TABLE] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(StoreError::Schema)?;
        }
        info!("Tables created or already exist");
        Ok(())
    }
}

#[async_trait]
impl RecordSink for PgStore {
    async fn insert_purchase(&self, purchase: &PurchaseRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT INTO ticket_purchases (user_token, place_id, event_time, purchase_time, cost)
VALUES ($1, $2, $3, COALESCE($4, now() AT TIME ZONE 'utc'), $5)
            "#,
        )
        .bind(&purchase.user_token)
        .bind(purchase.place_id)
        .bind(purchase.event_time.map(|t| t.naive_utc()))
        .bind(purchase.purchase_time().map(|t| t.naive_utc()))
        .bind(purchase.cost)
        .execute(&self.pool)
        .await
        .map_err(|error| StoreError::Insert {
            table: PURCHASES_TABLE,
            error,
        })?;

        Ok(())
    }

    async fn insert_donation(&self, donation: &DonationRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
INSERT INTO donations (user_token, collection_id, donation_time, amount)
VALUES ($1, $2, COALESCE($3, now() AT TIME ZONE 'utc'), $4)
            "#,
        )
        .bind(&donation.user_token)
        .bind(donation.collection_id)
        .bind(donation.donation_time().map(|t| t.naive_utc()))
        .bind(donation.amount)
        .execute(&self.pool)
        .await
        .map_err(|error| StoreError::Insert {
            table: DONATIONS_TABLE,
            error,
        })?;

        Ok(())
    }
}
