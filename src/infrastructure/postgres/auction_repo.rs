use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Postgres, QueryBuilder, Transaction,
};
use tracing::{debug, error, info};

use crate::domain::{error::IngestionError, models::AuctionRecord, ports::AuctionRepository};

const AUCTION_COLUMNS: &str =
    "realm_id, auction_house_id, item_id, interval, timestamp, quantity, min, max, p05, p10, p25, p50, p75, p90";

// 14 binds per row, well under the 65535 parameter limit.
const ROWS_PER_STATEMENT: usize = 1000;

pub struct PgAuctionRepository {
    pool: PgPool,
}

impl PgAuctionRepository {
    /// Connects eagerly so a bad connection string fails at startup.
    pub async fn connect(connection_string: &str, max_connections: u32) -> Result<Self, IngestionError> {
        debug!("Connecting to Postgres with up to {} connections", max_connections);
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .map_err(|e| {
                error!("Failed to connect to Postgres: {}", e);
                IngestionError::Transport(format!("error connecting to database: {}", e))
            })?;
        info!("Connected to Postgres");
        Ok(Self::new(pool))
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_into(
        tx: &mut Transaction<'_, Postgres>,
        table: &str,
        auctions: &[AuctionRecord],
    ) -> Result<(), IngestionError> {
        for chunk in auctions.chunks(ROWS_PER_STATEMENT) {
            let mut qb: QueryBuilder<'_, Postgres> =
                QueryBuilder::new(format!("INSERT INTO {} ({}) ", table, AUCTION_COLUMNS));
            qb.push_values(chunk, |mut b, a| {
                b.push_bind(a.realm_id)
                    .push_bind(a.auction_house_id)
                    .push_bind(a.item_id)
                    .push_bind(a.interval)
                    .push_bind(a.timestamp)
                    .push_bind(a.quantity)
                    .push_bind(a.min)
                    .push_bind(a.max)
                    .push_bind(a.p05)
                    .push_bind(a.p10)
                    .push_bind(a.p25)
                    .push_bind(a.p50)
                    .push_bind(a.p75)
                    .push_bind(a.p90);
            });
            qb.build().execute(&mut **tx).await?;
            debug!("Inserted {} rows into {}", chunk.len(), table);
        }
        Ok(())
    }
}

#[async_trait]
impl AuctionRepository for PgAuctionRepository {
    async fn get_item_ids(&self) -> Result<HashSet<i32>, IngestionError> {
        let ids: Vec<i32> = sqlx::query_scalar("SELECT id FROM items")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to query item ids: {}", e);
                IngestionError::Transport(format!("error while querying item ids: {}", e))
            })?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_auctions(&self, auctions: &[AuctionRecord]) -> Result<(), IngestionError> {
        if auctions.is_empty() {
            info!("No auctions to insert into history");
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        Self::insert_into(&mut tx, "auctions", auctions).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_current_auctions(&self, auctions: &[AuctionRecord]) -> Result<(), IngestionError> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM current_auctions")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        debug!("Removed {} rows from current_auctions", deleted);
        Self::insert_into(&mut tx, "current_auctions", auctions).await?;
        tx.commit().await?;
        Ok(())
    }
}
