use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{error::IngestionError, models::AuctionRecord};

#[async_trait]
pub trait FileFetcher: Send + Sync {
    async fn fetch_file(&self, bucket: &str, key: &str) -> Result<Vec<u8>, IngestionError>;
}

/// Relational store for auction history, the current snapshot and known items.
#[async_trait]
pub trait AuctionRepository: Send + Sync {
    async fn get_item_ids(&self) -> Result<HashSet<i32>, IngestionError>;

    async fn insert_auctions(&self, auctions: &[AuctionRecord]) -> Result<(), IngestionError>;

    /// Replaces the whole current-auctions table with `auctions`.
    async fn replace_current_auctions(&self, auctions: &[AuctionRecord]) -> Result<(), IngestionError>;
}

/// Work queue receiving newly discovered item ids.
#[async_trait]
pub trait ItemIdPublisher: Send + Sync {
    /// Sends at most [`MAX_BATCH_SIZE`](crate::domain::fan_out::MAX_BATCH_SIZE) ids in one call.
    async fn send_batch(&self, item_ids: &[i32]) -> Result<(), IngestionError>;
}
