use std::sync::Arc;
use tracing::{debug, error, info};

use crate::{
    domain::{
        error::IngestionError,
        events::{decode_s3_event, decode_sns_notification},
        fan_out::publish_item_ids,
        item_diff::new_item_ids,
        models::{AuctionRecord, FileToProcess, IngestionMode},
        partition::PartitionKey,
        ports::{AuctionRepository, FileFetcher, ItemIdPublisher},
        row_mapper::RowContext,
    },
    infrastructure::parsers::csv_parser::parse_auction_csv,
};

/// What one file contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileReport {
    pub auctions: usize,
    pub new_item_ids: usize,
}

enum Pipeline {
    Discovery { item_publisher: Arc<dyn ItemIdPublisher> },
    Bulk,
}

pub struct IngestionService {
    pipeline: Pipeline,
    file_fetcher: Arc<dyn FileFetcher>,
    auction_repo: Arc<dyn AuctionRepository>,
}

impl IngestionService {
    /// Snapshot ingestion: history insert, current-auctions replace, new item fan-out.
    pub fn discovery(
        file_fetcher: Arc<dyn FileFetcher>,
        auction_repo: Arc<dyn AuctionRepository>,
        item_publisher: Arc<dyn ItemIdPublisher>,
    ) -> Self {
        Self {
            pipeline: Pipeline::Discovery { item_publisher },
            file_fetcher,
            auction_repo,
        }
    }

    /// Historical load: history insert only, timestamps from the partitioned key.
    pub fn bulk(file_fetcher: Arc<dyn FileFetcher>, auction_repo: Arc<dyn AuctionRepository>) -> Self {
        Self {
            pipeline: Pipeline::Bulk,
            file_fetcher,
            auction_repo,
        }
    }

    pub fn mode(&self) -> IngestionMode {
        match self.pipeline {
            Pipeline::Discovery { .. } => IngestionMode::Discovery,
            Pipeline::Bulk => IngestionMode::Bulk,
        }
    }

    /// Handles one trigger message. Files are processed in order and the
    /// first failure aborts the rest.
    pub async fn handle_message(&self, body: &str) -> Result<Vec<FileReport>, IngestionError> {
        let files = match self.pipeline {
            Pipeline::Discovery { .. } => decode_sns_notification(body)?,
            Pipeline::Bulk => decode_s3_event(body)?,
        };
        debug!("Message names {} file(s)", files.len());

        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            reports.push(self.process_file(file).await?);
        }
        Ok(reports)
    }

    pub async fn process_file(&self, file: FileToProcess) -> Result<FileReport, IngestionError> {
        info!("Starting file processing: s3://{}/{}", file.bucket, file.key);

        let result = match &self.pipeline {
            Pipeline::Discovery { item_publisher } => self.process_snapshot(&file, item_publisher.as_ref()).await,
            Pipeline::Bulk => self.process_partitioned(&file).await,
        };

        match &result {
            Ok(report) => info!(
                "✅ Finished s3://{}/{}: {} auctions written, {} new item ids queued",
                file.bucket, file.key, report.auctions, report.new_item_ids
            ),
            Err(e) => error!("Failed to process s3://{}/{} ({}): {}", file.bucket, file.key, e.class(), e),
        }
        result
    }

    async fn process_snapshot(
        &self,
        file: &FileToProcess,
        item_publisher: &dyn ItemIdPublisher,
    ) -> Result<FileReport, IngestionError> {
        info!("querying item ids from database");
        let known_item_ids = self.auction_repo.get_item_ids().await?;

        let auctions = self.download_and_parse(file, RowContext::Inline).await?;

        info!("comparing item ids in file against {} ids in database", known_item_ids.len());
        let new_ids = new_item_ids(&known_item_ids, auctions.iter().map(|a| a.item_id));

        info!("writing {} auctions to auction history", auctions.len());
        self.auction_repo.insert_auctions(&auctions).await?;

        info!("writing {} auctions to current auctions", auctions.len());
        self.auction_repo.replace_current_auctions(&auctions).await?;

        info!("found {} item ids to update, writing to queue", new_ids.len());
        let batches = publish_item_ids(item_publisher, &new_ids).await?;
        debug!("Sent {} item id batch(es)", batches);

        Ok(FileReport {
            auctions: auctions.len(),
            new_item_ids: new_ids.len(),
        })
    }

    async fn process_partitioned(&self, file: &FileToProcess) -> Result<FileReport, IngestionError> {
        let partition = PartitionKey::parse(&file.key)?;
        debug!(
            "Partition for {}: interval={}, timestamp={}",
            file.key, partition.interval, partition.timestamp
        );

        let context = RowContext::Fixed {
            interval: partition.interval,
            timestamp: partition.timestamp,
        };
        let auctions = self.download_and_parse(file, context).await?;

        info!("writing {} auctions to auction history", auctions.len());
        self.auction_repo.insert_auctions(&auctions).await?;

        Ok(FileReport {
            auctions: auctions.len(),
            new_item_ids: 0,
        })
    }

    async fn download_and_parse(
        &self,
        file: &FileToProcess,
        context: RowContext,
    ) -> Result<Vec<AuctionRecord>, IngestionError> {
        info!("downloading file {}", file.key);
        let bytes = self.file_fetcher.fetch_file(&file.bucket, &file.key).await?;
        info!("Fetched {} bytes, reading auctions from file", bytes.len());

        parse_auction_csv(&bytes, context)
    }
}
