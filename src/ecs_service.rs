use std::sync::Arc;
use async_trait::async_trait;
use aws_sdk_sqs::{types::Message, Client as SqsClient};
use tracing::{info, error, debug, warn};
use crate::{
    application::ingestion_service::IngestionService,
    config::Config,
    domain::{error::IngestionError, models::IngestionMode},
    infrastructure::{
        postgres::auction_repo::PgAuctionRepository,
        s3_adapter::S3Adapter,
        sqs_publisher::SqsItemIdPublisher,
    },
};

/// Removes a handled message from the trigger queue.
#[async_trait]
pub trait MessageAcknowledger: Send + Sync {
    async fn delete_message(&self, receipt_handle: &str) -> Result<(), IngestionError>;
}

/// Long-polls the trigger queue and runs one ingestion per message.
pub struct EcsService {
    service: IngestionService,
    sqs_client: SqsClient,
    queue_url: String,
}

impl EcsService {
    pub async fn new(config: Config) -> Result<Self, IngestionError> {
        debug!("Initializing ECS service in {:?} mode", config.mode);

        debug!("Loading AWS configuration");
        let mut aws_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(endpoint_url) = &config.aws_endpoint_url {
            info!("Using custom AWS endpoint: {}", endpoint_url);
            aws_config_builder = aws_config_builder.endpoint_url(endpoint_url);
        }

        let aws_config = aws_config_builder.load().await;
        debug!("AWS region: {:?}", aws_config.region());

        let mut s3_config = aws_sdk_s3::config::Builder::from(&aws_config);

        // LocalStack needs path-style addressing
        if config.aws_endpoint_url.is_some() {
            s3_config = s3_config.force_path_style(true);
        }

        let s3_client = aws_sdk_s3::Client::from_conf(s3_config.build());
        let sqs_client = SqsClient::new(&aws_config);
        debug!("AWS clients initialized");

        info!("Using trigger queue: {}", config.trigger_queue_url);

        let file_fetcher = Arc::new(S3Adapter::new(s3_client));
        let auction_repo = Arc::new(
            PgAuctionRepository::connect(&config.db_connection_string, config.db_max_connections).await?,
        );

        let service = match config.mode {
            IngestionMode::Discovery => {
                let item_queue = config.item_ids_queue_url.clone().ok_or_else(|| {
                    IngestionError::Config("ITEM_IDS_QUEUE_URL is required in discovery mode".to_string())
                })?;
                info!("Publishing new item ids to: {}", item_queue);
                let publisher = Arc::new(SqsItemIdPublisher::new(sqs_client.clone(), item_queue));
                IngestionService::discovery(file_fetcher, auction_repo, publisher)
            }
            IngestionMode::Bulk => IngestionService::bulk(file_fetcher, auction_repo),
        };

        info!("Ingestion service running in {:?} mode", service.mode());
        debug!("ECS service initialization complete");
        Ok(Self {
            service,
            sqs_client,
            queue_url: config.trigger_queue_url,
        })
    }

    pub async fn run(&self) -> Result<(), IngestionError> {
        info!("Starting ECS service, polling SQS queue: {}", self.queue_url);

        let mut poll_count: u64 = 0;
        loop {
            poll_count += 1;
            debug!("Polling SQS queue (attempt {})", poll_count);

            let response = self.sqs_client
                .receive_message()
                .queue_url(&self.queue_url)
                .max_number_of_messages(10)
                .wait_time_seconds(20)
                .send()
                .await
                .map_err(|e| {
                    error!("Failed to receive messages from SQS: {}", e);
                    IngestionError::Transport(format!("error receiving messages: {}", e))
                })?;

            let messages = response.messages.unwrap_or_default();
            if messages.is_empty() {
                debug!("No messages received from SQS");
                continue;
            }
            info!("Received {} messages from SQS", messages.len());

            process_messages(&self.service, &messages, self).await;
        }
    }
}

#[async_trait]
impl MessageAcknowledger for EcsService {
    async fn delete_message(&self, receipt_handle: &str) -> Result<(), IngestionError> {
        debug!("Deleting processed message from queue");
        self.sqs_client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to delete message from SQS: {}", e);
                IngestionError::Transport(format!("error deleting message: {}", e))
            })?;
        Ok(())
    }
}

/// Runs each message through the service. Successful messages are deleted;
/// failed ones, and ones whose delete fails, stay on the queue for
/// redelivery. Returns how many messages were deleted.
pub async fn process_messages(
    service: &IngestionService,
    messages: &[Message],
    acknowledger: &dyn MessageAcknowledger,
) -> usize {
    let mut deleted = 0;
    for (i, message) in messages.iter().enumerate() {
        let Some(body) = &message.body else {
            warn!("Received message without body");
            continue;
        };
        debug!("Message {} of {} body: {}", i + 1, messages.len(), body);

        match service.handle_message(body).await {
            Ok(reports) => {
                let auctions: usize = reports.iter().map(|r| r.auctions).sum();
                info!("Message {} done: {} file(s), {} auctions", i + 1, reports.len(), auctions);
                let Some(receipt_handle) = &message.receipt_handle else {
                    warn!("Message {} has no receipt handle, cannot delete", i + 1);
                    continue;
                };
                match acknowledger.delete_message(receipt_handle).await {
                    Ok(()) => deleted += 1,
                    Err(e) => error!("Message {} processed but not deleted, it will be redelivered: {}", i + 1, e),
                }
            }
            // Left on the queue for the redrive policy.
            Err(e) => error!("Message {} failed with {} error: {}", i + 1, e.class(), e),
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{models::AuctionRecord, ports::{AuctionRepository, FileFetcher}};
    use std::collections::HashSet;
    use std::sync::Mutex;

    struct NoStorage;

    #[async_trait]
    impl FileFetcher for NoStorage {
        async fn fetch_file(&self, _bucket: &str, key: &str) -> Result<Vec<u8>, IngestionError> {
            Err(IngestionError::Transport(format!("NoSuchKey: {}", key)))
        }
    }

    struct NoDatabase;

    #[async_trait]
    impl AuctionRepository for NoDatabase {
        async fn get_item_ids(&self) -> Result<HashSet<i32>, IngestionError> {
            Ok(HashSet::new())
        }

        async fn insert_auctions(&self, _auctions: &[AuctionRecord]) -> Result<(), IngestionError> {
            Ok(())
        }

        async fn replace_current_auctions(&self, _auctions: &[AuctionRecord]) -> Result<(), IngestionError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FlakyQueue {
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageAcknowledger for FlakyQueue {
        async fn delete_message(&self, receipt_handle: &str) -> Result<(), IngestionError> {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(receipt_handle.to_string());
            if attempts.len() == 1 {
                return Err(IngestionError::Transport("ReceiptHandleIsInvalid".to_string()));
            }
            Ok(())
        }
    }

    fn message(body: &str, receipt_handle: &str) -> Message {
        Message::builder().body(body).receipt_handle(receipt_handle).build()
    }

    #[tokio::test]
    async fn failed_delete_does_not_stop_the_batch() {
        let service = IngestionService::bulk(Arc::new(NoStorage), Arc::new(NoDatabase));
        let queue = FlakyQueue::default();
        // S3 test events carry no records and succeed without touching storage.
        let messages = vec![
            message(r#"{"Event":"s3:TestEvent"}"#, "first"),
            message("not json", "broken"),
            message(r#"{"Event":"s3:TestEvent"}"#, "third"),
        ];

        let deleted = process_messages(&service, &messages, &queue).await;

        assert_eq!(deleted, 1);
        assert_eq!(*queue.attempts.lock().unwrap(), vec!["first".to_string(), "third".to_string()]);
    }
}
