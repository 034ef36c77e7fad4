use async_trait::async_trait;
use aws_sdk_sqs::{types::SendMessageBatchRequestEntry, Client};
use tracing::{debug, error};

use crate::domain::{error::IngestionError, ports::ItemIdPublisher};

/// Publishes item ids to the enrichment queue, one message per id.
pub struct SqsItemIdPublisher {
    client: Client,
    queue_url: String,
}

impl SqsItemIdPublisher {
    pub fn new(client: Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait]
impl ItemIdPublisher for SqsItemIdPublisher {
    async fn send_batch(&self, item_ids: &[i32]) -> Result<(), IngestionError> {
        let entries = item_ids
            .iter()
            .map(|id| {
                SendMessageBatchRequestEntry::builder()
                    .id(id.to_string())
                    .message_body(id.to_string())
                    .build()
                    .map_err(|e| IngestionError::Transport(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let response = self.client
            .send_message_batch()
            .queue_url(&self.queue_url)
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send batch to {}: {}", self.queue_url, e);
                IngestionError::Transport(format!("error sending message batch: {}", e))
            })?;

        let failed = response.failed();
        if !failed.is_empty() {
            let ids: Vec<&str> = failed.iter().map(|f| f.id()).collect();
            error!("Queue rejected {} of {} entries: {:?}", failed.len(), item_ids.len(), ids);
            return Err(IngestionError::Transport(format!(
                "queue rejected {} entries, first: {}",
                failed.len(),
                failed[0].message().unwrap_or("no message")
            )));
        }

        debug!("Sent {} item ids to {}", item_ids.len(), self.queue_url);
        Ok(())
    }
}
