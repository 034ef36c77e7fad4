use tracing::debug;

use crate::domain::{error::IngestionError, ports::ItemIdPublisher};

/// Largest number of entries a single queue batch send accepts.
pub const MAX_BATCH_SIZE: usize = 10;

/// Sends `item_ids` in consecutive groups of [`MAX_BATCH_SIZE`], stopping at the first failure.
pub async fn publish_item_ids(
    publisher: &dyn ItemIdPublisher,
    item_ids: &[i32],
) -> Result<usize, IngestionError> {
    let mut batches = 0;
    for batch in item_ids.chunks(MAX_BATCH_SIZE) {
        debug!("Sending batch {} with {} item ids", batches + 1, batch.len());
        publisher.send_batch(batch).await?;
        batches += 1;
    }
    Ok(batches)
}
