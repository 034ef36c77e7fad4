/// Interval tag stamped on every row ingested through the notification path.
pub const LIVE_INTERVAL: i16 = 1;

/// One observation of one item's market state at one auction house.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuctionRecord {
    pub realm_id: i16,
    pub auction_house_id: i16,
    pub item_id: i32,
    pub interval: i16,
    /// Seconds since the Unix epoch, UTC.
    pub timestamp: i32,
    pub quantity: i32,
    pub min: i32,
    pub max: i32,
    pub p05: i32,
    pub p10: i32,
    pub p25: i32,
    pub p50: i32,
    pub p75: i32,
    pub p90: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileToProcess {
    pub bucket: String,
    /// Already percent-decoded.
    pub key: String,
}

/// Which of the two deployments this process runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionMode {
    /// SNS-wrapped events, per-row timestamps, known-item diffing and fan-out.
    Discovery,
    /// Direct S3 events, timestamp and interval taken from the partitioned key.
    Bulk,
}

impl IngestionMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "discovery" => Some(IngestionMode::Discovery),
            "bulk" => Some(IngestionMode::Bulk),
            _ => None,
        }
    }
}
