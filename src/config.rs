use crate::domain::{error::IngestionError, models::IngestionMode};

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: IngestionMode,
    pub db_connection_string: String,
    pub db_max_connections: u32,
    /// Queue delivering trigger messages to this worker.
    pub trigger_queue_url: String,
    /// Queue receiving new item ids; only used in discovery mode.
    pub item_ids_queue_url: Option<String>,
    /// LocalStack and similar; also switches S3 to path-style addressing.
    pub aws_endpoint_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, IngestionError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, IngestionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            present(name).ok_or_else(|| {
                IngestionError::Config(format!("{} environment variable is required", name))
            })
        };

        let mode = match present("INGESTION_MODE") {
            Some(value) => IngestionMode::parse(&value).ok_or_else(|| {
                IngestionError::Config(format!(
                    "INGESTION_MODE must be 'discovery' or 'bulk', got '{}'",
                    value
                ))
            })?,
            None => IngestionMode::Discovery,
        };

        let db_max_connections = match present("DB_MAX_CONNECTIONS") {
            Some(value) => value.trim().parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                IngestionError::Config(format!("invalid DB_MAX_CONNECTIONS '{}'", value))
            })?,
            None => 5,
        };

        let item_ids_queue_url = match mode {
            IngestionMode::Discovery => Some(required("ITEM_IDS_QUEUE_URL")?),
            IngestionMode::Bulk => present("ITEM_IDS_QUEUE_URL"),
        };

        Ok(Self {
            mode,
            db_connection_string: required("DB_CONNECTION_STRING")?,
            db_max_connections,
            trigger_queue_url: required("SQS_QUEUE_URL")?,
            item_ids_queue_url,
            aws_endpoint_url: present("AWS_ENDPOINT_URL"),
        })
    }
}
