//! Trigger payloads: S3 "object created" notifications, optionally wrapped
//! in an SNS notification envelope.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{error::IngestionError, models::FileToProcess};

#[derive(Debug, Deserialize)]
pub struct S3Event {
    #[serde(rename = "Records", default)]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct S3Object {
    /// URL-encoded as delivered by S3.
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct SnsNotification {
    #[serde(rename = "Message")]
    pub message: String,
}

/// Files named by an S3 event delivered as-is.
pub fn decode_s3_event(body: &str) -> Result<Vec<FileToProcess>, IngestionError> {
    let event: S3Event = serde_json::from_str(body)
        .map_err(|e| IngestionError::Decode(format!("error unmarshalling S3 event: {}", e)))?;

    if event.records.is_empty() {
        warn!("S3 event contains no records");
    }

    event
        .records
        .into_iter()
        .map(|record| {
            let key = decode_object_key(&record.s3.object.key)?;
            debug!("Decoded object key '{}' -> '{}'", record.s3.object.key, key);
            Ok(FileToProcess {
                bucket: record.s3.bucket.name,
                key,
            })
        })
        .collect()
}

/// Files named by an S3 event carried as a JSON string inside an SNS envelope.
pub fn decode_sns_notification(body: &str) -> Result<Vec<FileToProcess>, IngestionError> {
    let envelope: SnsNotification = serde_json::from_str(body)
        .map_err(|e| IngestionError::Decode(format!("error unmarshalling SNS message: {}", e)))?;
    decode_s3_event(&envelope.message)
}

/// Query-unescape: `+` is a space, `%XX` is a byte, result must be UTF-8.
pub fn decode_object_key(raw: &str) -> Result<String, IngestionError> {
    check_escapes(raw)?;
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| IngestionError::Decode(format!("error decoding S3 object key '{}': {}", raw, e)))
}

fn check_escapes(raw: &str) -> Result<(), IngestionError> {
    let bytes = raw.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'%' {
            continue;
        }
        let valid = matches!(
            bytes.get(i + 1..i + 3),
            Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
        );
        if !valid {
            return Err(IngestionError::Decode(format!(
                "error decoding S3 object key '{}': invalid escape at byte {}",
                raw, i
            )));
        }
    }
    Ok(())
}
