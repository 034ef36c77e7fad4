//! Hive-style partition metadata encoded in bulk export object keys, e.g.
//! `exports/interval=4/year=2024/month=1/day=15/hour=9/realm-5.csv`.

use chrono::{TimeZone, Utc};

use crate::domain::{
    error::IngestionError,
    row_mapper::{parse_int, to_epoch_seconds},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionKey {
    pub interval: i16,
    /// Unix seconds at the top of the partition hour.
    pub timestamp: i32,
}

#[derive(Default)]
struct RawSegments<'a> {
    interval: Option<&'a str>,
    year: Option<&'a str>,
    month: Option<&'a str>,
    day: Option<&'a str>,
    hour: Option<&'a str>,
}

impl PartitionKey {
    pub fn parse(key: &str) -> Result<Self, IngestionError> {
        let mut raw = RawSegments::default();

        for segment in key.split('/') {
            let parts: Vec<&str> = segment.split('=').collect();
            if parts.len() != 2 {
                continue;
            }
            let slot = match parts[0] {
                "interval" => &mut raw.interval,
                "year" => &mut raw.year,
                "month" => &mut raw.month,
                "day" => &mut raw.day,
                "hour" => &mut raw.hour,
                _ => continue,
            };
            *slot = Some(parts[1]);
        }

        let interval: i16 = parse_int(required(raw.interval, "interval", key)?, "interval")?;
        let year: i32 = parse_int(required(raw.year, "year", key)?, "year")?;
        let month: u32 = parse_int(required(raw.month, "month", key)?, "month")?;
        let day: u32 = parse_int(required(raw.day, "day", key)?, "day")?;
        let hour: u32 = parse_int(required(raw.hour, "hour", key)?, "hour")?;

        let at = Utc
            .with_ymd_and_hms(year, month, day, hour, 0, 0)
            .single()
            .ok_or_else(|| {
                IngestionError::Parse(format!(
                    "partition {}-{}-{} hour {} in key '{}' is not a valid time",
                    year, month, day, hour, key
                ))
            })?;

        Ok(PartitionKey {
            interval,
            timestamp: to_epoch_seconds(at.timestamp())?,
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &str, key: &str) -> Result<&'a str, IngestionError> {
    value.ok_or_else(|| {
        IngestionError::Parse(format!("partition field '{}' missing from key '{}'", name, key))
    })
}
