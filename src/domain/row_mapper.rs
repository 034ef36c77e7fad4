//! Conversion of a single CSV row into an [`AuctionRecord`].
//!
//! Two column layouts exist. Rows from the notification path lead with an
//! RFC 3339 timestamp; rows from the bulk path carry statistics only and
//! receive their timestamp and interval from the object key.

use std::str::FromStr;

use chrono::DateTime;
use csv::StringRecord;

use crate::domain::{
    error::IngestionError,
    models::{AuctionRecord, LIVE_INTERVAL},
};

/// Where a row's timestamp and interval come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowContext {
    /// Column 0 holds the timestamp; interval is [`LIVE_INTERVAL`].
    Inline,
    /// Same timestamp and interval for every row of the file.
    Fixed { interval: i16, timestamp: i32 },
}

impl RowContext {
    fn stats_offset(&self) -> usize {
        match self {
            RowContext::Inline => 1,
            RowContext::Fixed { .. } => 0,
        }
    }
}

pub fn map_row(row: &StringRecord, context: RowContext) -> Result<AuctionRecord, IngestionError> {
    let (interval, timestamp) = match context {
        RowContext::Inline => (LIVE_INTERVAL, parse_timestamp(column(row, 0)?)?),
        RowContext::Fixed { interval, timestamp } => (interval, timestamp),
    };

    let base = context.stats_offset();
    let at = |i: usize| column(row, base + i);

    Ok(AuctionRecord {
        realm_id: parse_int(at(0)?, "realmId")?,
        auction_house_id: parse_int(at(1)?, "auctionHouseId")?,
        item_id: parse_int(at(2)?, "itemId")?,
        interval,
        timestamp,
        quantity: parse_int(at(3)?, "quantity")?,
        min: parse_int(at(4)?, "min")?,
        max: parse_int(at(5)?, "max")?,
        p05: parse_int(at(6)?, "p05")?,
        p10: parse_int(at(7)?, "p10")?,
        p25: parse_int(at(8)?, "p25")?,
        p50: parse_int(at(9)?, "p50")?,
        p75: parse_int(at(10)?, "p75")?,
        p90: parse_int(at(11)?, "p90")?,
    })
}

fn column(row: &StringRecord, index: usize) -> Result<&str, IngestionError> {
    row.get(index).ok_or_else(|| {
        IngestionError::Parse(format!(
            "row has {} columns, expected a value at column {}",
            row.len(),
            index
        ))
    })
}

/// Strict base-10 parse into the target width. No trimming.
pub(crate) fn parse_int<T>(value: &str, field: &str) -> Result<T, IngestionError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| {
        IngestionError::Parse(format!("could not parse {} '{}': {}", field, value, e))
    })
}

/// RFC 3339 text to Unix seconds, which must fit in 32 bits.
pub(crate) fn parse_timestamp(value: &str) -> Result<i32, IngestionError> {
    let parsed = DateTime::parse_from_rfc3339(value).map_err(|e| {
        IngestionError::Parse(format!("could not parse timestamp '{}': {}", value, e))
    })?;
    to_epoch_seconds(parsed.timestamp())
}

pub(crate) fn to_epoch_seconds(seconds: i64) -> Result<i32, IngestionError> {
    i32::try_from(seconds)
        .map_err(|_| IngestionError::Parse(format!("timestamp {} does not fit in 32 bits", seconds)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    const STATS: [&str; 12] = ["5", "2", "19019", "12", "100", "900", "110", "120", "250", "500", "750", "850"];

    #[test]
    fn maps_inline_row() {
        let mut fields = vec!["2024-01-15T09:30:00Z"];
        fields.extend_from_slice(&STATS);

        let record = map_row(&row(&fields), RowContext::Inline).unwrap();

        assert_eq!(
            record,
            AuctionRecord {
                realm_id: 5,
                auction_house_id: 2,
                item_id: 19019,
                interval: LIVE_INTERVAL,
                timestamp: 1_705_311_000,
                quantity: 12,
                min: 100,
                max: 900,
                p05: 110,
                p10: 120,
                p25: 250,
                p50: 500,
                p75: 750,
                p90: 850,
            }
        );
    }

    #[test]
    fn inline_timestamp_honours_offset() {
        let mut fields = vec!["2024-01-15T10:30:00+01:00"];
        fields.extend_from_slice(&STATS);

        let record = map_row(&row(&fields), RowContext::Inline).unwrap();
        assert_eq!(record.timestamp, 1_705_311_000);
    }

    #[test]
    fn maps_fixed_row() {
        let context = RowContext::Fixed { interval: 4, timestamp: 1_705_309_200 };

        let record = map_row(&row(&STATS), context).unwrap();

        assert_eq!(record.interval, 4);
        assert_eq!(record.timestamp, 1_705_309_200);
        assert_eq!(record.realm_id, 5);
        assert_eq!(record.item_id, 19019);
        assert_eq!(record.p90, 850);
    }

    #[test]
    fn keeps_width_extremes() {
        let fields = [
            "32767", "-32768", "2147483647", "-2147483648", "0", "1", "2", "3", "4", "5", "6", "7",
        ];
        let record = map_row(&row(&fields), RowContext::Fixed { interval: 1, timestamp: 0 }).unwrap();

        assert_eq!(record.realm_id, i16::MAX);
        assert_eq!(record.auction_house_id, i16::MIN);
        assert_eq!(record.item_id, i32::MAX);
        assert_eq!(record.quantity, i32::MIN);
    }

    #[test]
    fn rejects_out_of_range_realm() {
        let mut fields = STATS;
        fields[0] = "32768";

        let err = map_row(&row(&fields), RowContext::Fixed { interval: 1, timestamp: 0 }).unwrap_err();
        assert!(matches!(err, IngestionError::Parse(_)));
    }

    #[test]
    fn rejects_non_numeric_and_padded_values() {
        for bad in ["abc", "1.5", " 7", ""] {
            let mut fields = STATS;
            fields[5] = bad;

            let err = map_row(&row(&fields), RowContext::Fixed { interval: 1, timestamp: 0 }).unwrap_err();
            assert!(matches!(err, IngestionError::Parse(_)), "accepted {:?}", bad);
        }
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let mut fields = vec!["2024-01-15 09:30:00"];
        fields.extend_from_slice(&STATS);

        let err = map_row(&row(&fields), RowContext::Inline).unwrap_err();
        assert!(matches!(err, IngestionError::Parse(_)));
    }

    #[test]
    fn rejects_timestamp_beyond_32_bits() {
        let mut fields = vec!["2100-01-01T00:00:00Z"];
        fields.extend_from_slice(&STATS);

        let err = map_row(&row(&fields), RowContext::Inline).unwrap_err();
        assert!(matches!(err, IngestionError::Parse(_)));
    }

    #[test]
    fn rejects_short_and_empty_rows() {
        let fixed = RowContext::Fixed { interval: 1, timestamp: 0 };

        assert!(matches!(map_row(&row(&STATS[..11]), fixed), Err(IngestionError::Parse(_))));
        assert!(matches!(map_row(&StringRecord::new(), fixed), Err(IngestionError::Parse(_))));
        assert!(matches!(map_row(&StringRecord::new(), RowContext::Inline), Err(IngestionError::Parse(_))));
    }
}
