use csv::{ReaderBuilder, StringRecord};
use std::io::Cursor;
use tracing::{debug, error, info};

use crate::domain::{
    error::IngestionError,
    models::AuctionRecord,
    row_mapper::{map_row, RowContext},
};

/// Reads an auction export: the first line is a header and is discarded,
/// every following line must map to an [`AuctionRecord`]. The first bad
/// row fails the whole file.
pub fn parse_auction_csv(bytes: &[u8], context: RowContext) -> Result<Vec<AuctionRecord>, IngestionError> {
    debug!("Creating CSV reader, header handled manually");
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(Cursor::new(bytes));

    let mut header = StringRecord::new();
    let has_header = reader.read_record(&mut header).map_err(|e| {
        error!("Failed to read CSV header: {}", e);
        IngestionError::Parse(format!("failed to read CSV header: {}", e))
    })?;
    if !has_header {
        error!("CSV file is empty, header row missing");
        return Err(IngestionError::Parse("failed to read CSV header: file is empty".to_string()));
    }
    debug!("CSV header: {:?}", header);

    let mut auctions = Vec::new();
    let mut row = StringRecord::new();
    let mut row_count = 0;

    loop {
        let more = reader.read_record(&mut row).map_err(|e| {
            error!("Failed to read CSV record at row {}: {}", row_count + 1, e);
            IngestionError::Parse(format!("error reading CSV file: {}", e))
        })?;
        if !more {
            break;
        }
        row_count += 1;

        let auction = map_row(&row, context).map_err(|e| {
            error!("Failed to map CSV row {}: {}", row_count, e);
            IngestionError::Parse(format!("error mapping row {} to auction: {}", row_count, e))
        })?;
        auctions.push(auction);

        if row_count % 10000 == 0 {
            debug!("Processed {} CSV rows", row_count);
        }
    }

    info!("Parsed {} auctions from CSV", row_count);
    Ok(auctions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_A: &str = "timestamp,realmId,auctionHouseId,itemId,quantity,min,max,p05,p10,p25,p50,p75,p90\n";
    const HEADER_B: &str = "realmId,auctionHouseId,itemId,quantity,min,max,p05,p10,p25,p50,p75,p90\n";

    #[test]
    fn parses_timestamped_file() {
        let csv = format!(
            "{}{}{}",
            HEADER_A,
            "2024-01-15T09:00:00Z,5,2,100,3,10,90,11,12,25,50,75,89\n",
            "2024-01-15T09:00:00Z,5,2,200,1,7,7,7,7,7,7,7,7\n"
        );

        let auctions = parse_auction_csv(csv.as_bytes(), RowContext::Inline).unwrap();

        assert_eq!(auctions.len(), 2);
        assert_eq!(auctions[0].item_id, 100);
        assert_eq!(auctions[1].item_id, 200);
        assert!(auctions.iter().all(|a| a.timestamp == 1_705_309_200 && a.interval == 1));
    }

    #[test]
    fn header_only_file_is_empty_batch() {
        let auctions = parse_auction_csv(HEADER_B.as_bytes(), RowContext::Inline).unwrap();
        assert!(auctions.is_empty());
    }

    #[test]
    fn empty_file_fails() {
        let err = parse_auction_csv(b"", RowContext::Inline).unwrap_err();
        assert!(matches!(err, IngestionError::Parse(ref m) if m.contains("header")));
    }

    #[test]
    fn one_bad_row_fails_the_file() {
        let csv = format!("{}{}{}", HEADER_B, "5,2,100,3,10,90,11,12,25,50,75,89\n", "5,2,oops,3,10,90,11,12,25,50,75,89\n");

        let err = parse_auction_csv(csv.as_bytes(), RowContext::Fixed { interval: 4, timestamp: 0 }).unwrap_err();
        assert!(matches!(err, IngestionError::Parse(ref m) if m.contains("row 2")));
    }

    #[test]
    fn ragged_row_fails() {
        let csv = format!("{}{}", HEADER_B, "5,2,100\n");

        let err = parse_auction_csv(csv.as_bytes(), RowContext::Fixed { interval: 4, timestamp: 0 }).unwrap_err();
        assert!(matches!(err, IngestionError::Parse(_)));
    }
}
