//! CSV import for ledger statements
//!
//! Accepts a generic export format with a header row:
//! `date,amount,quantity,symbol,balance,description,memo`. Only `date` and
//! `amount` are required; blank cells become NULL. Imports deliberately do
//! not dedupe: repeated imports of overlapping statements are what the
//! duplicate scan exists to clean up afterwards.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::NewLineItem;

/// Parse statement CSV data into line items
pub fn parse_statement_csv<R: Read>(reader: R) -> Result<Vec<NewLineItem>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let date_col = find_column(&headers, "date")
        .ok_or_else(|| Error::Import("Missing required column: date".into()))?;
    let amount_col = find_column(&headers, "amount")
        .ok_or_else(|| Error::Import("Missing required column: amount".into()))?;
    let quantity_col = find_column(&headers, "quantity");
    let symbol_col = find_column(&headers, "symbol");
    let balance_col = find_column(&headers, "balance");
    let description_col = find_column(&headers, "description");
    let memo_col = find_column(&headers, "memo");

    let mut items = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let row = line + 2; // header is line 1

        let date_str = record
            .get(date_col)
            .ok_or_else(|| Error::Import(format!("Row {}: missing date", row)))?;
        let date = parse_date(date_str)
            .map_err(|_| Error::Import(format!("Row {}: unable to parse date: {}", row, date_str)))?;

        let amount_str = record
            .get(amount_col)
            .ok_or_else(|| Error::Import(format!("Row {}: missing amount", row)))?;
        let amount = parse_amount(amount_str).map_err(|_| {
            Error::Import(format!("Row {}: unable to parse amount: {}", row, amount_str))
        })?;

        let quantity = optional_decimal(&record, quantity_col)
            .map_err(|e| Error::Import(format!("Row {}: {}", row, e)))?;
        let balance_after = optional_decimal(&record, balance_col)
            .map_err(|e| Error::Import(format!("Row {}: {}", row, e)))?;

        items.push(NewLineItem {
            date,
            quantity,
            amount,
            symbol: optional_text(&record, symbol_col),
            balance_after,
            description: optional_text(&record, description_col),
            memo: optional_text(&record, memo_col),
        });
    }

    debug!("Parsed {} statement line items", items.len());
    Ok(items)
}

/// Case-insensitive header lookup
fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn optional_text(record: &StringRecord, col: Option<usize>) -> Option<String> {
    col.and_then(|i| record.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn optional_decimal(record: &StringRecord, col: Option<usize>) -> Result<Option<f64>> {
    match col.and_then(|i| record.get(i)).map(|s| s.trim()) {
        None | Some("") => Ok(None),
        Some(s) => parse_amount(s).map(Some),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    // Try common date formats
    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statement_csv() {
        let csv = "\
date,amount,quantity,symbol,balance,description,memo
2024-01-05,-100.00,,,1523.10,ACH Transfer,
01/08/2024,-12.50,,,,Coffee,card 1234
2024-01-10,250.00,2.5,VTI,,Buy,";

        let items = parse_statement_csv(csv.as_bytes()).unwrap();
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].amount, -100.0);
        assert_eq!(items[0].balance_after, Some(1523.10));
        assert_eq!(items[0].description.as_deref(), Some("ACH Transfer"));
        assert!(items[0].memo.is_none());

        assert_eq!(items[1].date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(items[1].memo.as_deref(), Some("card 1234"));

        assert_eq!(items[2].quantity, Some(2.5));
        assert_eq!(items[2].symbol.as_deref(), Some("VTI"));
    }

    #[test]
    fn test_parse_statement_csv_missing_amount_column() {
        let csv = "date,description\n2024-01-05,ACH";
        let err = parse_statement_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Import(_)));
    }

    #[test]
    fn test_parse_statement_csv_bad_row_reports_line() {
        let csv = "date,amount\n2024-01-05,-10.00\nnot-a-date,-5.00";
        let err = parse_statement_csv(csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Row 3"), "unexpected message: {}", msg);
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("$1,234.56").unwrap(), 1234.56);
        assert_eq!(parse_amount("(42.00)").unwrap(), -42.0);
        assert!(parse_amount("n/a").is_err());
    }
}
