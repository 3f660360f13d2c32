use crate::error::{FinanceSeriesError, Result};
use crate::schema::{Record, RecordKind};
use crate::store::RecordStore;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A loader row whose date and value have not been typed yet.
///
/// Dates are ISO `YYYY-MM-DD`; values are plain decimals with any currency
/// formatting already stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecordRow {
    pub source: String,
    pub kind: RecordKind,
    pub date: String,
    pub account: String,
    pub value: String,
}

impl RawRecordRow {
    /// Types this row. `row` is the row's position in its batch, reported in
    /// errors.
    pub fn parse(&self, row: usize) -> Result<Record> {
        let malformed = |details: String| FinanceSeriesError::MalformedRecord {
            source_name: self.source.clone(),
            row,
            details,
        };

        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|e| malformed(format!("invalid date '{}': {}", self.date, e)))?;

        let value = Decimal::from_str(self.value.trim())
            .map_err(|e| malformed(format!("invalid value '{}': {}", self.value, e)))?;

        if self.account.trim().is_empty() {
            return Err(malformed(format!("record dated {} has an empty account", date)));
        }

        Ok(Record::new(date, self.account.trim(), value))
    }
}

/// Groups a batch of rows into one store per source name.
///
/// Any unparseable row, or a source whose rows disagree on kind, rejects the
/// whole batch.
pub fn stores_from_rows(rows: &[RawRecordRow]) -> Result<BTreeMap<String, RecordStore>> {
    let mut grouped: BTreeMap<String, (RecordKind, Vec<Record>)> = BTreeMap::new();

    for (idx, row) in rows.iter().enumerate() {
        let record = row.parse(idx)?;

        let (kind, records) = grouped
            .entry(row.source.clone())
            .or_insert_with(|| (row.kind, Vec::new()));

        if *kind != row.kind {
            return Err(FinanceSeriesError::MalformedRecord {
                source_name: row.source.clone(),
                row: idx,
                details: format!(
                    "source already holds {:?} records, found {:?}",
                    kind, row.kind
                ),
            });
        }

        records.push(record);
    }

    debug!("Grouped {} rows into {} sources", rows.len(), grouped.len());

    grouped
        .into_iter()
        .map(|(name, (kind, records))| {
            let store = RecordStore::new(name.clone(), kind, records)?;
            Ok((name, store))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::month::MonthKey;
    use rust_decimal_macros::dec;

    fn raw(source: &str, kind: RecordKind, date: &str, account: &str, value: &str) -> RawRecordRow {
        RawRecordRow {
            source: source.to_string(),
            kind,
            date: date.to_string(),
            account: account.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_parse_trims_and_types() {
        let record = raw("cash", RecordKind::Snapshot, " 2024-02-29 ", " /bank/checking ", "1234.56")
            .parse(0)
            .unwrap();

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(record.account, "/bank/checking");
        assert_eq!(record.value, dec!(1234.56));
    }

    #[test]
    fn test_bad_value_rejects_batch() {
        let rows = vec![
            raw("cash", RecordKind::Snapshot, "2024-01-01", "/bank/checking", "100"),
            raw("cash", RecordKind::Snapshot, "2024-02-01", "/bank/checking", "$1,200"),
        ];

        match stores_from_rows(&rows) {
            Err(FinanceSeriesError::MalformedRecord {
                source_name, row, ..
            }) => {
                assert_eq!(source_name, "cash");
                assert_eq!(row, 1);
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_and_empty_account() {
        assert!(raw("cash", RecordKind::Snapshot, "2024-13-01", "/a", "1").parse(0).is_err());
        assert!(raw("cash", RecordKind::Snapshot, "Jan 2024", "/a", "1").parse(0).is_err());
        assert!(raw("cash", RecordKind::Snapshot, "2024-01-01", " ", "1").parse(0).is_err());
    }

    #[test]
    fn test_groups_by_source() {
        let rows = vec![
            raw("cash", RecordKind::Snapshot, "2024-01-01", "/bank/checking", "100"),
            raw("credit", RecordKind::Event, "2024-01-05", "/card/visa", "-20"),
            raw("cash", RecordKind::Snapshot, "2024-02-01", "/bank/checking", "150"),
            raw("credit", RecordKind::Event, "2024-01-09", "/card/visa", "-30"),
        ];

        let stores = stores_from_rows(&rows).unwrap();

        assert_eq!(stores.len(), 2);
        assert_eq!(stores["cash"].records().len(), 2);
        assert_eq!(stores["credit"].kind(), RecordKind::Event);
        assert_eq!(
            stores["credit"].monthly_totals()[&MonthKey::new(2024, 1).unwrap()],
            dec!(-50)
        );
    }

    #[test]
    fn test_mixed_kinds_in_one_source_rejected() {
        let rows = vec![
            raw("cash", RecordKind::Snapshot, "2024-01-01", "/bank/checking", "100"),
            raw("cash", RecordKind::Event, "2024-01-02", "/bank/checking", "5"),
        ];
        assert!(matches!(
            stores_from_rows(&rows),
            Err(FinanceSeriesError::MalformedRecord { row: 1, .. })
        ));
    }
}
