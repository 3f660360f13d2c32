use crate::error::{FinanceSeriesError, Result};
use crate::fill::FillPolicy;
use crate::month::MonthKey;
use crate::schema::{Record, RecordKind};
use crate::utils::trailing_months;
use chrono::Datelike;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The raw records of one named source.
///
/// Records are held newest first. Sorting is stable, so records sharing a
/// date keep their input order; for snapshots the first of those wins.
#[derive(Debug, Clone)]
pub struct RecordStore {
    name: String,
    kind: RecordKind,
    records: Vec<Record>,
}

/// One account's value for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMonthValue {
    pub month: MonthKey,
    pub account: String,
    pub value: Decimal,
}

impl RecordStore {
    pub fn new(name: impl Into<String>, kind: RecordKind, records: Vec<Record>) -> Result<Self> {
        let name = name.into();

        for (row, record) in records.iter().enumerate() {
            if record.account.trim().is_empty() {
                return Err(FinanceSeriesError::MalformedRecord {
                    source_name: name,
                    row,
                    details: format!("record dated {} has an empty account", record.date),
                });
            }
        }

        let mut records = records;
        records.sort_by(|a, b| b.date.cmp(&a.date));

        debug!(
            "Loaded {} {:?} records for source '{}'",
            records.len(),
            kind,
            name
        );

        Ok(Self {
            name,
            kind,
            records,
        })
    }

    pub fn snapshot(name: impl Into<String>, records: Vec<Record>) -> Result<Self> {
        Self::new(name, RecordKind::Snapshot, records)
    }

    pub fn event(name: impl Into<String>, records: Vec<Record>) -> Result<Self> {
        Self::new(name, RecordKind::Event, records)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn fill_policy(&self) -> FillPolicy {
        FillPolicy::for_kind(self.kind)
    }

    /// Kind-specific reduction to one value per account per month.
    fn account_month_values(&self) -> BTreeMap<(&str, MonthKey), Decimal> {
        let mut values = BTreeMap::new();

        for record in &self.records {
            let key = (record.account.as_str(), record.month());
            match self.kind {
                RecordKind::Snapshot => {
                    values.entry(key).or_insert(record.value);
                }
                RecordKind::Event => {
                    *values.entry(key).or_insert(Decimal::ZERO) += record.value;
                }
            }
        }

        values
    }

    /// Sparse month totals: only months with at least one record appear.
    pub fn monthly_totals(&self) -> BTreeMap<MonthKey, Decimal> {
        let mut totals = BTreeMap::new();

        for ((_, month), value) in self.account_month_values() {
            *totals.entry(month).or_insert(Decimal::ZERO) += value;
        }

        totals
    }

    /// Per-account value as of `as_of`, ordered by account.
    ///
    /// Snapshots report each account's latest balance at or before `as_of`;
    /// accounts first observed later are absent. Events report the flows
    /// within `as_of` only. Zero values are omitted.
    pub fn latest_value_by_account(&self, as_of: MonthKey) -> BTreeMap<String, Decimal> {
        let mut latest: BTreeMap<String, Decimal> = BTreeMap::new();

        match self.kind {
            RecordKind::Snapshot => {
                for record in self.records.iter().filter(|r| r.month() <= as_of) {
                    latest
                        .entry(record.account.clone())
                        .or_insert(record.value);
                }
            }
            RecordKind::Event => {
                for record in self.records.iter().filter(|r| r.month() == as_of) {
                    *latest
                        .entry(record.account.clone())
                        .or_insert(Decimal::ZERO) += record.value;
                }
            }
        }

        latest.retain(|_, value| !value.is_zero());
        latest
    }

    /// Per-account contiguous series over the `months` ending at `today`,
    /// filled with this store's policy. Ordered by account, then month.
    pub fn value_by_account_by_month(
        &self,
        months: u32,
        today: MonthKey,
    ) -> Result<Vec<AccountMonthValue>> {
        let window = trailing_months(today, months)?;
        let policy = self.fill_policy();

        let mut by_account: BTreeMap<&str, BTreeMap<MonthKey, Decimal>> = BTreeMap::new();
        for ((account, month), value) in self.account_month_values() {
            by_account.entry(account).or_default().insert(month, value);
        }

        let mut result = Vec::with_capacity(by_account.len() * window.len());
        for (account, history) in &by_account {
            for month in &window {
                result.push(AccountMonthValue {
                    month: *month,
                    account: account.to_string(),
                    value: policy.fill(*month, history),
                });
            }
        }

        Ok(result)
    }

    /// Sum of raw record values per calendar year.
    pub fn yearly_totals(&self) -> BTreeMap<i32, Decimal> {
        let mut totals = BTreeMap::new();
        for record in &self.records {
            *totals.entry(record.date.year()).or_insert(Decimal::ZERO) += record.value;
        }
        totals
    }

    /// Earliest and latest record months, `None` for an empty store.
    pub fn date_span(&self) -> Option<(MonthKey, MonthKey)> {
        let newest = self.records.first()?.month();
        let oldest = self.records.last()?.month();
        Some((oldest, newest))
    }
}
