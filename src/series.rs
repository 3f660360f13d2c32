use crate::error::{FinanceSeriesError, Result};
use crate::month::MonthKey;
use crate::store::RecordStore;
use crate::utils::trailing_months;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub month: MonthKey,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyChange {
    pub month: MonthKey,
    pub change: Decimal,
}

/// A gap-free run of consecutive months, oldest first.
///
/// The only constructors lay months out consecutively, so every instance is
/// contiguous with exactly one point per month. Deserialization goes through
/// `TryFrom<Vec<MonthlyPoint>>` and rejects gaps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<MonthlyPoint>", into = "Vec<MonthlyPoint>")]
pub struct MonthlySeries {
    points: Vec<MonthlyPoint>,
}

impl MonthlySeries {
    /// Lays `values` out over consecutive months starting at `start`.
    pub fn from_values(start: MonthKey, values: impl IntoIterator<Item = Decimal>) -> Self {
        let mut month = start;
        let mut points = Vec::new();
        for value in values {
            points.push(MonthlyPoint { month, value });
            month = month.succ();
        }
        Self { points }
    }

    pub fn points(&self) -> &[MonthlyPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_month(&self) -> Option<MonthKey> {
        self.points.first().map(|p| p.month)
    }

    pub fn last_month(&self) -> Option<MonthKey> {
        self.points.last().map(|p| p.month)
    }

    pub fn last_value(&self) -> Option<Decimal> {
        self.points.last().map(|p| p.value)
    }

    pub fn months(&self) -> Vec<MonthKey> {
        self.points.iter().map(|p| p.month).collect()
    }

    pub fn values(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Value at `month`, `None` outside the covered range.
    pub fn get(&self, month: MonthKey) -> Option<Decimal> {
        let start = self.first_month()?;
        let offset = start.months_until(month);
        if offset < 0 {
            return None;
        }
        self.points.get(offset as usize).map(|p| p.value)
    }

    pub fn sum(&self) -> Decimal {
        self.points.iter().map(|p| p.value).sum()
    }

    pub fn to_map(&self) -> BTreeMap<MonthKey, Decimal> {
        self.points.iter().map(|p| (p.month, p.value)).collect()
    }

    /// The last `months` points (all of them if the series is shorter).
    pub fn trim_to_last(&self, months: usize) -> Self {
        let skip = self.points.len().saturating_sub(months);
        Self {
            points: self.points[skip..].to_vec(),
        }
    }

    /// Month-over-month differences. The first month has no predecessor and
    /// is dropped, so the result is one shorter than the series.
    pub fn change_by_month(&self) -> Vec<MonthlyChange> {
        self.points
            .windows(2)
            .map(|pair| MonthlyChange {
                month: pair[1].month,
                change: pair[1].value - pair[0].value,
            })
            .collect()
    }
}

impl TryFrom<Vec<MonthlyPoint>> for MonthlySeries {
    type Error = FinanceSeriesError;

    fn try_from(points: Vec<MonthlyPoint>) -> Result<Self> {
        if let Some(pair) = points
            .windows(2)
            .find(|pair| pair[0].month.succ() != pair[1].month)
        {
            return Err(FinanceSeriesError::InvalidMonth(format!(
                "{} does not follow {} in a monthly series",
                pair[1].month, pair[0].month
            )));
        }
        Ok(Self { points })
    }
}

impl From<MonthlySeries> for Vec<MonthlyPoint> {
    fn from(series: MonthlySeries) -> Self {
        series.points
    }
}

/// Builds gap-filled monthly series relative to a pinned "today".
pub struct SeriesBuilder {
    today: MonthKey,
}

impl SeriesBuilder {
    pub fn new(today: MonthKey) -> Self {
        Self { today }
    }

    pub fn today(&self) -> MonthKey {
        self.today
    }

    /// Exactly `window_months` consecutive months ending at today.
    ///
    /// Snapshot stores carry their latest total forward, including from
    /// months before the window; event stores zero-fill.
    pub fn build(&self, store: &RecordStore, window_months: u32) -> Result<MonthlySeries> {
        let months = trailing_months(self.today, window_months)?;
        let totals = store.monthly_totals();
        let policy = store.fill_policy();

        debug!(
            "Building {}-month series for source '{}' ({:?}, {} months with data)",
            window_months,
            store.name(),
            policy,
            totals.len()
        );

        let points = months
            .into_iter()
            .map(|month| MonthlyPoint {
                month,
                value: policy.fill(month, &totals),
            })
            .collect();

        Ok(MonthlySeries { points })
    }

    /// Change over each of the last `months` months, from a series built one
    /// month wider.
    pub fn change_by_month(&self, store: &RecordStore, months: u32) -> Result<Vec<MonthlyChange>> {
        let series = self.build(store, months.saturating_add(1))?;
        Ok(series.change_by_month())
    }
}

pub fn build_monthly_series(
    store: &RecordStore,
    window_months: u32,
    today: MonthKey,
) -> Result<MonthlySeries> {
    SeriesBuilder::new(today).build(store, window_months)
}
