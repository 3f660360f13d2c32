use crate::error::{FinanceSeriesError, Result};
use crate::month::MonthKey;
use crate::series::{MonthlySeries, SeriesBuilder};
use crate::store::RecordStore;
use crate::utils::trailing_months;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Month-wise sum of per-source series covering the same months.
///
/// Summation is keyed by month, so the result does not depend on the order
/// of `series`. An empty slice yields an empty series.
pub fn combine_series(series: &[MonthlySeries]) -> Result<MonthlySeries> {
    let Some(reference) = series.first() else {
        return Ok(MonthlySeries::default());
    };

    for candidate in &series[1..] {
        check_alignment(reference, candidate)?;
    }

    let mut totals: BTreeMap<MonthKey, Decimal> = BTreeMap::new();
    for s in series {
        for point in s.points() {
            *totals.entry(point.month).or_insert(Decimal::ZERO) += point.value;
        }
    }

    match reference.first_month() {
        Some(start) => Ok(MonthlySeries::from_values(start, totals.into_values())),
        None => Ok(MonthlySeries::default()),
    }
}

/// Builds every source over the same window ending at `today` and sums them.
/// With no sources the result is zero for every month of the window.
pub fn combine(
    sources: &[&RecordStore],
    window_months: u32,
    today: MonthKey,
) -> Result<MonthlySeries> {
    let builder = SeriesBuilder::new(today);

    if sources.is_empty() {
        let months = trailing_months(today, window_months)?;
        return Ok(MonthlySeries::from_values(
            months[0],
            months.iter().map(|_| Decimal::ZERO),
        ));
    }

    let series = sources
        .iter()
        .map(|store| builder.build(store, window_months))
        .collect::<Result<Vec<_>>>()?;

    combine_series(&series)
}

fn check_alignment(expected: &MonthlySeries, found: &MonthlySeries) -> Result<()> {
    let aligned = expected.len() == found.len()
        && expected.first_month() == found.first_month()
        && expected.last_month() == found.last_month();

    if aligned {
        return Ok(());
    }

    let describe = |month: Option<MonthKey>| {
        month
            .map(|m| m.to_string())
            .unwrap_or_else(|| "none".to_string())
    };

    Err(FinanceSeriesError::MisalignedSeries {
        expected_start: describe(expected.first_month()),
        expected_end: describe(expected.last_month()),
        expected_len: expected.len(),
        found_start: describe(found.first_month()),
        found_end: describe(found.last_month()),
        found_len: found.len(),
    })
}
