use crate::aggregate::combine;
use crate::error::{FinanceSeriesError, Result};
use crate::month::MonthKey;
use crate::series::MonthlySeries;
use crate::store::RecordStore;
use crate::utils::validate_window;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How much history a comparative report needs before trimming.
///
/// The first displayed month's year-ago rolling average reaches back
/// `yoy_offset + rolling_window - 1` months, so the series is built that
/// much wider than the display window and trimmed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackPlan {
    pub display_months: u32,
    pub rolling_window: u32,
    pub yoy_offset_months: u32,
    pub lookback_months: u32,
}

impl LookbackPlan {
    pub fn new(display_months: u32, rolling_window: u32, yoy_offset_months: u32) -> Result<Self> {
        validate_window(display_months)?;
        validate_window(rolling_window)?;
        validate_window(yoy_offset_months)?;

        let lookback_months = display_months
            .checked_add(rolling_window - 1)
            .and_then(|months| months.checked_add(yoy_offset_months))
            .ok_or(FinanceSeriesError::WindowOverflow {
                display_months,
                rolling_window,
                yoy_offset_months,
            })?;

        Ok(Self {
            display_months,
            rolling_window,
            yoy_offset_months,
            lookback_months,
        })
    }

    pub fn transformer(&self) -> ComparativeTransformer {
        ComparativeTransformer::new(self.rolling_window, self.yoy_offset_months)
    }
}

impl Default for LookbackPlan {
    fn default() -> Self {
        Self {
            display_months: 12,
            rolling_window: 6,
            yoy_offset_months: 12,
            lookback_months: 29,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparativePoint {
    pub month: MonthKey,
    pub value: Decimal,
    /// Value `yoy_offset` months earlier; `None` when outside the built range
    pub last_year_value: Option<Decimal>,
    /// Trailing mean of `value`; `None` without a full window of history
    pub value_rolling_avg: Option<Decimal>,
    /// Trailing mean of `last_year_value`; `None` if any input is absent
    pub last_year_value_rolling_avg: Option<Decimal>,
}

pub type ComparativeSeries = Vec<ComparativePoint>;

/// Derives year-over-year values and rolling averages from a wide series.
pub struct ComparativeTransformer {
    rolling_window: u32,
    yoy_offset_months: u32,
}

impl ComparativeTransformer {
    pub fn new(rolling_window: u32, yoy_offset_months: u32) -> Self {
        Self {
            rolling_window,
            yoy_offset_months,
        }
    }

    /// Annotates every month of `series`, then keeps the last
    /// `display_months`. Lookups always see the full input.
    pub fn annotate(&self, series: &MonthlySeries, display_months: usize) -> ComparativeSeries {
        let window = self.rolling_window as usize;

        let values: Vec<Option<Decimal>> = series.points().iter().map(|p| Some(p.value)).collect();
        let last_year_values: Vec<Option<Decimal>> = series
            .points()
            .iter()
            .map(|p| series.get(p.month.sub_months(self.yoy_offset_months)))
            .collect();

        let value_avg = rolling_average(&values, window);
        let last_year_avg = rolling_average(&last_year_values, window);

        let annotated: Vec<ComparativePoint> = series
            .points()
            .iter()
            .enumerate()
            .map(|(i, point)| ComparativePoint {
                month: point.month,
                value: point.value,
                last_year_value: last_year_values[i],
                value_rolling_avg: value_avg[i],
                last_year_value_rolling_avg: last_year_avg[i],
            })
            .collect();

        let skip = annotated.len().saturating_sub(display_months);
        annotated.into_iter().skip(skip).collect()
    }
}

impl Default for ComparativeTransformer {
    fn default() -> Self {
        Self::new(6, 12)
    }
}

/// Trailing arithmetic mean over `window` entries.
///
/// The first `window - 1` entries are `None`, as is any position whose
/// window contains an absent value.
pub fn rolling_average(values: &[Option<Decimal>], window: usize) -> Vec<Option<Decimal>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    let divisor = Decimal::from(window as u64);

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            values[i + 1 - window..=i]
                .iter()
                .copied()
                .sum::<Option<Decimal>>()
                .map(|total| total / divisor)
        })
        .collect()
}

/// Combines `sources` over the plan's lookback, annotates, and trims to the
/// display window.
pub fn compare_over_window(
    sources: &[&RecordStore],
    plan: &LookbackPlan,
    today: MonthKey,
) -> Result<ComparativeSeries> {
    let wide = combine(sources, plan.lookback_months, today)?;
    Ok(plan
        .transformer()
        .annotate(&wide, plan.display_months as usize))
}
