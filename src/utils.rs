use crate::error::{FinanceSeriesError, Result};
use crate::month::MonthKey;

/// Inclusive, ascending list of months from `start` to `end`.
/// Empty when `end` is before `start`.
pub fn month_range(start: MonthKey, end: MonthKey) -> Vec<MonthKey> {
    let mut months = Vec::new();

    let mut current = start;
    while current <= end {
        months.push(current);
        current = current.succ();
    }

    months
}

/// The `months` consecutive months ending at `today`, oldest first.
pub fn trailing_months(today: MonthKey, months: u32) -> Result<Vec<MonthKey>> {
    validate_window(months)?;
    Ok(month_range(today.sub_months(months - 1), today))
}

pub fn validate_window(months: u32) -> Result<()> {
    if months == 0 {
        return Err(FinanceSeriesError::InvalidWindow(months));
    }
    Ok(())
}

/// Number of months in the inclusive range `start..=end`, zero when reversed.
pub fn months_between(start: MonthKey, end: MonthKey) -> u32 {
    let distance = start.months_until(end);
    if distance < 0 {
        0
    } else {
        (distance + 1) as u32
    }
}
