use crate::error::{FinanceSeriesError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar year-month, the grouping key for every series in the crate.
///
/// Ordering is chronological. The canonical text form is `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(FinanceSeriesError::InvalidMonth(format!(
                "{:04}-{:02}: month must be between 1 and 12",
                year, month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The local calendar month. Library code takes "today" as a parameter;
    /// this is for entry points only.
    pub fn current() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month, `None` only outside chrono's date range.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn sub_months(&self, months: u32) -> Self {
        Self::from_ordinal(self.ordinal() - i64::from(months))
    }

    pub fn add_months(&self, months: u32) -> Self {
        Self::from_ordinal(self.ordinal() + i64::from(months))
    }

    pub fn pred(&self) -> Self {
        self.sub_months(1)
    }

    pub fn succ(&self) -> Self {
        self.add_months(1)
    }

    /// The same calendar month one year earlier.
    pub fn year_ago(&self) -> Self {
        self.sub_months(12)
    }

    /// Signed number of months from `self` to `later` (0 when equal).
    pub fn months_until(&self, later: MonthKey) -> i64 {
        later.ordinal() - self.ordinal()
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: ordinal.rem_euclid(12) as u32 + 1,
        }
    }
}

impl From<NaiveDate> for MonthKey {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.year < 0 { "-" } else { "" };
        write!(f, "{}{:04}-{:02}", sign, self.year.unsigned_abs(), self.month)
    }
}

/// Accepts `YYYY-MM`, and `YYYY-MM-DD` with the day ignored. Years take at
/// least four digits and an optional leading `-`, matching `Display`.
impl FromStr for MonthKey {
    type Err = FinanceSeriesError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(MonthKey::from_date(date));
        }

        let invalid = || {
            FinanceSeriesError::InvalidMonth(format!("{}: expected YYYY-MM or YYYY-MM-DD", s))
        };

        let (year, month) = trimmed.rsplit_once('-').ok_or_else(invalid)?;
        let digits = year.strip_prefix('-').unwrap_or(year);
        if digits.len() < 4
            || !digits.bytes().all(|b| b.is_ascii_digit())
            || month.len() != 2
            || !month.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        MonthKey::new(year, month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
