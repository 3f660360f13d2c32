use crate::comparative::LookbackPlan;
use crate::error::Result;
use crate::month::MonthKey;
use crate::utils::validate_window;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a store's values are interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    #[schemars(
        description = "Absolute balance as of the record date. Gaps carry the last known balance forward."
    )]
    Snapshot,

    #[schemars(
        description = "A dated flow such as a transaction. Values within a month are summed; gaps are zero."
    )]
    Event,
}

/// One observation for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    /// Path-like account identifier, e.g. `/broker/roth_ira`
    pub account: String,
    pub value: Decimal,
}

impl Record {
    pub fn new(date: NaiveDate, account: impl Into<String>, value: Decimal) -> Self {
        Self {
            date,
            account: account.into(),
            value,
        }
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// Windowing parameters for a report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportConfig {
    #[serde(default = "default_display_months")]
    #[schemars(description = "Number of months shown in trailing-window reports (default 12).")]
    pub display_months: u32,

    #[serde(default = "default_rolling_window")]
    #[schemars(description = "Width of the trailing rolling average in months (default 6).")]
    pub rolling_window: u32,

    #[serde(default = "default_yoy_offset")]
    #[schemars(description = "Distance in months of the year-over-year comparison (default 12).")]
    pub yoy_offset_months: u32,

    #[serde(default)]
    #[schemars(
        with = "Option<String>",
        description = "First month (YYYY-MM) of the all-time series. When omitted the earliest record month is used."
    )]
    pub all_time_start: Option<MonthKey>,

    #[serde(default)]
    #[schemars(
        with = "Option<String>",
        description = "Reference month (YYYY-MM) treated as the current month. When omitted the local clock is read."
    )]
    pub today: Option<MonthKey>,
}

fn default_display_months() -> u32 {
    12
}

fn default_rolling_window() -> u32 {
    6
}

fn default_yoy_offset() -> u32 {
    12
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            display_months: default_display_months(),
            rolling_window: default_rolling_window(),
            yoy_offset_months: default_yoy_offset(),
            all_time_start: None,
            today: None,
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<()> {
        validate_window(self.display_months)?;
        validate_window(self.rolling_window)?;
        validate_window(self.yoy_offset_months)?;
        Ok(())
    }

    pub fn lookback_plan(&self) -> Result<LookbackPlan> {
        self.validate()?;
        LookbackPlan::new(
            self.display_months,
            self.rolling_window,
            self.yoy_offset_months,
        )
    }

    /// The pinned reference month, falling back to the local clock.
    pub fn today_or_now(&self) -> MonthKey {
        self.today.unwrap_or_else(MonthKey::current)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportConfig)
    }

    pub fn schema_as_json() -> Result<String> {
        let schema = Self::generate_json_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = ReportConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("display_months"));
        assert!(schema_json.contains("rolling_window"));
        assert!(schema_json.contains("all_time_start"));
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ReportConfig = serde_json::from_str(r#"{"all_time_start": "2013-09"}"#).unwrap();
        assert_eq!(config.display_months, 12);
        assert_eq!(config.rolling_window, 6);
        assert_eq!(config.yoy_offset_months, 12);
        assert_eq!(config.all_time_start, Some(MonthKey::new(2013, 9).unwrap()));
        assert_eq!(config.today, None);
    }

    #[test]
    fn test_pinned_today_wins_over_clock() {
        let config = ReportConfig {
            today: Some(MonthKey::new(2024, 6).unwrap()),
            ..ReportConfig::default()
        };
        assert_eq!(config.today_or_now(), MonthKey::new(2024, 6).unwrap());
    }

    #[test]
    fn test_zero_window_is_invalid() {
        let config = ReportConfig {
            rolling_window: 0,
            ..ReportConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(config.lookback_plan().is_err());
    }

    #[test]
    fn test_oversized_window_is_an_error() {
        let config: ReportConfig =
            serde_json::from_str(r#"{"display_months": 4294967295, "today": "2024-06"}"#).unwrap();

        assert!(config.validate().is_ok());
        assert!(matches!(
            config.lookback_plan(),
            Err(crate::error::FinanceSeriesError::WindowOverflow { .. })
        ));
    }

    #[test]
    fn test_record_month() {
        let record = Record::new(
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            "/bank/checking",
            Decimal::new(1050, 2),
        );
        assert_eq!(record.month().to_string(), "2024-02");
    }
}
