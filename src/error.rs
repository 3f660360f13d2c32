use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinanceSeriesError {
    #[error("Malformed record in source '{source_name}' at row {row}: {details}")]
    MalformedRecord {
        source_name: String,
        row: usize,
        details: String,
    },

    #[error("Misaligned series: expected months {expected_start}..{expected_end} ({expected_len}), found {found_start}..{found_end} ({found_len})")]
    MisalignedSeries {
        expected_start: String,
        expected_end: String,
        expected_len: usize,
        found_start: String,
        found_end: String,
        found_len: usize,
    },

    #[error("Invalid window of {0} months: must be at least 1")]
    InvalidWindow(u32),

    #[error("Window of {display_months} display months, rolling window {rolling_window} and comparison offset {yoy_offset_months} overflows the lookback")]
    WindowOverflow {
        display_months: u32,
        rolling_window: u32,
        yoy_offset_months: u32,
    },

    #[error("Invalid month: {0}")]
    InvalidMonth(String),

    #[error("Account not found in manifest: {0}")]
    UnknownAccount(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FinanceSeriesError>;
