//! # Finance Series
//!
//! A library for turning irregular, per-source financial records into dense
//! monthly time series for reporting.
//!
//! ## Core Concepts
//!
//! - **Snapshots**: Point-in-time account balances. Missing months carry the last known balance forward
//! - **Events**: Dated flows such as card transactions. Values within a month are summed; missing months are zero
//! - **Monthly Series**: Exactly one value per month over a window ending at a pinned "today"
//! - **Combined Series**: The month-wise sum of several sources built over the same window
//! - **Comparative Series**: Each month with its year-ago value and trailing rolling averages
//!
//! ## Example
//!
//! ```rust,ignore
//! use finance_series::*;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let cash = RecordStore::snapshot(
//!     "cash",
//!     vec![Record::new(
//!         NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
//!         "/bank/checking",
//!         dec!(1000),
//!     )],
//! )?;
//! let credit = RecordStore::event(
//!     "credit",
//!     vec![Record::new(
//!         NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
//!         "/card/visa",
//!         dec!(-45.10),
//!     )],
//! )?;
//!
//! let today = MonthKey::new(2024, 3)?;
//! let net_worth = combine(&[&cash, &credit], 3, today)?;
//! assert_eq!(net_worth.values(), vec![dec!(1000), dec!(954.90), dec!(1000)]);
//!
//! let comparison = compare_over_window(&[&cash, &credit], &LookbackPlan::default(), today)?;
//! ```

pub mod aggregate;
pub mod allocation;
pub mod comparative;
pub mod error;
pub mod fill;
pub mod ingestion;
pub mod manifest;
pub mod month;
pub mod report;
pub mod schema;
pub mod series;
pub mod store;
pub mod utils;

pub use aggregate::{combine, combine_series};
pub use allocation::{
    accounts_table, asset_allocation, categorize_accounts, category_breakdown_by_month,
    current_balances, net_debt, retirement_tax_allocation, savings_allocation, AccountsTable,
    AccountsTableRow, AllocationSlice, CategorizedAccount, NettingRow, SavingsAllocation,
    SavingsRow, SourcedBalance,
};
pub use comparative::{
    compare_over_window, rolling_average, ComparativePoint, ComparativeSeries,
    ComparativeTransformer, LookbackPlan,
};
pub use error::{FinanceSeriesError, Result};
pub use fill::FillPolicy;
pub use ingestion::{stores_from_rows, RawRecordRow};
pub use manifest::{AccountManifest, ManifestEntry};
pub use month::MonthKey;
pub use report::{
    all_time_series, build_dashboard, dashboard_stats, monthly_movers, spending_by_year,
    Dashboard, DashboardStats, ReportProcessor, ReportSources, SourceMove,
};
pub use schema::*;
pub use series::{build_monthly_series, MonthlyChange, MonthlyPoint, MonthlySeries, SeriesBuilder};
pub use store::{AccountMonthValue, RecordStore};
pub use utils::*;
