//! The dashboard pipeline: every report view computed from one set of
//! sources, one manifest and one pinned reference month.

use crate::aggregate::combine;
use crate::allocation::{
    accounts_table, asset_allocation, category_breakdown_by_month, retirement_tax_allocation,
    savings_allocation, AccountsTable, AllocationSlice, SavingsAllocation, SavingsRow,
};
use crate::comparative::{compare_over_window, ComparativeSeries};
use crate::error::Result;
use crate::manifest::AccountManifest;
use crate::month::MonthKey;
use crate::schema::ReportConfig;
use crate::series::{MonthlySeries, SeriesBuilder};
use crate::store::RecordStore;
use crate::utils::months_between;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sources grouped by the role they play in the dashboard.
///
/// Net worth is the sum of the three store groups. Savings rows only feed
/// the savings allocation.
#[derive(Debug, Clone, Default)]
pub struct ReportSources {
    pub assets: Vec<RecordStore>,
    pub liabilities: Vec<RecordStore>,
    pub spending: Vec<RecordStore>,
    pub savings: Vec<SavingsRow>,
}

impl ReportSources {
    pub fn all(&self) -> Vec<&RecordStore> {
        self.assets
            .iter()
            .chain(&self.liabilities)
            .chain(&self.spending)
            .collect()
    }

    pub fn balances(&self) -> Vec<&RecordStore> {
        self.assets.iter().chain(&self.liabilities).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len() + self.liabilities.len() + self.spending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub net_worth: Decimal,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    /// `None` when the display window has a single month
    pub one_month_change: Option<Decimal>,
    /// `None` when there is no value one comparison offset back
    pub one_year_change: Option<Decimal>,
    /// Spending over the display window, positive for outflows
    pub spending_this_period: Decimal,
    /// Spending over the same months one comparison offset back
    pub spending_previous_period: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMove {
    pub source: String,
    pub change: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub today: MonthKey,
    pub net_worth: ComparativeSeries,
    pub spending: ComparativeSeries,
    pub stats: DashboardStats,
    pub movers: Vec<SourceMove>,
    pub asset_allocation: Vec<AllocationSlice>,
    pub retirement_tax_allocation: Vec<AllocationSlice>,
    pub accounts: AccountsTable,
    pub savings: SavingsAllocation,
    pub all_time_net_worth: MonthlySeries,
    pub category_breakdowns: BTreeMap<MonthKey, BTreeMap<String, Decimal>>,
    pub spending_by_year: BTreeMap<i32, Decimal>,
}

impl Dashboard {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct ReportProcessor;

impl ReportProcessor {
    pub fn process(
        sources: &ReportSources,
        manifest: &AccountManifest,
        config: &ReportConfig,
    ) -> Result<Dashboard> {
        let plan = config.lookback_plan()?;
        let today = config.today_or_now();

        info!(
            "Building dashboard for {} from {} sources ({} manifest entries)",
            today,
            sources.len(),
            manifest.entries.len()
        );
        debug!(
            "Display {} months, rolling window {}, comparison offset {}, lookback {}",
            plan.display_months, plan.rolling_window, plan.yoy_offset_months, plan.lookback_months
        );

        let net_worth = compare_over_window(&sources.all(), &plan, today)?;
        let spending_refs: Vec<&RecordStore> = sources.spending.iter().collect();
        let spending = compare_over_window(&spending_refs, &plan, today)?;

        let stats = dashboard_stats(sources, &net_worth, &spending, today)?;
        let movers = monthly_movers(&sources.all(), today)?;

        let balances = sources.balances();
        let asset_allocation = asset_allocation(&balances, manifest, today);
        let retirement_tax_allocation = retirement_tax_allocation(&balances, manifest, today);
        let accounts = accounts_table(&balances, manifest, today);
        let savings = savings_allocation(&sources.savings, manifest);

        let all_time_net_worth = all_time_series(&sources.all(), config.all_time_start, today)?;
        let category_breakdowns = match all_time_net_worth.first_month() {
            Some(start) => category_breakdown_by_month(
                &balances,
                manifest,
                months_between(start, today),
                today,
            )?,
            None => BTreeMap::new(),
        };

        let spending_by_year = spending_by_year(&spending_refs);

        info!(
            "Dashboard built: {} all-time months, {} allocation categories",
            all_time_net_worth.len(),
            asset_allocation.len()
        );

        Ok(Dashboard {
            today,
            net_worth,
            spending,
            stats,
            movers,
            asset_allocation,
            retirement_tax_allocation,
            accounts,
            savings,
            all_time_net_worth,
            category_breakdowns,
            spending_by_year,
        })
    }
}

pub fn build_dashboard(
    sources: &ReportSources,
    manifest: &AccountManifest,
    config: &ReportConfig,
) -> Result<Dashboard> {
    ReportProcessor::process(sources, manifest, config)
}

/// Headline figures read off the comparative series.
pub fn dashboard_stats(
    sources: &ReportSources,
    net_worth: &ComparativeSeries,
    spending: &ComparativeSeries,
    today: MonthKey,
) -> Result<DashboardStats> {
    let latest = net_worth.last();
    let current = latest.map(|p| p.value).unwrap_or(Decimal::ZERO);

    let previous = net_worth
        .len()
        .checked_sub(2)
        .and_then(|idx| net_worth.get(idx))
        .map(|p| p.value);

    let asset_refs: Vec<&RecordStore> = sources.assets.iter().collect();
    let liability_refs: Vec<&RecordStore> = sources.liabilities.iter().collect();
    let total_assets = combine(&asset_refs, 1, today)?.sum();
    let total_liabilities = combine(&liability_refs, 1, today)?.sum();

    let spent: Decimal = spending.iter().map(|p| p.value).sum();
    let spent_before: Option<Decimal> = spending.iter().map(|p| p.last_year_value).sum();

    Ok(DashboardStats {
        net_worth: current,
        total_assets,
        total_liabilities,
        one_month_change: previous.map(|prev| current - prev),
        one_year_change: latest
            .and_then(|p| p.last_year_value)
            .map(|year_ago| current - year_ago),
        spending_this_period: -spent,
        spending_previous_period: spent_before.map(|total| -total),
    })
}

/// This month's change per source name, summed over sources sharing a name,
/// smallest first.
pub fn monthly_movers(sources: &[&RecordStore], today: MonthKey) -> Result<Vec<SourceMove>> {
    let builder = SeriesBuilder::new(today);

    let mut by_name: BTreeMap<&str, Decimal> = BTreeMap::new();
    for store in sources {
        let change = builder
            .change_by_month(store, 1)?
            .first()
            .map(|c| c.change)
            .unwrap_or(Decimal::ZERO);
        *by_name.entry(store.name()).or_insert(Decimal::ZERO) += change;
    }

    let mut movers: Vec<SourceMove> = by_name
        .into_iter()
        .map(|(source, change)| SourceMove {
            source: source.to_string(),
            change,
        })
        .collect();
    movers.sort_by(|a, b| a.change.cmp(&b.change));

    Ok(movers)
}

/// Combined series from `start` (or the earliest record) through `today`,
/// with leading and trailing all-zero months removed.
pub fn all_time_series(
    sources: &[&RecordStore],
    start: Option<MonthKey>,
    today: MonthKey,
) -> Result<MonthlySeries> {
    let earliest = sources
        .iter()
        .filter_map(|store| store.date_span().map(|(oldest, _)| oldest))
        .min();

    let Some(start) = start.or(earliest) else {
        return Ok(MonthlySeries::default());
    };

    let months = months_between(start, today);
    if months == 0 {
        return Ok(MonthlySeries::default());
    }

    let combined = combine(sources, months, today)?;
    Ok(trim_zero_edges(&combined))
}

fn trim_zero_edges(series: &MonthlySeries) -> MonthlySeries {
    let points = series.points();
    let Some(first) = points.iter().position(|p| !p.value.is_zero()) else {
        return MonthlySeries::default();
    };
    let last = points
        .iter()
        .rposition(|p| !p.value.is_zero())
        .unwrap_or(first);

    MonthlySeries::from_values(
        points[first].month,
        points[first..=last].iter().map(|p| p.value),
    )
}

/// Yearly totals of every spending source, sign-flipped so outflows are
/// positive.
pub fn spending_by_year(sources: &[&RecordStore]) -> BTreeMap<i32, Decimal> {
    let mut totals: BTreeMap<i32, Decimal> = BTreeMap::new();
    for store in sources {
        for (year, total) in store.yearly_totals() {
            *totals.entry(year).or_insert(Decimal::ZERO) -= total;
        }
    }
    totals
}
