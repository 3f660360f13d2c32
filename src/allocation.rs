//! Account-level views joined with the manifest: debt netting, categories,
//! and allocation breakdowns.

use crate::error::Result;
use crate::manifest::{AccountManifest, DEBT_TYPE};
use crate::month::MonthKey;
use crate::store::RecordStore;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A flat `(account, value, type, offsets-account)` row for debt netting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NettingRow {
    pub account: String,
    pub value: Decimal,
    pub account_type: String,
    pub offsets_account: Option<String>,
}

impl NettingRow {
    fn is_debt(&self) -> bool {
        self.account_type == DEBT_TYPE
    }
}

/// Folds each debt row into the account it offsets and drops all debt rows.
///
/// This is one level deep: a debt row's own `offsets_account` is only read,
/// never chased further. Debt without a target (credit cards) simply drops
/// out.
pub fn net_debt(rows: Vec<NettingRow>) -> Vec<NettingRow> {
    let mut applicable: BTreeMap<String, Decimal> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.is_debt()) {
        if let Some(target) = &row.offsets_account {
            *applicable.entry(target.clone()).or_insert(Decimal::ZERO) += row.value;
        }
    }

    rows.into_iter()
        .filter(|r| !r.is_debt())
        .map(|mut row| {
            if let Some(debt) = applicable.get(&row.account) {
                debug!("Netting {} of debt against '{}'", debt, row.account);
                row.value += *debt;
            }
            row
        })
        .collect()
}

/// One account's balance as reported by a named source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedBalance {
    pub source: String,
    pub account: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedAccount {
    pub account: String,
    pub title: String,
    /// Balance after netting any debt that applies to this account
    pub value: Decimal,
    pub category: String,
    pub retirement: bool,
    pub tax_treatment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub category: String,
    pub value: Decimal,
    /// Share of the positive total, zero when the total is not positive
    pub proportion: Decimal,
}

/// Latest per-account balances of every source as of `as_of`.
pub fn current_balances(sources: &[&RecordStore], as_of: MonthKey) -> Vec<SourcedBalance> {
    sources
        .iter()
        .flat_map(|store| {
            store
                .latest_value_by_account(as_of)
                .into_iter()
                .map(move |(account, value)| SourcedBalance {
                    source: store.name().to_string(),
                    account,
                    value,
                })
        })
        .collect()
}

fn categorize_balances(
    balances: &[SourcedBalance],
    manifest: &AccountManifest,
    month: MonthKey,
    missing: &mut BTreeSet<String>,
) -> Vec<CategorizedAccount> {
    let mut rows = Vec::with_capacity(balances.len());
    for balance in balances {
        let Some(entry) = manifest.get(&balance.account) else {
            missing.insert(balance.account.clone());
            continue;
        };

        let account_type = if entry.account_type.is_empty() {
            balance.source.clone()
        } else {
            entry.account_type.clone()
        };

        rows.push(NettingRow {
            account: balance.account.clone(),
            value: balance.value,
            account_type,
            offsets_account: entry.offsets_account().map(str::to_string),
        });
    }

    net_debt(rows)
        .into_iter()
        .filter_map(|row| {
            let entry = manifest.get(&row.account)?;
            Some(CategorizedAccount {
                title: entry.title().to_string(),
                category: entry.category(month, &row.account_type),
                retirement: entry.retirement,
                tax_treatment: entry.tax_treatment().to_string(),
                account: row.account,
                value: row.value,
            })
        })
        .collect()
}

fn warn_missing(missing: &BTreeSet<String>) {
    for account in missing {
        warn!("Account '{}' not found in manifest; excluded from allocation", account);
    }
}

/// Debt-netted, categorized balances as of `as_of`. Accounts without a
/// manifest entry are skipped.
pub fn categorize_accounts(
    sources: &[&RecordStore],
    manifest: &AccountManifest,
    as_of: MonthKey,
) -> Vec<CategorizedAccount> {
    let mut missing = BTreeSet::new();
    let balances = current_balances(sources, as_of);
    let accounts = categorize_balances(&balances, manifest, as_of, &mut missing);
    warn_missing(&missing);
    accounts
}

fn slices_from_totals(totals: BTreeMap<String, Decimal>) -> Vec<AllocationSlice> {
    let total: Decimal = totals.values().copied().sum();

    let mut slices: Vec<AllocationSlice> = totals
        .into_iter()
        .map(|(category, value)| AllocationSlice {
            proportion: if total > Decimal::ZERO {
                value / total
            } else {
                Decimal::ZERO
            },
            category,
            value,
        })
        .collect();

    slices.sort_by(|a, b| b.value.cmp(&a.value));
    slices
}

/// Net assets by category as of `as_of`, largest first.
pub fn asset_allocation(
    sources: &[&RecordStore],
    manifest: &AccountManifest,
    as_of: MonthKey,
) -> Vec<AllocationSlice> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for account in categorize_accounts(sources, manifest, as_of) {
        *totals.entry(account.category).or_insert(Decimal::ZERO) += account.value;
    }
    slices_from_totals(totals)
}

/// Retirement balances (before debt netting) grouped by tax treatment.
pub fn retirement_tax_allocation(
    sources: &[&RecordStore],
    manifest: &AccountManifest,
    as_of: MonthKey,
) -> Vec<AllocationSlice> {
    let mut by_account: BTreeMap<String, Decimal> = BTreeMap::new();
    for balance in current_balances(sources, as_of) {
        *by_account.entry(balance.account).or_insert(Decimal::ZERO) += balance.value;
    }

    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for entry in manifest.retirement_accounts() {
        let value = by_account.get(&entry.account).copied().unwrap_or(Decimal::ZERO);
        if value.is_zero() {
            continue;
        }
        *totals
            .entry(entry.tax_treatment().to_string())
            .or_insert(Decimal::ZERO) += value;
    }

    slices_from_totals(totals)
}

/// Per-month category totals over the `months` ending at `today`, using each
/// account's own filled series and netting debt within the same month.
pub fn category_breakdown_by_month(
    sources: &[&RecordStore],
    manifest: &AccountManifest,
    months: u32,
    today: MonthKey,
) -> Result<BTreeMap<MonthKey, BTreeMap<String, Decimal>>> {
    let mut by_month: BTreeMap<MonthKey, Vec<SourcedBalance>> = BTreeMap::new();
    for store in sources {
        for row in store.value_by_account_by_month(months, today)? {
            by_month.entry(row.month).or_default().push(SourcedBalance {
                source: store.name().to_string(),
                account: row.account,
                value: row.value,
            });
        }
    }

    let mut missing = BTreeSet::new();
    let mut breakdown = BTreeMap::new();
    for (month, balances) in by_month {
        let mut categories: BTreeMap<String, Decimal> = BTreeMap::new();
        for account in categorize_balances(&balances, manifest, month, &mut missing) {
            *categories.entry(account.category).or_insert(Decimal::ZERO) += account.value;
        }
        breakdown.insert(month, categories);
    }
    warn_missing(&missing);

    Ok(breakdown)
}

/// One line of the accounts table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountsTableRow {
    pub account: String,
    pub title: String,
    /// Balance before netting
    pub value: Decimal,
    /// Balance after adding the debt sub-rows that follow this row
    pub net_value: Decimal,
    pub category: String,
    pub tax_treatment: String,
    /// Debt shown under the account it offsets
    pub is_sub_row: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountsTable {
    pub non_retirement: Vec<AccountsTableRow>,
    pub retirement: Vec<AccountsTableRow>,
}

type TableGroup = Vec<(AccountsTableRow, Vec<AccountsTableRow>)>;

fn flatten_group(mut group: TableGroup) -> Vec<AccountsTableRow> {
    group.sort_by(|a, b| b.0.net_value.cmp(&a.0.net_value));
    group
        .into_iter()
        .flat_map(|(row, debts)| std::iter::once(row).chain(debts))
        .collect()
}

/// Current balance of every manifest account, with debt that targets an
/// account listed as sub-rows beneath it. Debt without a target is left out.
///
/// Rows are grouped by the retirement flag and sorted by net value, largest
/// first, in manifest order for ties.
pub fn accounts_table(
    sources: &[&RecordStore],
    manifest: &AccountManifest,
    as_of: MonthKey,
) -> AccountsTable {
    let mut values: BTreeMap<String, (Decimal, String)> = BTreeMap::new();
    for balance in current_balances(sources, as_of) {
        values
            .entry(balance.account)
            .or_insert((Decimal::ZERO, balance.source))
            .0 += balance.value;
    }
    let value_of = |account: &str| {
        values
            .get(account)
            .map(|(value, _)| *value)
            .filter(|value| !value.is_zero())
    };

    let mut debts: BTreeMap<&str, Vec<AccountsTableRow>> = BTreeMap::new();
    for entry in manifest.entries.iter().filter(|e| e.is_debt()) {
        let (Some(target), Some(value)) = (entry.offsets_account(), value_of(&entry.account))
        else {
            continue;
        };
        debts.entry(target).or_default().push(AccountsTableRow {
            account: entry.account.clone(),
            title: entry.title().to_string(),
            value,
            net_value: value,
            category: DEBT_TYPE.to_string(),
            tax_treatment: entry.tax_treatment().to_string(),
            is_sub_row: true,
        });
    }

    let mut non_retirement = TableGroup::new();
    let mut retirement = TableGroup::new();
    for entry in manifest.entries.iter().filter(|e| !e.is_debt()) {
        let Some(value) = value_of(&entry.account) else {
            continue;
        };

        let sub_rows = debts.remove(entry.account.as_str()).unwrap_or_default();
        let net_value = value + sub_rows.iter().map(|r| r.value).sum::<Decimal>();
        let source = values
            .get(&entry.account)
            .map(|(_, source)| source.as_str())
            .unwrap_or_default();

        let row = AccountsTableRow {
            account: entry.account.clone(),
            title: entry.title().to_string(),
            value,
            net_value,
            category: entry.category(as_of, source),
            tax_treatment: entry.tax_treatment().to_string(),
            is_sub_row: false,
        };

        if entry.retirement {
            retirement.push((row, sub_rows));
        } else {
            non_retirement.push((row, sub_rows));
        }
    }

    AccountsTable {
        non_retirement: flatten_group(non_retirement),
        retirement: flatten_group(retirement),
    }
}

/// A yearly contribution to (positive) or withdrawal from (negative) an
/// account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsRow {
    pub year: i32,
    pub account: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavingsAllocation {
    pub years: Vec<i32>,
    /// Contributions per category, one value per entry of `years`
    pub contributions: BTreeMap<String, Vec<Decimal>>,
    /// Withdrawals per year, one value per entry of `years`
    pub withdrawals: Vec<Decimal>,
}

/// Splits savings rows by sign before summing, so a deposit and a withdrawal
/// on the same account in the same year never cancel. Contributions are
/// categorized through the manifest; withdrawals are totalled per year.
pub fn savings_allocation(rows: &[SavingsRow], manifest: &AccountManifest) -> SavingsAllocation {
    let mut by_account: BTreeMap<(i32, &str), Decimal> = BTreeMap::new();
    let mut withdrawals: BTreeMap<i32, Decimal> = BTreeMap::new();
    for row in rows {
        if row.amount > Decimal::ZERO {
            *by_account
                .entry((row.year, row.account.as_str()))
                .or_insert(Decimal::ZERO) += row.amount;
        } else if row.amount < Decimal::ZERO {
            *withdrawals.entry(row.year).or_insert(Decimal::ZERO) += row.amount;
        }
    }

    let mut missing = BTreeSet::new();
    let mut years: BTreeSet<i32> = withdrawals.keys().copied().collect();
    let mut by_category: BTreeMap<String, BTreeMap<i32, Decimal>> = BTreeMap::new();
    for ((year, account), amount) in by_account {
        let Some(entry) = manifest.get(account) else {
            missing.insert(account.to_string());
            continue;
        };
        years.insert(year);
        *by_category
            .entry(entry.base_category("other"))
            .or_default()
            .entry(year)
            .or_insert(Decimal::ZERO) += amount;
    }
    warn_missing(&missing);

    let years: Vec<i32> = years.into_iter().collect();
    let per_year = |totals: &BTreeMap<i32, Decimal>| -> Vec<Decimal> {
        years
            .iter()
            .map(|year| totals.get(year).copied().unwrap_or(Decimal::ZERO))
            .collect()
    };

    SavingsAllocation {
        contributions: by_category
            .iter()
            .map(|(category, totals)| (category.clone(), per_year(totals)))
            .collect(),
        withdrawals: per_year(&withdrawals),
        years,
    }
}
