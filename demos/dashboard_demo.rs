use chrono::NaiveDate;
use finance_series::{
    build_dashboard, AccountManifest, ManifestEntry, MonthKey, Record, RecordStore, ReportConfig,
    ReportSources, SavingsRow,
};
use rust_decimal::Decimal;

fn record(y: i32, m: u32, d: u32, account: &str, value: i64) -> Record {
    Record::new(
        NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        account,
        Decimal::from(value),
    )
}

fn main() {
    let cash = RecordStore::snapshot(
        "cash",
        vec![
            record(2023, 2, 28, "/bank/checking", 6_200),
            record(2023, 9, 30, "/bank/checking", 7_400),
            record(2024, 5, 31, "/bank/checking", 9_100),
            record(2024, 5, 31, "/bank/savings", 15_000),
        ],
    )
    .expect("cash records are valid");

    let securities = RecordStore::snapshot(
        "securities",
        vec![
            record(2023, 1, 1, "/broker/roth_ira", 41_000),
            record(2024, 1, 1, "/broker/roth_ira", 47_500),
            record(2024, 6, 1, "/broker/401k", 88_000),
        ],
    )
    .expect("securities records are valid");

    let property = RecordStore::snapshot(
        "property",
        vec![record(2021, 4, 1, "/property/house", 410_000)],
    )
    .expect("property records are valid");

    let debt = RecordStore::snapshot(
        "debt",
        vec![
            record(2021, 4, 1, "/bank/mortgage", -330_000),
            record(2024, 6, 1, "/bank/mortgage", -301_500),
        ],
    )
    .expect("debt records are valid");

    let credit = RecordStore::event(
        "credit",
        (1..=6)
            .flat_map(|m| {
                [
                    record(2023, m, 12, "/card/visa", -310 - 10 * m as i64),
                    record(2024, m, 12, "/card/visa", -280 - 15 * m as i64),
                ]
            })
            .collect(),
    )
    .expect("credit records are valid");

    let manifest = AccountManifest::new(vec![
        ManifestEntry::new("/bank/checking", "cash"),
        ManifestEntry::new("/bank/savings", "cash"),
        ManifestEntry {
            retirement: true,
            tax_treatment: Some("roth".to_string()),
            ..ManifestEntry::new("/broker/roth_ira", "securities")
        },
        ManifestEntry {
            retirement: true,
            tax_treatment: Some("pre-tax".to_string()),
            ..ManifestEntry::new("/broker/401k", "securities")
        },
        ManifestEntry {
            primary_residence_since: Some(MonthKey::new(2021, 4).unwrap()),
            ..ManifestEntry::new("/property/house", "property")
        },
        ManifestEntry {
            debt_applies_to: Some("/property/house".to_string()),
            ..ManifestEntry::new("/bank/mortgage", "debt")
        },
    ]);

    let sources = ReportSources {
        assets: vec![cash, securities, property],
        liabilities: vec![debt],
        spending: vec![credit],
        savings: vec![
            SavingsRow {
                year: 2023,
                account: "/broker/roth_ira".to_string(),
                amount: Decimal::from(6_500),
            },
            SavingsRow {
                year: 2024,
                account: "/broker/401k".to_string(),
                amount: Decimal::from(11_000),
            },
        ],
    };

    let config = ReportConfig {
        today: Some(MonthKey::new(2024, 6).unwrap()),
        ..ReportConfig::default()
    };

    let dashboard =
        build_dashboard(&sources, &manifest, &config).expect("dashboard should build");

    println!("Net worth (last {} months):", config.display_months);
    for point in &dashboard.net_worth {
        let last_year = point
            .last_year_value
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "n/a".to_string());
        println!("  {}  {:>12.2}  last year {:>12}", point.month, point.value, last_year);
    }

    let stats = &dashboard.stats;
    println!("\nNet worth: {:.2}", stats.net_worth);
    println!("  Assets: {:.2}", stats.total_assets);
    println!("  Liabilities: {:.2}", stats.total_liabilities);
    if let Some(change) = stats.one_month_change {
        println!("  1 month change: {:.2}", change);
    }
    if let Some(change) = stats.one_year_change {
        println!("  1 year change: {:.2}", change);
    }
    println!("Spending this period: {:.2}", stats.spending_this_period);

    println!("\nMovers this month:");
    for mover in &dashboard.movers {
        println!("  {:<12} {:>10.2}", mover.source, mover.change);
    }

    println!("\nAsset allocation:");
    for slice in &dashboard.asset_allocation {
        println!(
            "  {:<24} {:>12.2} ({:.0}%)",
            slice.category,
            slice.value,
            slice.proportion * Decimal::from(100)
        );
    }

    println!("\nAccounts:");
    for row in dashboard
        .accounts
        .non_retirement
        .iter()
        .chain(&dashboard.accounts.retirement)
    {
        let indent = if row.is_sub_row { "    " } else { "  " };
        println!(
            "{}{:<22} {:>12.2} net {:>12.2}",
            indent, row.title, row.value, row.net_value
        );
    }

    println!("\nSavings contributions by year {:?}:", dashboard.savings.years);
    for (category, amounts) in &dashboard.savings.contributions {
        println!("  {:<24} {:?}", category, amounts);
    }

    println!(
        "\nAll-time series covers {} months",
        dashboard.all_time_net_worth.len()
    );
}
