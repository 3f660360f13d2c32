use finance_series::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const HOUSEHOLD_CSV: &str = "\
source,kind,date,account,value
cash,snapshot,2022-01-15,/bank/checking,5000
cash,snapshot,2023-06-30,/bank/checking,7000
cash,snapshot,2024-03-31,/bank/checking,8000
cash,snapshot,2024-06-10,/bank/checking,8500
property,snapshot,2020-06-01,/property/house,300000
property,snapshot,2024-01-01,/property/house,320000
debt,snapshot,2020-06-01,/bank/mortgage,-250000
debt,snapshot,2023-06-01,/bank/mortgage,-240000
debt,snapshot,2024-06-01,/bank/mortgage,-235000
securities,snapshot,2023-01-01,/broker/roth_ira,10000
securities,snapshot,2024-06-01,/broker/roth_ira,12000
securities,snapshot,2024-06-01,/broker/401k,20000
credit,event,2023-06-05,/card/visa,-200
credit,event,2023-06-20,/card/visa,-100
credit,event,2024-05-05,/card/visa,-150
credit,event,2024-06-05,/card/visa,-250
";

const MANIFEST_JSON: &str = r#"[
    {"account": "/bank/checking", "type": "cash"},
    {"account": "/property/house", "type": "property", "primary_residence_since": "2020-06"},
    {"account": "/bank/mortgage", "type": "debt", "debt_applies_to": "/property/house"},
    {"account": "/broker/roth_ira", "type": "securities", "retirement": true, "tax_treatment": "roth"},
    {"account": "/broker/401k", "type": "securities", "retirement": true, "tax_treatment": "pre-tax"},
    {"account": "/card/visa", "type": "debt"}
]"#;

fn read_rows(csv_text: &str) -> anyhow::Result<Vec<RawRecordRow>> {
    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

fn household_sources() -> anyhow::Result<ReportSources> {
    let mut stores = stores_from_rows(&read_rows(HOUSEHOLD_CSV)?)?;
    let mut take = |name: &str| {
        stores
            .remove(name)
            .ok_or_else(|| anyhow::anyhow!("missing source {}", name))
    };

    Ok(ReportSources {
        assets: vec![take("cash")?, take("property")?, take("securities")?],
        liabilities: vec![take("debt")?],
        spending: vec![take("credit")?],
        savings: vec![
            SavingsRow {
                year: 2023,
                account: "/broker/roth_ira".to_string(),
                amount: dec!(6500),
            },
            SavingsRow {
                year: 2024,
                account: "/broker/401k".to_string(),
                amount: dec!(20000),
            },
            SavingsRow {
                year: 2024,
                account: "/bank/checking".to_string(),
                amount: dec!(-1200),
            },
        ],
    })
}

fn household_manifest() -> anyhow::Result<AccountManifest> {
    let entries: Vec<ManifestEntry> = serde_json::from_str(MANIFEST_JSON)?;
    Ok(AccountManifest::new(entries))
}

fn pinned_config() -> anyhow::Result<ReportConfig> {
    Ok(ReportConfig {
        today: Some(MonthKey::new(2024, 6)?),
        ..ReportConfig::default()
    })
}

fn month(year: i32, month: u32) -> MonthKey {
    MonthKey::new(year, month).unwrap()
}

#[test]
fn test_household_dashboard() -> anyhow::Result<()> {
    let dashboard = build_dashboard(
        &household_sources()?,
        &household_manifest()?,
        &pinned_config()?,
    )?;

    assert_eq!(dashboard.today, month(2024, 6));
    assert_eq!(dashboard.net_worth.len(), 12);
    assert_eq!(dashboard.net_worth[0].month, month(2023, 7));

    let stats = &dashboard.stats;
    assert_eq!(stats.net_worth, dec!(125250));
    assert_eq!(stats.total_assets, dec!(360500));
    assert_eq!(stats.total_liabilities, dec!(-235000));
    assert_eq!(stats.one_month_change, Some(dec!(27400)));
    assert_eq!(stats.one_year_change, Some(dec!(48550)));
    assert_eq!(stats.spending_this_period, dec!(400));
    assert_eq!(stats.spending_previous_period, Some(dec!(300)));

    let allocation: Vec<(&str, Decimal)> = dashboard
        .asset_allocation
        .iter()
        .map(|s| (s.category.as_str(), s.value))
        .collect();
    assert_eq!(
        allocation,
        vec![
            ("primary residence", dec!(85000)),
            ("retirement securities", dec!(32000)),
            ("cash", dec!(8500)),
        ]
    );

    let tax: Vec<(&str, Decimal)> = dashboard
        .retirement_tax_allocation
        .iter()
        .map(|s| (s.category.as_str(), s.value))
        .collect();
    assert_eq!(tax, vec![("pre-tax", dec!(20000)), ("roth", dec!(12000))]);

    let movers: Vec<(&str, Decimal)> = dashboard
        .movers
        .iter()
        .map(|m| (m.source.as_str(), m.change))
        .collect();
    assert_eq!(
        movers,
        vec![
            ("credit", dec!(-100)),
            ("property", dec!(0)),
            ("cash", dec!(500)),
            ("debt", dec!(5000)),
            ("securities", dec!(22000)),
        ]
    );

    assert_eq!(dashboard.all_time_net_worth.first_month(), Some(month(2020, 6)));
    assert_eq!(dashboard.all_time_net_worth.last_month(), Some(month(2024, 6)));
    assert_eq!(dashboard.all_time_net_worth.get(month(2020, 6)), Some(dec!(50000)));
    assert_eq!(dashboard.all_time_net_worth.last_value(), Some(dec!(125250)));

    let accounts: Vec<(&str, Decimal, bool)> = dashboard
        .accounts
        .non_retirement
        .iter()
        .map(|r| (r.account.as_str(), r.net_value, r.is_sub_row))
        .collect();
    assert_eq!(
        accounts,
        vec![
            ("/property/house", dec!(85000), false),
            ("/bank/mortgage", dec!(-235000), true),
            ("/bank/checking", dec!(8500), false),
        ]
    );
    assert_eq!(dashboard.accounts.retirement[0].account, "/broker/401k");

    assert_eq!(dashboard.savings.years, vec![2023, 2024]);
    assert_eq!(
        dashboard.savings.contributions["retirement securities"],
        vec![dec!(6500), dec!(20000)]
    );
    assert_eq!(dashboard.savings.withdrawals, vec![dec!(0), dec!(-1200)]);

    assert_eq!(dashboard.spending_by_year[&2023], dec!(300));
    assert_eq!(dashboard.spending_by_year[&2024], dec!(400));

    Ok(())
}

#[test]
fn test_credit_spending_rolling_averages() -> anyhow::Result<()> {
    let dashboard = build_dashboard(
        &household_sources()?,
        &household_manifest()?,
        &pinned_config()?,
    )?;

    let june = dashboard
        .spending
        .last()
        .ok_or_else(|| anyhow::anyhow!("empty spending series"))?;
    assert_eq!(june.value, dec!(-250));
    assert_eq!(june.last_year_value, Some(dec!(-300)));
    assert_eq!(june.value_rolling_avg, Some(dec!(-400) / dec!(6)));
    assert_eq!(june.last_year_value_rolling_avg, Some(dec!(-50)));

    Ok(())
}

#[test]
fn test_category_breakdown_follows_residence_dates() -> anyhow::Result<()> {
    let manifest = household_manifest()?;
    let sources = household_sources()?;

    let moved_in = AccountManifest::new(
        manifest
            .entries
            .iter()
            .cloned()
            .map(|mut entry| {
                if entry.account == "/property/house" {
                    entry.primary_residence_since = Some(month(2024, 5));
                }
                entry
            })
            .collect(),
    );

    let breakdown =
        category_breakdown_by_month(&sources.balances(), &moved_in, 3, month(2024, 6))?;

    assert_eq!(breakdown[&month(2024, 4)]["property"], dec!(80000));
    assert!(!breakdown[&month(2024, 4)].contains_key("primary residence"));
    assert_eq!(breakdown[&month(2024, 6)]["primary residence"], dec!(85000));

    Ok(())
}

#[test]
fn test_identical_runs_produce_identical_output() -> anyhow::Result<()> {
    let sources = household_sources()?;
    let manifest = household_manifest()?;
    let config = pinned_config()?;

    let first = build_dashboard(&sources, &manifest, &config)?;
    let second = build_dashboard(&sources, &manifest, &config)?;

    assert_eq!(first, second);
    assert_eq!(first.to_json()?, second.to_json()?);

    Ok(())
}

#[test]
fn test_source_order_does_not_change_totals() -> anyhow::Result<()> {
    let sources = household_sources()?;
    let today = month(2024, 6);

    let forward = sources.all();
    let mut reversed = forward.clone();
    reversed.reverse();

    assert_eq!(combine(&forward, 40, today)?, combine(&reversed, 40, today)?);

    Ok(())
}

#[test]
fn test_windows_are_contiguous_across_year_boundaries() -> anyhow::Result<()> {
    let sources = household_sources()?;

    for today in [month(2024, 1), month(2023, 12), month(2024, 6)] {
        for window in [1u32, 2, 13, 29] {
            let series = combine(&sources.all(), window, today)?;
            let months = series.months();

            assert_eq!(months.len(), window as usize);
            assert_eq!(months.last(), Some(&today));
            assert!(months.windows(2).all(|pair| pair[0].succ() == pair[1]));
        }
    }

    Ok(())
}

#[test]
fn test_year_over_year_absent_without_history() -> anyhow::Result<()> {
    let rows = read_rows(
        "source,kind,date,account,value\n\
         cash,snapshot,2024-01-01,/bank/checking,100\n",
    )?;
    let stores = stores_from_rows(&rows)?;
    let cash = &stores["cash"];

    let series = build_monthly_series(cash, 12, month(2024, 12))?;
    let annotated = ComparativeTransformer::default().annotate(&series, 12);

    assert!(annotated.iter().all(|p| p.last_year_value.is_none()));
    assert!(annotated.iter().all(|p| p.value == dec!(100)));
    assert_eq!(annotated[5].value_rolling_avg, Some(dec!(100)));

    Ok(())
}

#[test]
fn test_malformed_row_rejects_whole_batch() -> anyhow::Result<()> {
    let rows = read_rows(
        "source,kind,date,account,value\n\
         cash,snapshot,2024-01-01,/bank/checking,100\n\
         credit,event,2024-01-05,/card/visa,-20\n\
         cash,snapshot,2024-02-30,/bank/checking,120\n",
    )?;

    match stores_from_rows(&rows) {
        Err(FinanceSeriesError::MalformedRecord { source_name, row, .. }) => {
            assert_eq!(source_name, "cash");
            assert_eq!(row, 2);
        }
        other => panic!("expected MalformedRecord, got {:?}", other.map(|s| s.len())),
    }

    Ok(())
}

#[test]
fn test_month_over_month_change() -> anyhow::Result<()> {
    let sources = household_sources()?;
    let cash = &sources.assets[0];

    let changes = SeriesBuilder::new(month(2024, 6)).change_by_month(cash, 3)?;

    let values: Vec<Decimal> = changes.iter().map(|c| c.change).collect();
    assert_eq!(values, vec![dec!(0), dec!(0), dec!(500)]);
    assert_eq!(changes[0].month, month(2024, 4));

    Ok(())
}

#[test]
fn test_schema_generation() -> anyhow::Result<()> {
    let config_schema = ReportConfig::schema_as_json()?;
    assert!(config_schema.contains("yoy_offset_months"));

    let manifest_schema = serde_json::to_string(&AccountManifest::generate_json_schema())?;
    assert!(manifest_schema.contains("debt_applies_to"));
    assert!(manifest_schema.contains("\"type\""));

    Ok(())
}
