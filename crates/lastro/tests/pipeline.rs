//! End-to-end runs of the instrument pipeline and the batch driver.

use approx::assert_relative_eq;
use chrono::Duration;
use lastro::metrics::{GrowthRate, TrackedFundamental};
use lastro::store::{
    OutputKind, OutputStore, RawStore, TICKER_COLUMN, read_parquet, write_parquet,
};
use lastro::traits::{
    CorporateActionEvent, DividendKind, DividendRecord, PriceRecord, RawFundamentalRecord,
};
use lastro::{
    Date, InstrumentInputs, LastroError, PipelineConfig, ShareClass, run_batch, run_instrument,
    run_loaded,
};
use polars::prelude::*;

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd_opt(y, m, day).unwrap()
}

fn quarter_ends(first_year: i32, n: usize) -> Vec<Date> {
    let ends = [(3, 31), (6, 30), (9, 30), (12, 31)];
    (0..n)
        .map(|i| {
            let (m, day) = ends[i % 4];
            d(first_year + (i / 4) as i32, m, day)
        })
        .collect()
}

fn daily(from: Date, to: Date, close: impl Fn(Date) -> f64) -> Vec<PriceRecord> {
    let mut out = Vec::new();
    let mut day = from;
    while day <= to {
        out.push(PriceRecord::close_only(day, close(day), close(day)));
        day += Duration::days(1);
    }
    out
}

/// Eight flat quarters: revenue 100, net income 10, 10 shares, price 50.
fn flat_instrument(ticker: &str) -> InstrumentInputs {
    let fundamentals = quarter_ends(2021, 8)
        .into_iter()
        .map(|date| {
            let mut r = RawFundamentalRecord::new(date, 10.0, 500.0);
            r.revenue = 100.0;
            r.net_income = 10.0;
            r.net_income_controlling = 10.0;
            r.closing_price = 50.0;
            r
        })
        .collect();
    InstrumentInputs {
        ticker: ticker.to_string(),
        share_class: ShareClass::from_ticker(ticker),
        fundamentals,
        prices: daily(d(2021, 1, 1), d(2023, 3, 31), |_| 50.0),
        dividends: Vec::new(),
        events: Vec::new(),
    }
}

#[test]
fn test_flat_instrument_end_to_end() {
    let outputs = run_instrument(&flat_instrument("FLAT3"), &PipelineConfig::default()).unwrap();

    assert_eq!(outputs.normalized.len(), 8);
    // Days before the first report are excluded.
    assert_eq!(outputs.prices.rows()[0].date, d(2021, 3, 31));
    assert_eq!(outputs.annual.len(), outputs.prices.len());

    for row in outputs.annual.rows().iter().filter(|r| r.date >= d(2021, 12, 31)) {
        assert_relative_eq!(row.price_to_earnings, 12.5, epsilon = 1e-12);
        assert_relative_eq!(row.price_to_sales, 1.25, epsilon = 1e-12);
        assert_relative_eq!(row.market_value, 500.0, epsilon = 1e-9);
        assert_eq!(row.dividend_yield, [0.0; 5]);
        assert_eq!(row.average_dividend_yield, 0.0);
        assert_eq!(row.ev_to_ebitda, 0.0);
    }
    for row in outputs.quarterly.rows() {
        assert_relative_eq!(row.price_to_earnings, 12.5, epsilon = 1e-12);
    }

    for fundamental in TrackedFundamental::ALL {
        for row in outputs.growth.of(fundamental) {
            for rate in &row.rates {
                assert_eq!(rate.value(), 0.0, "{fundamental} at {}", row.date);
            }
            assert_eq!(row.average, 0.0);
        }
    }
    let latest = outputs.growth.latest(TrackedFundamental::Revenue).unwrap();
    assert_eq!(outputs.growth.rate(latest, 2), Some(GrowthRate::Value(0.0)));
    assert_eq!(outputs.growth.rate(latest, 4), Some(GrowthRate::Insufficient));
}

#[test]
fn test_split_keeps_market_value_continuous() {
    let split = d(2022, 5, 16);
    let mut inputs = flat_instrument("SPLT3");
    // Reports after the split carry the doubled share count.
    for record in &mut inputs.fundamentals {
        if record.report_date > split {
            record.shares_outstanding = 20.0;
            record.market_value = 500.0;
        }
    }
    inputs.prices = daily(d(2021, 3, 31), d(2022, 12, 31), |day| {
        if day <= split { 50.0 } else { 25.0 }
    });
    inputs.events = vec![
        CorporateActionEvent {
            share_class: None,
            ..CorporateActionEvent::new(split, 0.5)
        },
        // Another class's event is ignored.
        CorporateActionEvent {
            share_class: Some(ShareClass::Pn),
            ..CorporateActionEvent::new(d(2021, 9, 1), 0.1)
        },
    ];

    let outputs = run_instrument(&inputs, &PipelineConfig::default()).unwrap();
    for row in outputs.prices.rows() {
        assert_relative_eq!(row.market_value, 500.0, epsilon = 1e-9);
        assert_relative_eq!(row.equivalent_close, 25.0, epsilon = 1e-12);
    }
    // Per-share earnings are in today's basis on both sides of the split.
    for row in outputs.normalized.rows() {
        assert_relative_eq!(row.equivalent_shares, 20.0, epsilon = 1e-12);
        assert_relative_eq!(row.net_income, 0.5, epsilon = 1e-12);
    }
    let after = outputs.annual.get(d(2022, 12, 30)).unwrap();
    assert_relative_eq!(after.price_to_earnings, 12.5, epsilon = 1e-12);
}

#[test]
fn test_payment_history_dividends() {
    let mut inputs = flat_instrument("DIVS4");
    inputs.dividends = vec![
        DividendRecord {
            ex_date: d(2022, 4, 1),
            amount: 1.0,
            kind: DividendKind::Ordinary,
            share_class: Some(ShareClass::Pn),
        },
        DividendRecord {
            ex_date: d(2022, 10, 3),
            amount: 2.0,
            kind: DividendKind::InterestOnEquity,
            share_class: None,
        },
        DividendRecord {
            ex_date: d(2022, 10, 3),
            amount: 9.0,
            kind: DividendKind::Ordinary,
            share_class: Some(ShareClass::On),
        },
    ];
    let config =
        PipelineConfig::from_json(r#"{"normalizer": {"dividend_source": "payment_history"}}"#)
            .unwrap();
    let outputs = run_instrument(&inputs, &config).unwrap();

    assert_eq!(outputs.dividends.len(), 2);
    let last = outputs.normalized.rows().last().unwrap();
    // 1.0 + 2.0 * 0.85 in the trailing year
    assert_relative_eq!(last.trailing_dividends[0], 2.7, epsilon = 1e-12);
    let row = outputs.annual.get(d(2023, 1, 2)).unwrap();
    assert_relative_eq!(row.dividend_yield[0], 2.7 / 50.0, epsilon = 1e-12);
}

#[test]
fn test_loaded_batch_isolates_failures() {
    let mut broken = flat_instrument("BRKN3");
    broken.fundamentals[3].shares_outstanding = 0.0;
    let inputs = vec![flat_instrument("GOOD3"), broken, flat_instrument("ALSO4")];

    let (outputs, report) = run_loaded(&inputs, &PipelineConfig::default());
    assert_eq!(report.processed, vec!["ALSO4".to_string(), "GOOD3".to_string()]);
    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].ticker, "BRKN3");
    assert!(report.excluded[0].reason.contains("integrity"));
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].ticker, "ALSO4");
}

#[test]
fn test_integrity_error_surfaces_from_pipeline() {
    let mut inputs = flat_instrument("BRKN3");
    inputs.fundamentals[0].equivalence_factor = 0.0;
    let err = run_instrument(&inputs, &PipelineConfig::default()).unwrap_err();
    assert!(matches!(err, LastroError::DataIntegrity { .. }));
}

fn write_raw(dir: &std::path::Path, ticker: &str, shares: &str) {
    let dates: Vec<String> = quarter_ends(2021, 8)
        .iter()
        .map(|date| date.format("%d/%m/%Y").to_string())
        .collect();
    let mut fund = df!(
        "Data_balanco" => dates,
        "Num_acoes" => vec![shares; 8],
        "Fator_equivalencia_acoes" => vec!["1"; 8],
        "Market_value" => vec!["500"; 8],
        "RL" => vec!["100,0"; 8],
        "LL" => vec!["10,0"; 8],
        "DY_12m" => vec!["0"; 8],
    )
    .unwrap();
    write_parquet(&dir.join(format!("{ticker}_Fund.parquet")), &mut fund).unwrap();

    let quotes = daily(d(2022, 12, 1), d(2022, 12, 31), |_| 50.0);
    let mut cot = df!(
        "Data" => quotes.iter().map(|q| q.date.format("%d/%m/%Y").to_string()).collect::<Vec<_>>(),
        "Fech_Historico" => quotes.iter().map(|q| q.raw_close).collect::<Vec<_>>(),
        "Fech_Ajustado" => quotes.iter().map(|q| q.adjusted_close).collect::<Vec<_>>(),
    )
    .unwrap();
    write_parquet(&dir.join(format!("{ticker}_Cot.parquet")), &mut cot).unwrap();
}

#[test]
fn test_batch_from_parquet_files() {
    let raw_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    write_raw(raw_dir.path(), "GOOD3", "10");
    write_raw(raw_dir.path(), "ZERO3", "0");

    let raw = RawStore::new(raw_dir.path());
    let out = OutputStore::create(out_dir.path()).unwrap();
    let tickers = raw.tickers().unwrap();
    assert_eq!(tickers, vec!["GOOD3".to_string(), "ZERO3".to_string()]);

    let report = run_batch(&raw, Some(&out), &tickers, &PipelineConfig::default());
    assert_eq!(report.processed, vec!["GOOD3".to_string()]);
    assert_eq!(report.excluded[0].ticker, "ZERO3");

    let multiples = read_parquet(&out.path(OutputKind::Multiples, "GOOD3")).unwrap();
    assert_eq!(multiples.height(), 31);
    let pe = multiples
        .column("price_to_earnings")
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .clone();
    for value in pe.into_iter() {
        assert_relative_eq!(value.unwrap(), 12.5, epsilon = 1e-12);
    }
    for kind in [
        OutputKind::Normalized,
        OutputKind::Multiples,
        OutputKind::MultiplesQuarterly,
        OutputKind::Growth,
    ] {
        let df = read_parquet(&out.path(kind, "GOOD3")).unwrap();
        let tickers = df
            .column(TICKER_COLUMN)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .clone();
        assert_eq!(tickers.len(), df.height());
        assert!(tickers.into_iter().all(|t| t == Some("GOOD3")), "{kind:?}");
    }
    assert!(!out.path(OutputKind::Multiples, "ZERO3").exists());
}
