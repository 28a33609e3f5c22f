//! Reading raw vendor tables into typed records.
//!
//! Each instrument has up to four Parquet files in the raw directory:
//! `<TICKER>_Fund`, `<TICKER>_Cot`, `<TICKER>_Prov` and `<TICKER>_Eventos`.
//! Fundamentals and quotes are required; a missing dividend or event file
//! means the instrument has none. Numeric columns may be typed or text with a
//! comma decimal separator, and dates may be typed or `dd/mm/yyyy` text.

use chrono::NaiveDateTime;
use lastro_traits::frame::column_dates;
use lastro_traits::{
    CorporateActionEvent, DIVIDEND_HORIZONS, Date, DividendKind, DividendRecord, LastroError,
    PriceRecord, RawFundamentalRecord, Result, ShareClass, Symbol,
};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Candidate names of the date column in quote, dividend and event files.
///
/// These tables are written with the date as the frame index, which Parquet
/// stores under one of these names depending on the writer.
const INDEX_DATE_COLUMNS: [&str; 4] = ["Data", "date", "__index_level_0__", "index"];

/// Reported dividend yield columns, 12 to 60 months.
const DIVIDEND_YIELD_COLUMNS: [&str; DIVIDEND_HORIZONS] =
    ["DY_12m", "DY_24m", "DY_36m", "DY_48m", "DY_60m"];

/// Parses a number written with either `.` or `,` as decimal separator.
///
/// With a comma present, dots are taken as thousands separators. Blank text
/// is `None`.
///
/// # Examples
///
/// ```
/// use lastro_store::ingest::parse_locale_f64;
///
/// assert_eq!(parse_locale_f64("12,5"), Some(12.5));
/// assert_eq!(parse_locale_f64("1.234,5"), Some(1234.5));
/// assert_eq!(parse_locale_f64("0.75"), Some(0.75));
/// assert_eq!(parse_locale_f64(" "), None);
/// ```
pub fn parse_locale_f64(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.contains(',') {
        text.replace('.', "").replace(',', ".").parse().ok()
    } else {
        text.parse().ok()
    }
}

/// Parses `dd/mm/yyyy`, ISO `yyyy-mm-dd`, or an ISO timestamp.
pub fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();
    Date::parse_from_str(text, "%d/%m/%Y")
        .or_else(|_| Date::parse_from_str(text, "%Y-%m-%d"))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .ok()
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| LastroError::MissingColumn(name.to_string()))
}

/// Reads a numeric column, accepting any numeric dtype or locale text.
fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = column(df, name)?;
    match col.dtype() {
        DataType::String => Ok(col
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_locale_f64))
            .collect()),
        dtype if dtype.is_float() || dtype.is_integer() => {
            let cast = col.cast(&DataType::Float64)?;
            Ok(cast.as_materialized_series().f64()?.into_iter().collect())
        }
        DataType::Null => Ok(vec![None; col.len()]),
        other => Err(LastroError::InvalidData(format!(
            "column {name} has non-numeric type {other}"
        ))),
    }
}

/// Like [`float_values`], with an absent column read as all nulls.
fn optional_float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    if df.get_column_index(name).is_some() {
        float_values(df, name)
    } else {
        Ok(vec![None; df.height()])
    }
}

fn optional_text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    if df.get_column_index(name).is_none() {
        return Ok(vec![None; df.height()]);
    }
    let col = column(df, name)?;
    let col = if col.dtype() == &DataType::String {
        col.clone()
    } else {
        col.cast(&DataType::String)?
    };
    Ok(col
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Reads a date column stored as `Date`, `Datetime` or text.
fn date_values(df: &DataFrame, name: &str) -> Result<Vec<Option<Date>>> {
    let col = column(df, name)?;
    match col.dtype() {
        DataType::String => Ok(col
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_date))
            .collect()),
        DataType::Date | DataType::Datetime(_, _) => column_dates(col),
        other => Err(LastroError::InvalidDate(format!(
            "column {name} has non-date type {other}"
        ))),
    }
}

fn index_date_values(df: &DataFrame) -> Result<Vec<Option<Date>>> {
    INDEX_DATE_COLUMNS
        .iter()
        .find(|name| df.get_column_index(name).is_some())
        .map_or_else(
            || Err(LastroError::MissingColumn(INDEX_DATE_COLUMNS.join(" | "))),
            |name| date_values(df, name),
        )
}

/// Parses an optional share-class label; unknown labels match no class.
fn share_class(label: Option<&str>) -> std::result::Result<Option<ShareClass>, String> {
    label.map_or(Ok(None), ShareClass::parse_label)
}

/// Builds fundamental records from a `_Fund` table.
///
/// Rows missing the balance date, share count or market value are dropped.
/// Other missing numbers read as zero, except an absent equivalence factor
/// column, which reads as 1. Yield columns are converted from percent.
pub fn fundamentals_from_frame(df: &DataFrame) -> Result<Vec<RawFundamentalRecord>> {
    let dates = date_values(df, "Data_balanco")?;
    let shares = float_values(df, "Num_acoes")?;
    let market_value = float_values(df, "Market_value")?;
    let equivalence = if df.get_column_index("Fator_equivalencia_acoes").is_some() {
        float_values(df, "Fator_equivalencia_acoes")?
    } else {
        vec![Some(1.0); df.height()]
    };

    let field = |name: &str| -> Result<Vec<f64>> {
        Ok(optional_float_values(df, name)?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    };
    let equity = field("PL")?;
    let revenue = field("RL")?;
    let ebitda = field("EBITDA")?;
    let depreciation = field("D&A")?;
    let ebit = field("EBIT")?;
    let net_income = field("LL")?;
    let net_income_controlling = field("LL_controlador")?;
    let net_income_minority = field("LL_nao_controlador")?;
    let gross_debt = field("Div_Bruta")?;
    let net_debt = field("Div_liq")?;
    let lease_debt = field("Div_Arrendamento")?;
    let operating_cash_flow = field("FCO")?;
    let investing_cash_flow = field("FCI")?;
    let financing_cash_flow = field("FCF")?;
    let closing_price = field("Preco_fechamento")?;
    let payout = field("Payout")?;
    let dividends = field("Proventos")?;
    let interest_on_equity = field("JCP")?;
    let yields = DIVIDEND_YIELD_COLUMNS
        .iter()
        .map(|name| field(name))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let (Some(date), Some(shares_outstanding), Some(mv)) = (dates[i], shares[i], market_value[i])
        else {
            continue;
        };
        let mut record = RawFundamentalRecord::new(date, shares_outstanding, mv);
        record.equivalence_factor = equivalence[i].unwrap_or(0.0);
        record.equity = equity[i];
        record.revenue = revenue[i];
        record.ebitda = ebitda[i];
        record.depreciation_amortization = depreciation[i];
        record.ebit = ebit[i];
        record.net_income = net_income[i];
        record.net_income_controlling = net_income_controlling[i];
        record.net_income_minority = net_income_minority[i];
        record.gross_debt = gross_debt[i];
        record.net_debt = net_debt[i];
        record.lease_debt = lease_debt[i];
        record.operating_cash_flow = operating_cash_flow[i];
        record.investing_cash_flow = investing_cash_flow[i];
        record.financing_cash_flow = financing_cash_flow[i];
        record.closing_price = closing_price[i];
        record.payout = payout[i];
        record.dividends = dividends[i];
        record.interest_on_equity = interest_on_equity[i];
        record.dividend_yield = std::array::from_fn(|h| yields[h][i] / 100.0);
        records.push(record);
    }

    let dropped = df.height() - records.len();
    if dropped > 0 {
        warn!(dropped, "dropped fundamental rows without date, shares or market value");
    }
    Ok(records)
}

/// Builds quotes from a `_Cot` table. Rows without a historical close are
/// dropped.
pub fn prices_from_frame(df: &DataFrame) -> Result<Vec<PriceRecord>> {
    let dates = index_date_values(df)?;
    let raw_close = float_values(df, "Fech_Historico")?;
    let field = |name: &str| -> Result<Vec<f64>> {
        Ok(optional_float_values(df, name)?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect())
    };
    let adjusted_close = field("Fech_Ajustado")?;
    let adjusted_open = field("Abertura_Ajustado")?;
    let adjusted_high = field("Max_Ajustado")?;
    let adjusted_low = field("Min_Ajustado")?;
    let adjusted_mean = field("Medio_Ajustado")?;
    let volume = field("Vol(MM_R$)")?;
    let trades = field("Negocios")?;

    let records: Vec<PriceRecord> = (0..df.height())
        .filter_map(|i| {
            Some(PriceRecord {
                date: dates[i]?,
                raw_close: raw_close[i]?,
                adjusted_close: adjusted_close[i],
                adjusted_open: adjusted_open[i],
                adjusted_high: adjusted_high[i],
                adjusted_low: adjusted_low[i],
                adjusted_mean: adjusted_mean[i],
                volume: volume[i],
                trades: trades[i],
            })
        })
        .collect();

    debug!(
        quotes = records.len(),
        dropped = df.height() - records.len(),
        "read quotes"
    );
    Ok(records)
}

/// Builds dividend payments from a `_Prov` table. Rows without an amount are
/// dropped.
pub fn dividends_from_frame(df: &DataFrame) -> Result<Vec<DividendRecord>> {
    let dates = index_date_values(df)?;
    let amounts = float_values(df, "Valor_do_Provento")?;
    let kinds = optional_text_values(df, "Tipo_do_Provento")?;
    let classes = optional_text_values(df, "Tipo")?;

    let mut records = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let (Some(ex_date), Some(amount)) = (dates[i], amounts[i]) else {
            continue;
        };
        let Ok(class) = share_class(classes[i].as_deref()) else {
            debug!(date = %ex_date, "skipping dividend with unknown share class");
            continue;
        };
        records.push(DividendRecord {
            ex_date,
            amount,
            kind: kinds[i]
                .as_deref()
                .map_or(DividendKind::Ordinary, DividendKind::parse_label),
            share_class: class,
        });
    }
    Ok(records)
}

/// Builds corporate-action events from an `_Eventos` table.
///
/// A missing factor is kept as `None` and neutralized during adjustment.
pub fn events_from_frame(df: &DataFrame) -> Result<Vec<CorporateActionEvent>> {
    let dates = index_date_values(df)?;
    let factors = float_values(df, "Fator")?;
    let classes = optional_text_values(df, "ClasseAcao")?;

    let mut events = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(date) = dates[i] else {
            continue;
        };
        let Ok(share_class) = share_class(classes[i].as_deref()) else {
            debug!(%date, "skipping event with unknown share class");
            continue;
        };
        events.push(CorporateActionEvent {
            date,
            factor: factors[i],
            share_class,
        });
    }
    Ok(events)
}

/// Raw inputs of one instrument.
#[derive(Debug, Clone, Default)]
pub struct InstrumentInputs {
    /// Ticker, e.g. `PETR4`.
    pub ticker: Symbol,
    /// Share class derived from the ticker, `None` if it has none.
    pub share_class: Option<ShareClass>,
    /// Quarterly reports.
    pub fundamentals: Vec<RawFundamentalRecord>,
    /// Daily quotes.
    pub prices: Vec<PriceRecord>,
    /// Dividend payments of every class.
    pub dividends: Vec<DividendRecord>,
    /// Corporate-action events of every class.
    pub events: Vec<CorporateActionEvent>,
}

/// A directory of raw per-ticker Parquet files.
#[derive(Debug, Clone)]
pub struct RawStore {
    dir: PathBuf,
}

impl RawStore {
    /// Opens the raw directory at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The raw directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, ticker: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{ticker}_{suffix}.parquet"))
    }

    /// Loads every input of `ticker`.
    ///
    /// # Errors
    ///
    /// Fails if the fundamentals or quotes file is missing or unreadable, or
    /// a required column is absent.
    pub fn load(&self, ticker: &str) -> Result<InstrumentInputs> {
        let fundamentals = fundamentals_from_frame(&read_parquet(&self.path(ticker, "Fund"))?)?;
        let prices = prices_from_frame(&read_parquet(&self.path(ticker, "Cot"))?)?;

        let dividends = match read_optional(&self.path(ticker, "Prov"))? {
            Some(df) => dividends_from_frame(&df)?,
            None => Vec::new(),
        };
        let events = match read_optional(&self.path(ticker, "Eventos"))? {
            Some(df) => events_from_frame(&df)?,
            None => Vec::new(),
        };

        debug!(
            ticker,
            reports = fundamentals.len(),
            quotes = prices.len(),
            dividends = dividends.len(),
            events = events.len(),
            "loaded raw inputs"
        );
        Ok(InstrumentInputs {
            ticker: ticker.to_string(),
            share_class: ShareClass::from_ticker(ticker),
            fundamentals,
            prices,
            dividends,
            events,
        })
    }

    /// Tickers with a fundamentals file in the directory, sorted.
    pub fn tickers(&self) -> Result<Vec<Symbol>> {
        let mut tickers: Vec<Symbol> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_suffix("_Fund.parquet"))
                    .map(str::to_string)
            })
            .collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// Reads a Parquet file into a frame.
pub fn read_parquet(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    Ok(ParquetReader::new(file).finish()?)
}

fn read_optional(path: &Path) -> Result<Option<DataFrame>> {
    if path.exists() {
        read_parquet(path).map(Some)
    } else {
        Ok(None)
    }
}
