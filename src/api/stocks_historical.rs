use crate::core::etl::EtlEngine;
use crate::core::{DataRequest, FetchOutput, Pipeline};
use crate::domain::contract::DateRange;
use crate::utils::error::Result;
use crate::utils::validation::{validate_interval, validate_symbol};

pub const DEFAULT_INTERVAL_MS: u32 = 900_000;

/// Columns of the historical OHLC endpoint, used when its header omits them.
const OHLC_COLUMNS: [&str; 8] = [
    "ms_of_day", "open", "high", "low", "close", "volume", "count", "date",
];

/// Historical stock data over a date range. CSV files are named
/// `<datatype>_<SYMBOL>_<START>_<END>.csv`.
pub struct StocksHistorical<'a, P: Pipeline> {
    engine: &'a EtlEngine<P>,
}

impl<'a, P: Pipeline> StocksHistorical<'a, P> {
    pub fn new(engine: &'a EtlEngine<P>) -> Self {
        Self { engine }
    }

    async fn fetch(&self, request: Result<DataRequest>, write_csv: bool) -> Result<FetchOutput> {
        self.engine.run(&request?.write_csv(write_csv)).await
    }

    /// National end-of-day report, one row per trading day.
    pub async fn get_eod_report(
        &self,
        symbol: &str,
        range: &DateRange,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        self.fetch(request("/v2/hist/stock/eod", "eod_report", symbol, range), write_csv)
            .await
    }

    /// NBBO quotes sampled every `interval` ms (`0` for every quote).
    pub async fn get_quotes(
        &self,
        symbol: &str,
        range: &DateRange,
        interval: u32,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = interval_request("/v2/hist/stock/quote", "quotes", symbol, range, interval);
        self.fetch(request, write_csv).await
    }

    pub async fn get_ohlc(
        &self,
        symbol: &str,
        range: &DateRange,
        interval: u32,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = interval_request("/v2/hist/stock/ohlc", "ohlc", symbol, range, interval)
            .map(|r| r.fallback_columns(&OHLC_COLUMNS));
        self.fetch(request, write_csv).await
    }

    pub async fn get_trades(
        &self,
        symbol: &str,
        range: &DateRange,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        self.fetch(request("/v2/hist/stock/trade", "trades", symbol, range), write_csv)
            .await
    }

    /// Every trade paired with the NBBO quote in effect at the time.
    pub async fn get_trade_quote(
        &self,
        symbol: &str,
        range: &DateRange,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = request("/v2/hist/stock/trade_quote", "trade_quote", symbol, range);
        self.fetch(request, write_csv).await
    }

    pub async fn get_splits(
        &self,
        symbol: &str,
        range: &DateRange,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        self.fetch(request("/v2/hist/stock/split", "splits", symbol, range), write_csv)
            .await
    }

    pub async fn get_dividends(
        &self,
        symbol: &str,
        range: &DateRange,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = request("/v2/hist/stock/dividend", "dividends", symbol, range);
        self.fetch(request, write_csv).await
    }
}

fn request(endpoint: &str, datatype: &str, symbol: &str, range: &DateRange) -> Result<DataRequest> {
    validate_symbol("symbol", symbol)?;
    let identifier = format!("{}_{}_{}", symbol, range.start_date(), range.end_date());
    Ok(range.apply(DataRequest::new(endpoint, datatype, identifier).param("root", symbol)))
}

fn interval_request(
    endpoint: &str,
    datatype: &str,
    symbol: &str,
    range: &DateRange,
    interval: u32,
) -> Result<DataRequest> {
    validate_interval("interval", interval, true)?;
    Ok(request(endpoint, datatype, symbol, range)?.param("ivl", interval))
}
