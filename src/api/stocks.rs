use crate::core::etl::EtlEngine;
use crate::core::{DataRequest, FetchOutput, Pipeline};
use crate::domain::contract::Venue;
use crate::utils::error::Result;
use crate::utils::validation::{validate_symbol, validate_symbols};

/// Real-time stock snapshots.
pub struct StocksSnapshot<'a, P: Pipeline> {
    engine: &'a EtlEngine<P>,
}

impl<'a, P: Pipeline> StocksSnapshot<'a, P> {
    pub fn new(engine: &'a EtlEngine<P>) -> Self {
        Self { engine }
    }

    /// Latest BBO quote for one symbol.
    pub async fn get_quotes(
        &self,
        symbol: &str,
        venue: Option<Venue>,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        self.engine.run(&quotes_request(symbol, venue)?.write_csv(write_csv)).await
    }

    /// Latest BBO quotes for several symbols in one request.
    pub async fn get_bulk_quotes<S: AsRef<str>>(
        &self,
        symbols: &[S],
        venue: Option<Venue>,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        self.engine
            .run(&bulk_quotes_request(symbols, venue)?.write_csv(write_csv))
            .await
    }

    pub async fn get_ohlc(&self, symbol: &str, write_csv: bool) -> Result<FetchOutput> {
        validate_symbol("symbol", symbol)?;
        let request = DataRequest::new("/v2/snapshot/stock/ohlc", "ohlc", symbol)
            .param("root", symbol)
            .write_csv(write_csv);
        self.engine.run(&request).await
    }

    pub async fn get_bulk_ohlc<S: AsRef<str>>(
        &self,
        symbols: &[S],
        write_csv: bool,
    ) -> Result<FetchOutput> {
        validate_symbols("symbols", symbols)?;
        let request = DataRequest::new("/v2/snapshot/stock/ohlc", "bulk_ohlc", join(symbols, "_"))
            .param("root", join(symbols, ","))
            .write_csv(write_csv);
        self.engine.run(&request).await
    }

    /// Last trade for one symbol.
    pub async fn get_trades(&self, symbol: &str, write_csv: bool) -> Result<FetchOutput> {
        validate_symbol("symbol", symbol)?;
        let request = DataRequest::new("/v2/snapshot/stock/trade", "trades", symbol)
            .param("root", symbol)
            .write_csv(write_csv);
        self.engine.run(&request).await
    }
}

fn quotes_request(symbol: &str, venue: Option<Venue>) -> Result<DataRequest> {
    validate_symbol("symbol", symbol)?;
    Ok(DataRequest::new("/v2/snapshot/stock/quote", "quotes", symbol)
        .param("root", symbol)
        .param_opt("venue", venue))
}

fn bulk_quotes_request<S: AsRef<str>>(symbols: &[S], venue: Option<Venue>) -> Result<DataRequest> {
    validate_symbols("symbols", symbols)?;
    Ok(
        DataRequest::new("/v2/snapshot/stock/quote", "bulk_quotes", join(symbols, "_"))
            .param("root", join(symbols, ","))
            .param_opt("venue", venue),
    )
}

fn join<S: AsRef<str>>(symbols: &[S], separator: &str) -> String {
    symbols
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_request_with_venue() {
        let request = quotes_request("AAPL", Some(Venue::UtpCta)).unwrap();
        assert_eq!(request.endpoint, "/v2/snapshot/stock/quote");
        assert_eq!(request.param_value("root"), Some("AAPL"));
        assert_eq!(request.param_value("venue"), Some("utp_cta"));
        assert_eq!(request.file_name(), "quotes_AAPL.csv");
    }

    #[test]
    fn test_bulk_quotes_request_joins_symbols() {
        let request = bulk_quotes_request(&["AAPL", "MSFT", "NVDA"], None).unwrap();
        assert_eq!(request.param_value("root"), Some("AAPL,MSFT,NVDA"));
        assert_eq!(request.param_value("venue"), None);
        assert_eq!(request.file_name(), "bulk_quotes_AAPL_MSFT_NVDA.csv");
    }

    #[test]
    fn test_bulk_quotes_request_rejects_empty_list() {
        assert!(bulk_quotes_request::<&str>(&[], None).is_err());
    }
}
