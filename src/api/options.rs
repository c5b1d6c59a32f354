use crate::core::etl::EtlEngine;
use crate::core::{DataRequest, FetchOutput, Pipeline};
use crate::domain::contract::{DateRange, GreeksInputs, OptionChain, OptionContract, TimeWindow};
use crate::utils::error::Result;
use crate::utils::validation::validate_interval;

/// Default sampling interval for implied volatility and all-greeks requests.
pub const DEFAULT_GREEKS_INTERVAL_MS: u32 = 900_000;

const DEFAULT_RATE: &str = "SOFR";

/// Option data: single contracts, whole chains ("bulk") and snapshots.
///
/// Per-contract files are named `<datatype>_<ROOT>_<EXP>_<STRIKE>_<RIGHT>.csv`,
/// chain files `<datatype>_<ROOT>_<EXP>.csv`.
pub struct Options<'a, P: Pipeline> {
    engine: &'a EtlEngine<P>,
}

impl<'a, P: Pipeline> Options<'a, P> {
    pub fn new(engine: &'a EtlEngine<P>) -> Self {
        Self { engine }
    }

    async fn fetch(&self, request: DataRequest, write_csv: bool) -> Result<FetchOutput> {
        self.engine.run(&request.write_csv(write_csv)).await
    }

    // ---- at time ----

    /// Last NBBO quote at each `ivl` milliseconds of the day.
    pub async fn get_quote_at_time(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = at_time(
            contract_range("/v2/at_time/option/quote", "option_quote", contract, range),
            ivl,
            rth,
        )?;
        self.fetch(request, write_csv).await
    }

    pub async fn get_trade_at_time(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = at_time(
            contract_range("/v2/at_time/option/trade", "option_trade", contract, range),
            ivl,
            rth,
        )?;
        self.fetch(request, write_csv).await
    }

    pub async fn get_bulk_quote_at_time(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = at_time(
            chain_range("/v2/bulk_at_time/option/quote", "bulk_option_quote", chain, range),
            ivl,
            rth,
        )?;
        self.fetch(request, write_csv).await
    }

    pub async fn get_bulk_trade_at_time(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = at_time(
            chain_range("/v2/bulk_at_time/option/trade", "bulk_option_trade", chain, range),
            ivl,
            rth,
        )?;
        self.fetch(request, write_csv).await
    }

    // ---- historical, one contract ----

    /// National EOD report, generated at 17:15 ET each day.
    pub async fn get_historical_eod_report(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_range("/v2/hist/option/eod", "historical_eod", contract, range);
        self.fetch(request, write_csv).await
    }

    /// NBBO quotes. An `ivl` of `0` returns every quote.
    pub async fn get_historical_quotes(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        window: &TimeWindow,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = sampled(
            contract_range("/v2/hist/option/quote", "historical_quotes", contract, range),
            ivl,
            rth,
            true,
        )?;
        self.fetch(window.apply(request), write_csv).await
    }

    pub async fn get_historical_ohlc(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        window: &TimeWindow,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = sampled(
            contract_range("/v2/hist/option/ohlc", "historical_ohlc", contract, range),
            ivl,
            rth,
            false,
        )?;
        self.fetch(window.apply(request), write_csv).await
    }

    pub async fn get_historical_open_interest(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_range(
            "/v2/hist/option/open_interest",
            "historical_open_interest",
            contract,
            range,
        );
        self.fetch(request, write_csv).await
    }

    pub async fn get_historical_trades(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        window: &TimeWindow,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_range("/v2/hist/option/trade", "historical_trades", contract, range);
        self.fetch(window.apply(request), write_csv).await
    }

    /// Trades paired with the NBBO in effect. With `exclusive`, only quotes
    /// strictly before the trade are matched.
    pub async fn get_historical_trade_quote(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        exclusive: bool,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_range(
            "/v2/hist/option/trade_quote",
            "historical_trade_quote",
            contract,
            range,
        )
        .flag("exclusive", exclusive)
        .flag("rth", rth);
        self.fetch(request, write_csv).await
    }

    pub async fn get_historical_implied_volatility(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = sampled(
            contract_range(
                "/v2/hist/option/implied_volatility",
                "historical_implied_volatility",
                contract,
                range,
            ),
            ivl,
            rth,
            false,
        )?;
        self.fetch(request, write_csv).await
    }

    /// First order greeks. An `ivl` of `0` computes them on every quote.
    pub async fn get_historical_greeks(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = sampled(
            contract_range("/v2/hist/option/greeks", "historical_greeks", contract, range),
            ivl,
            rth,
            true,
        )?;
        self.fetch(request, write_csv).await
    }

    pub async fn get_historical_greeks_second_order(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = sampled(
            contract_range(
                "/v2/hist/option/greeks_second_order",
                "historical_greeks_second_order",
                contract,
                range,
            ),
            ivl,
            rth,
            true,
        )?;
        self.fetch(request, write_csv).await
    }

    pub async fn get_historical_greeks_third_order(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = sampled(
            contract_range(
                "/v2/hist/option/greeks_third_order",
                "historical_greeks_third_order",
                contract,
                range,
            ),
            ivl,
            rth,
            true,
        )?;
        self.fetch(request, write_csv).await
    }

    /// Greeks of every order in one table. An `ivl` of `0` computes them on
    /// every quote.
    pub async fn get_historical_all_greeks(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        ivl: u32,
        rth: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = sampled(
            contract_range(
                "/v2/hist/option/all_greeks",
                "historical_all_greeks",
                contract,
                range,
            ),
            ivl,
            rth,
            true,
        )?;
        self.fetch(request, write_csv).await
    }

    /// Greeks computed at each trade. `perf_boost` samples the underlying
    /// once a second instead of tick by tick.
    pub async fn get_historical_trade_greeks(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        perf_boost: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_range(
            "/v2/hist/option/trade_greeks",
            "historical_trade_greeks",
            contract,
            range,
        )
        .flag("perf_boost", perf_boost);
        self.fetch(request, write_csv).await
    }

    pub async fn get_historical_trade_greeks_second_order(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        perf_boost: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_range(
            "/v2/hist/option/trade_greeks_second_order",
            "historical_trade_greeks_second_order",
            contract,
            range,
        )
        .flag("perf_boost", perf_boost);
        self.fetch(request, write_csv).await
    }

    pub async fn get_historical_trade_greeks_third_order(
        &self,
        contract: &OptionContract,
        range: &DateRange,
        perf_boost: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_range(
            "/v2/hist/option/trade_greeks_third_order",
            "historical_trade_greeks_third_order",
            contract,
            range,
        )
        .flag("perf_boost", perf_boost);
        self.fetch(request, write_csv).await
    }

    // ---- historical, whole chain ----

    /// EOD report for every contract in the chain. Greeks default to no
    /// dividend and the SOFR rate.
    pub async fn get_bulk_eod(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        greeks: &GreeksInputs,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_range("/v2/bulk_hist/option/eod", "bulk_option_eod", chain, range);
        self.fetch(eod_greeks_defaults(greeks).apply(request), write_csv)
            .await
    }

    pub async fn get_bulk_quote(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        ivl: u32,
        window: &TimeWindow,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        validate_interval("ivl", ivl, false)?;
        let request = chain_range("/v2/bulk_hist/option/quote", "bulk_option_quote", chain, range)
            .param("ivl", ivl);
        self.fetch(window.apply(request), write_csv).await
    }

    pub async fn get_bulk_ohlc(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        ivl: u32,
        window: &TimeWindow,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        validate_interval("ivl", ivl, false)?;
        let request = chain_range("/v2/bulk_hist/option/ohlc", "bulk_option_ohlc", chain, range)
            .param("ivl", ivl);
        self.fetch(window.apply(request), write_csv).await
    }

    pub async fn get_bulk_open_interest(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_range(
            "/v2/bulk_hist/option/open_interest",
            "bulk_option_open_interest",
            chain,
            range,
        );
        self.fetch(request, write_csv).await
    }

    /// Every trade in the chain, or trades sampled every `ivl` ms when given.
    pub async fn get_bulk_trade(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        ivl: Option<u32>,
        window: &TimeWindow,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        if let Some(ivl) = ivl {
            validate_interval("ivl", ivl, false)?;
        }
        let request = chain_range("/v2/bulk_hist/option/trade", "bulk_option_trade", chain, range)
            .param_opt("ivl", ivl);
        self.fetch(window.apply(request), write_csv).await
    }

    pub async fn get_bulk_trade_quote(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        exclusive: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_range(
            "/v2/bulk_hist/option/trade_quote",
            "bulk_option_trade_quote",
            chain,
            range,
        )
        .flag("exclusive", exclusive);
        self.fetch(request, write_csv).await
    }

    pub async fn get_bulk_eod_greeks(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        greeks: &GreeksInputs,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_range(
            "/v2/bulk_hist/option/eod_greeks",
            "bulk_option_eod_greeks",
            chain,
            range,
        );
        self.fetch(greeks.apply(request), write_csv).await
    }

    pub async fn get_bulk_trade_greeks(
        &self,
        chain: &OptionChain,
        range: &DateRange,
        greeks: &GreeksInputs,
        perf_boost: bool,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_range(
            "/v2/bulk_hist/option/trade_greeks",
            "bulk_option_trade_greeks",
            chain,
            range,
        )
        .flag("perf_boost", perf_boost);
        self.fetch(greeks.apply(request), write_csv).await
    }

    // ---- snapshots ----
    // These return no rows while the market is closed.

    pub async fn get_quote_snapshot(
        &self,
        contract: &OptionContract,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_only(
            "/v2/snapshot/option/quote",
            "option_quote_snapshot",
            contract,
        );
        self.fetch(request, write_csv).await
    }

    pub async fn get_ohlc_snapshot(
        &self,
        contract: &OptionContract,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_only("/v2/snapshot/option/ohlc", "option_ohlc_snapshot", contract);
        self.fetch(request, write_csv).await
    }

    pub async fn get_trade_snapshot(
        &self,
        contract: &OptionContract,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_only(
            "/v2/snapshot/option/trade",
            "option_trade_snapshot",
            contract,
        );
        self.fetch(request, write_csv).await
    }

    pub async fn get_open_interest_snapshot(
        &self,
        contract: &OptionContract,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = contract_only(
            "/v2/snapshot/option/open_interest",
            "option_open_interest_snapshot",
            contract,
        );
        self.fetch(request, write_csv).await
    }

    pub async fn get_bulk_quotes_snapshot(
        &self,
        chain: &OptionChain,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_only(
            "/v2/bulk_snapshot/option/quote",
            "bulk_option_quotes_snapshot",
            chain,
        );
        self.fetch(request, write_csv).await
    }

    pub async fn get_bulk_open_interest_snapshot(
        &self,
        chain: &OptionChain,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_only(
            "/v2/bulk_snapshot/option/open_interest",
            "bulk_option_open_interest_snapshot",
            chain,
        );
        self.fetch(request, write_csv).await
    }

    pub async fn get_bulk_ohlc_snapshot(
        &self,
        chain: &OptionChain,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_only(
            "/v2/bulk_snapshot/option/ohlc",
            "bulk_option_ohlc_snapshot",
            chain,
        );
        self.fetch(request, write_csv).await
    }

    pub async fn get_bulk_greeks_snapshot(
        &self,
        chain: &OptionChain,
        greeks: &GreeksInputs,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_only(
            "/v2/bulk_snapshot/option/greeks",
            "bulk_option_greeks_snapshot",
            chain,
        );
        self.fetch(greeks.apply(request), write_csv).await
    }

    pub async fn get_bulk_greeks_second_order_snapshot(
        &self,
        chain: &OptionChain,
        greeks: &GreeksInputs,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_only(
            "/v2/bulk_snapshot/option/greeks_second_order",
            "bulk_option_greeks_second_order_snapshot",
            chain,
        );
        self.fetch(greeks.apply(request), write_csv).await
    }

    pub async fn get_bulk_greeks_third_order_snapshot(
        &self,
        chain: &OptionChain,
        greeks: &GreeksInputs,
        write_csv: bool,
    ) -> Result<FetchOutput> {
        let request = chain_only(
            "/v2/bulk_snapshot/option/greeks_third_order",
            "bulk_option_greeks_third_order_snapshot",
            chain,
        );
        self.fetch(greeks.apply(request), write_csv).await
    }
}

fn contract_only(endpoint: &str, datatype: &str, contract: &OptionContract) -> DataRequest {
    contract.apply(DataRequest::new(endpoint, datatype, contract.identifier()))
}

fn contract_range(
    endpoint: &str,
    datatype: &str,
    contract: &OptionContract,
    range: &DateRange,
) -> DataRequest {
    range.apply(contract_only(endpoint, datatype, contract))
}

fn chain_only(endpoint: &str, datatype: &str, chain: &OptionChain) -> DataRequest {
    chain.apply(DataRequest::new(endpoint, datatype, chain.identifier()))
}

fn chain_range(endpoint: &str, datatype: &str, chain: &OptionChain, range: &DateRange) -> DataRequest {
    range.apply(chain_only(endpoint, datatype, chain))
}

fn at_time(request: DataRequest, ivl: u32, rth: bool) -> Result<DataRequest> {
    sampled(request, ivl, rth, false)
}

/// Adds `ivl` and `rth`. `allow_tick` admits an interval of `0`.
fn sampled(request: DataRequest, ivl: u32, rth: bool, allow_tick: bool) -> Result<DataRequest> {
    validate_interval("ivl", ivl, allow_tick)?;
    Ok(request.param("ivl", ivl).flag("rth", rth))
}

fn eod_greeks_defaults(greeks: &GreeksInputs) -> GreeksInputs {
    GreeksInputs {
        annual_div: greeks.annual_div.or(Some(0.0)),
        rate: greeks
            .rate
            .clone()
            .or_else(|| Some(DEFAULT_RATE.to_string())),
        ..greeks.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::Right;

    fn contract() -> OptionContract {
        OptionContract::new("AAPL", "20240119", 170000, Right::Call).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new("20240102", "20240105").unwrap()
    }

    #[test]
    fn test_contract_range_param_order() {
        let request = contract_range("/v2/hist/option/eod", "historical_eod", &contract(), &range());
        let keys: Vec<&str> = request.params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            ["root", "exp", "strike", "right", "start_date", "end_date"]
        );
        assert_eq!(request.file_name(), "historical_eod_AAPL_20240119_170000_C.csv");
    }

    #[test]
    fn test_at_time_requires_real_interval() {
        let base = || contract_range("/v2/at_time/option/quote", "option_quote", &contract(), &range());
        assert!(at_time(base(), 0, true).is_err());

        let request = at_time(base(), 60_000, false).unwrap();
        assert_eq!(request.param_value("ivl"), Some("60000"));
        assert_eq!(request.param_value("rth"), Some("false"));
    }

    #[test]
    fn test_greeks_interval_tick_rules() {
        let chain = OptionChain::new("SPY", "0").unwrap();
        let base = || chain_only("/x", "x", &chain);
        assert!(sampled(base(), 0, true, true).is_ok());
        assert!(sampled(base(), 0, true, false).is_err());
        assert!(sampled(base(), 4_000_000, true, true).is_err());
    }

    #[test]
    fn test_eod_greeks_defaults_keep_explicit_values() {
        let defaults = eod_greeks_defaults(&GreeksInputs::default());
        assert_eq!(defaults.annual_div, Some(0.0));
        assert_eq!(defaults.rate.as_deref(), Some("SOFR"));

        let explicit = eod_greeks_defaults(&GreeksInputs {
            rate: Some("TREASURY_M1".into()),
            rate_value: Some(0.0342),
            ..Default::default()
        });
        assert_eq!(explicit.rate.as_deref(), Some("TREASURY_M1"));
        assert_eq!(explicit.rate_value, Some(0.0342));
    }

    #[test]
    fn test_bulk_eod_sends_zero_dividend() {
        let chain = OptionChain::new("SPY", "20240119").unwrap();
        let request = eod_greeks_defaults(&GreeksInputs::default())
            .apply(chain_range("/v2/bulk_hist/option/eod", "bulk_option_eod", &chain, &range()));
        assert_eq!(request.param_value("annual_div"), Some("0"));
        assert_eq!(request.param_value("rate"), Some("SOFR"));
        assert_eq!(request.param_value("under_price"), None);
        assert_eq!(request.file_name(), "bulk_option_eod_SPY_20240119.csv");
    }
}
