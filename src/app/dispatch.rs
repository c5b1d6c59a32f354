use crate::config::commands::*;
use crate::core::etl::EtlEngine;
use crate::core::{FetchOutput, Pipeline};
use crate::utils::error::Result;

/// Runs one parsed command through the matching wrapper method.
pub async fn execute<P: Pipeline>(
    engine: &EtlEngine<P>,
    command: &Command,
    write_csv: bool,
) -> Result<FetchOutput> {
    match command {
        Command::Stocks(StocksArgs { command }) => match command {
            StocksCommand::Historical(args) => {
                stocks_historical(engine, &args.command, write_csv).await
            }
            StocksCommand::Snapshot(args) => stocks_snapshot(engine, &args.command, write_csv).await,
        },
        Command::Options(OptionsArgs { command }) => match command {
            OptionsCommand::Historical(args) => {
                options_historical(engine, &args.command, write_csv).await
            }
            OptionsCommand::Bulk(args) => options_bulk(engine, &args.command, write_csv).await,
            OptionsCommand::Snapshot(args) => {
                options_snapshot(engine, &args.command, write_csv).await
            }
        },
    }
}

async fn stocks_historical<P: Pipeline>(
    engine: &EtlEngine<P>,
    command: &StocksHistoricalCommand,
    write_csv: bool,
) -> Result<FetchOutput> {
    let api = engine.stocks_historical();
    match command {
        StocksHistoricalCommand::EodReport(a) => {
            api.get_eod_report(&a.symbol, &a.range.to_range()?, write_csv)
                .await
        }
        StocksHistoricalCommand::Quotes(a) => {
            let range = a.target.range.to_range()?;
            api.get_quotes(&a.target.symbol, &range, a.interval, write_csv)
                .await
        }
        StocksHistoricalCommand::Ohlc(a) => {
            let range = a.target.range.to_range()?;
            api.get_ohlc(&a.target.symbol, &range, a.interval, write_csv)
                .await
        }
        StocksHistoricalCommand::Trades(a) => {
            api.get_trades(&a.symbol, &a.range.to_range()?, write_csv)
                .await
        }
        StocksHistoricalCommand::TradeQuote(a) => {
            api.get_trade_quote(&a.symbol, &a.range.to_range()?, write_csv)
                .await
        }
        StocksHistoricalCommand::Splits(a) => {
            api.get_splits(&a.symbol, &a.range.to_range()?, write_csv)
                .await
        }
        StocksHistoricalCommand::Dividends(a) => {
            api.get_dividends(&a.symbol, &a.range.to_range()?, write_csv)
                .await
        }
    }
}

async fn stocks_snapshot<P: Pipeline>(
    engine: &EtlEngine<P>,
    command: &StocksSnapshotCommand,
    write_csv: bool,
) -> Result<FetchOutput> {
    let api = engine.stocks_snapshot();
    match command {
        StocksSnapshotCommand::Quotes { symbol, venue } => {
            api.get_quotes(symbol, *venue, write_csv).await
        }
        StocksSnapshotCommand::BulkQuotes { symbols, venue } => {
            api.get_bulk_quotes(symbols, *venue, write_csv).await
        }
        StocksSnapshotCommand::Ohlc { symbol } => api.get_ohlc(symbol, write_csv).await,
        StocksSnapshotCommand::BulkOhlc { symbols } => api.get_bulk_ohlc(symbols, write_csv).await,
        StocksSnapshotCommand::Trades { symbol } => api.get_trades(symbol, write_csv).await,
    }
}

async fn options_historical<P: Pipeline>(
    engine: &EtlEngine<P>,
    command: &OptionsHistoricalCommand,
    write_csv: bool,
) -> Result<FetchOutput> {
    use OptionsHistoricalCommand as C;

    let api = engine.options();
    match command {
        C::EodReport(a) => {
            let (contract, range) = a.resolve()?;
            api.get_historical_eod_report(&contract, &range, write_csv)
                .await
        }
        C::Quotes {
            target,
            ivl,
            session,
            window,
        } => {
            let (contract, range) = target.resolve()?;
            let window = window.to_window()?;
            api.get_historical_quotes(&contract, &range, *ivl, session.rth(), &window, write_csv)
                .await
        }
        C::Ohlc {
            target,
            ivl,
            session,
            window,
        } => {
            let (contract, range) = target.resolve()?;
            let window = window.to_window()?;
            api.get_historical_ohlc(&contract, &range, *ivl, session.rth(), &window, write_csv)
                .await
        }
        C::OpenInterest(a) => {
            let (contract, range) = a.resolve()?;
            api.get_historical_open_interest(&contract, &range, write_csv)
                .await
        }
        C::Trades { target, window } => {
            let (contract, range) = target.resolve()?;
            let window = window.to_window()?;
            api.get_historical_trades(&contract, &range, &window, write_csv)
                .await
        }
        C::TradeQuote {
            target,
            exclusive,
            session,
        } => {
            let (contract, range) = target.resolve()?;
            api.get_historical_trade_quote(&contract, &range, *exclusive, session.rth(), write_csv)
                .await
        }
        C::ImpliedVolatility(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_historical_implied_volatility(
                &contract,
                &range,
                a.ivl,
                a.session.rth(),
                write_csv,
            )
            .await
        }
        C::Greeks(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_historical_greeks(&contract, &range, a.ivl, a.session.rth(), write_csv)
                .await
        }
        C::GreeksSecondOrder(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_historical_greeks_second_order(
                &contract,
                &range,
                a.ivl,
                a.session.rth(),
                write_csv,
            )
            .await
        }
        C::GreeksThirdOrder(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_historical_greeks_third_order(
                &contract,
                &range,
                a.ivl,
                a.session.rth(),
                write_csv,
            )
            .await
        }
        C::AllGreeks(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_historical_all_greeks(&contract, &range, a.ivl, a.session.rth(), write_csv)
                .await
        }
        C::TradeGreeks(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_historical_trade_greeks(&contract, &range, a.perf_boost, write_csv)
                .await
        }
        C::TradeGreeksSecondOrder(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_historical_trade_greeks_second_order(&contract, &range, a.perf_boost, write_csv)
                .await
        }
        C::TradeGreeksThirdOrder(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_historical_trade_greeks_third_order(&contract, &range, a.perf_boost, write_csv)
                .await
        }
        C::QuoteAtTime(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_quote_at_time(&contract, &range, a.ivl, a.session.rth(), write_csv)
                .await
        }
        C::TradeAtTime(a) => {
            let (contract, range) = a.target.resolve()?;
            api.get_trade_at_time(&contract, &range, a.ivl, a.session.rth(), write_csv)
                .await
        }
    }
}

async fn options_bulk<P: Pipeline>(
    engine: &EtlEngine<P>,
    command: &OptionsBulkCommand,
    write_csv: bool,
) -> Result<FetchOutput> {
    use OptionsBulkCommand as C;

    let api = engine.options();
    match command {
        C::Eod { target, greeks } => {
            let (chain, range) = target.resolve()?;
            api.get_bulk_eod(&chain, &range, &greeks.to_inputs(), write_csv)
                .await
        }
        C::Quote {
            target,
            ivl,
            window,
        } => {
            let (chain, range) = target.resolve()?;
            let window = window.to_window()?;
            api.get_bulk_quote(&chain, &range, *ivl, &window, write_csv)
                .await
        }
        C::Ohlc {
            target,
            ivl,
            window,
        } => {
            let (chain, range) = target.resolve()?;
            let window = window.to_window()?;
            api.get_bulk_ohlc(&chain, &range, *ivl, &window, write_csv)
                .await
        }
        C::OpenInterest(a) => {
            let (chain, range) = a.resolve()?;
            api.get_bulk_open_interest(&chain, &range, write_csv).await
        }
        C::Trade {
            target,
            ivl,
            window,
        } => {
            let (chain, range) = target.resolve()?;
            let window = window.to_window()?;
            api.get_bulk_trade(&chain, &range, *ivl, &window, write_csv)
                .await
        }
        C::TradeQuote { target, exclusive } => {
            let (chain, range) = target.resolve()?;
            api.get_bulk_trade_quote(&chain, &range, *exclusive, write_csv)
                .await
        }
        C::EodGreeks { target, greeks } => {
            let (chain, range) = target.resolve()?;
            api.get_bulk_eod_greeks(&chain, &range, &greeks.to_inputs(), write_csv)
                .await
        }
        C::TradeGreeks {
            target,
            greeks,
            perf_boost,
        } => {
            let (chain, range) = target.resolve()?;
            api.get_bulk_trade_greeks(&chain, &range, &greeks.to_inputs(), *perf_boost, write_csv)
                .await
        }
        C::QuoteAtTime(a) => {
            let (chain, range) = a.target.resolve()?;
            api.get_bulk_quote_at_time(&chain, &range, a.ivl, a.session.rth(), write_csv)
                .await
        }
        C::TradeAtTime(a) => {
            let (chain, range) = a.target.resolve()?;
            api.get_bulk_trade_at_time(&chain, &range, a.ivl, a.session.rth(), write_csv)
                .await
        }
    }
}

async fn options_snapshot<P: Pipeline>(
    engine: &EtlEngine<P>,
    command: &OptionsSnapshotCommand,
    write_csv: bool,
) -> Result<FetchOutput> {
    use OptionsSnapshotCommand as C;

    let api = engine.options();
    match command {
        C::Quote(a) => api.get_quote_snapshot(&a.to_contract()?, write_csv).await,
        C::Ohlc(a) => api.get_ohlc_snapshot(&a.to_contract()?, write_csv).await,
        C::Trade(a) => api.get_trade_snapshot(&a.to_contract()?, write_csv).await,
        C::OpenInterest(a) => {
            api.get_open_interest_snapshot(&a.to_contract()?, write_csv)
                .await
        }
        C::BulkQuote(a) => api.get_bulk_quotes_snapshot(&a.to_chain()?, write_csv).await,
        C::BulkOhlc(a) => api.get_bulk_ohlc_snapshot(&a.to_chain()?, write_csv).await,
        C::BulkOpenInterest(a) => {
            api.get_bulk_open_interest_snapshot(&a.to_chain()?, write_csv)
                .await
        }
        C::BulkGreeks(a) => {
            api.get_bulk_greeks_snapshot(&a.chain.to_chain()?, &a.greeks.to_inputs(), write_csv)
                .await
        }
        C::BulkGreeksSecondOrder(a) => {
            let chain = a.chain.to_chain()?;
            api.get_bulk_greeks_second_order_snapshot(&chain, &a.greeks.to_inputs(), write_csv)
                .await
        }
        C::BulkGreeksThirdOrder(a) => {
            let chain = a.chain.to_chain()?;
            api.get_bulk_greeks_third_order_snapshot(&chain, &a.greeks.to_inputs(), write_csv)
                .await
        }
    }
}
