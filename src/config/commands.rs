use crate::api::options::DEFAULT_GREEKS_INTERVAL_MS;
use crate::api::stocks_historical::DEFAULT_INTERVAL_MS;
use crate::domain::contract::{
    DateRange, GreeksInputs, OptionChain, OptionContract, Right, TimeWindow, Venue,
};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_interval, validate_symbol, validate_symbols, Validate};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Stock quotes, trades and reports
    #[command(arg_required_else_help = true)]
    Stocks(StocksArgs),
    /// Option quotes, trades, open interest and greeks
    #[command(arg_required_else_help = true)]
    Options(OptionsArgs),
}

impl Command {
    /// Parses a command line without the program name, as written in batch
    /// job definitions (`stocks historical eod-report AAPL 20240101 20240131`).
    pub fn parse_line(line: &str) -> Result<Self> {
        let args = std::iter::once("theta-etl").chain(line.split_whitespace());
        JobLine::try_parse_from(args)
            .map(|job| job.command)
            .map_err(|e| EtlError::ConfigValidationError {
                field: "jobs.command".to_string(),
                message: format!("'{}': {}", line, e.render()),
            })
    }
}

/// Checks every argument the wrappers would check, without a request.
impl Validate for Command {
    fn validate(&self) -> Result<()> {
        match self {
            Command::Stocks(StocksArgs { command }) => match command {
                StocksCommand::Historical(args) => args.command.validate(),
                StocksCommand::Snapshot(args) => args.command.validate(),
            },
            Command::Options(OptionsArgs { command }) => match command {
                OptionsCommand::Historical(args) => args.command.validate(),
                OptionsCommand::Bulk(args) => args.command.validate(),
                OptionsCommand::Snapshot(args) => args.command.validate(),
            },
        }
    }
}

#[derive(Debug, Parser)]
struct JobLine {
    #[command(subcommand)]
    command: Command,
}

// ---- stocks ----

#[derive(Debug, Clone, Args)]
pub struct StocksArgs {
    #[command(subcommand)]
    pub command: StocksCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum StocksCommand {
    /// Historical stock data over a date range
    #[command(arg_required_else_help = true)]
    Historical(StocksHistoricalArgs),
    /// Real-time stock snapshots
    #[command(arg_required_else_help = true)]
    Snapshot(StocksSnapshotArgs),
}

#[derive(Debug, Clone, Args)]
pub struct StocksHistoricalArgs {
    #[command(subcommand)]
    pub command: StocksHistoricalCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum StocksHistoricalCommand {
    /// End-of-day reports
    EodReport(SymbolRangeArgs),
    /// NBBO quotes
    Quotes(SymbolIntervalArgs),
    /// OHLC bars
    Ohlc(SymbolIntervalArgs),
    /// Every trade
    Trades(SymbolRangeArgs),
    /// Trades paired with the prevailing quote
    TradeQuote(SymbolRangeArgs),
    /// Stock splits
    Splits(SymbolRangeArgs),
    /// Dividends
    Dividends(SymbolRangeArgs),
}

impl Validate for StocksHistoricalCommand {
    fn validate(&self) -> Result<()> {
        use StocksHistoricalCommand as C;
        match self {
            C::Quotes(a) | C::Ohlc(a) => {
                a.target.validate()?;
                validate_interval("interval", a.interval, true)
            }
            C::EodReport(a) | C::Trades(a) | C::TradeQuote(a) | C::Splits(a) | C::Dividends(a) => {
                a.validate()
            }
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SymbolRangeArgs {
    /// Ticker symbol, e.g. AAPL
    pub symbol: String,
    #[command(flatten)]
    pub range: DateRangeArgs,
}

impl Validate for SymbolRangeArgs {
    fn validate(&self) -> Result<()> {
        validate_symbol("symbol", &self.symbol)?;
        self.range.to_range().map(|_| ())
    }
}

#[derive(Debug, Clone, Args)]
pub struct SymbolIntervalArgs {
    #[command(flatten)]
    pub target: SymbolRangeArgs,
    /// Interval in milliseconds, 0 for every tick
    #[arg(long, default_value_t = DEFAULT_INTERVAL_MS)]
    pub interval: u32,
}

#[derive(Debug, Clone, Subcommand)]
pub enum StocksSnapshotCommand {
    /// Latest quote
    Quotes {
        symbol: String,
        /// nqb or utp_cta
        #[arg(long)]
        venue: Option<Venue>,
    },
    /// Latest quotes for several symbols
    BulkQuotes {
        #[arg(required = true, num_args = 1..)]
        symbols: Vec<String>,
        #[arg(long)]
        venue: Option<Venue>,
    },
    /// Today's OHLC
    Ohlc { symbol: String },
    /// Today's OHLC for several symbols
    BulkOhlc {
        #[arg(required = true, num_args = 1..)]
        symbols: Vec<String>,
    },
    /// Last trade
    Trades { symbol: String },
}

impl Validate for StocksSnapshotCommand {
    fn validate(&self) -> Result<()> {
        use StocksSnapshotCommand as C;
        match self {
            C::Quotes { symbol, .. } | C::Ohlc { symbol } | C::Trades { symbol } => {
                validate_symbol("symbol", symbol)
            }
            C::BulkQuotes { symbols, .. } | C::BulkOhlc { symbols } => {
                validate_symbols("symbols", symbols.as_slice())
            }
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct StocksSnapshotArgs {
    #[command(subcommand)]
    pub command: StocksSnapshotCommand,
}

// ---- options ----

#[derive(Debug, Clone, Args)]
pub struct OptionsArgs {
    #[command(subcommand)]
    pub command: OptionsCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum OptionsCommand {
    /// Historical data for one contract
    #[command(arg_required_else_help = true)]
    Historical(OptionsHistoricalArgs),
    /// Historical data for every contract of a root and expiration
    #[command(arg_required_else_help = true)]
    Bulk(OptionsBulkArgs),
    /// Real-time option snapshots
    #[command(arg_required_else_help = true)]
    Snapshot(OptionsSnapshotArgs),
}

#[derive(Debug, Clone, Args)]
pub struct OptionsHistoricalArgs {
    #[command(subcommand)]
    pub command: OptionsHistoricalCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum OptionsHistoricalCommand {
    EodReport(ContractRangeArgs),
    Quotes {
        #[command(flatten)]
        target: ContractRangeArgs,
        /// Interval in milliseconds, 0 for every quote
        #[arg(long, default_value_t = 0)]
        ivl: u32,
        #[command(flatten)]
        session: SessionArgs,
        #[command(flatten)]
        window: TimeWindowArgs,
    },
    Ohlc {
        #[command(flatten)]
        target: ContractRangeArgs,
        #[arg(long)]
        ivl: u32,
        #[command(flatten)]
        session: SessionArgs,
        #[command(flatten)]
        window: TimeWindowArgs,
    },
    OpenInterest(ContractRangeArgs),
    Trades {
        #[command(flatten)]
        target: ContractRangeArgs,
        #[command(flatten)]
        window: TimeWindowArgs,
    },
    TradeQuote {
        #[command(flatten)]
        target: ContractRangeArgs,
        /// Match only quotes strictly before each trade
        #[arg(long)]
        exclusive: bool,
        #[command(flatten)]
        session: SessionArgs,
    },
    ImpliedVolatility(IntervalGreeksArgs),
    Greeks(TickGreeksArgs),
    GreeksSecondOrder(TickGreeksArgs),
    GreeksThirdOrder(TickGreeksArgs),
    AllGreeks(AllGreeksArgs),
    TradeGreeks(TradeGreeksArgs),
    TradeGreeksSecondOrder(TradeGreeksArgs),
    TradeGreeksThirdOrder(TradeGreeksArgs),
    QuoteAtTime(ContractAtTimeArgs),
    TradeAtTime(ContractAtTimeArgs),
}

impl Validate for OptionsHistoricalCommand {
    fn validate(&self) -> Result<()> {
        use OptionsHistoricalCommand as C;
        match self {
            C::EodReport(target) | C::OpenInterest(target) => target.resolve().map(|_| ()),
            C::Quotes {
                target, ivl, window, ..
            } => {
                target.resolve()?;
                window.to_window()?;
                validate_interval("ivl", *ivl, true)
            }
            C::Ohlc {
                target, ivl, window, ..
            } => {
                target.resolve()?;
                window.to_window()?;
                validate_interval("ivl", *ivl, false)
            }
            C::Trades { target, window } => {
                target.resolve()?;
                window.to_window().map(|_| ())
            }
            C::TradeQuote { target, .. } => target.resolve().map(|_| ()),
            C::ImpliedVolatility(a) => {
                a.target.resolve()?;
                validate_interval("ivl", a.ivl, false)
            }
            C::Greeks(a) | C::GreeksSecondOrder(a) | C::GreeksThirdOrder(a) => {
                a.target.resolve()?;
                validate_interval("ivl", a.ivl, true)
            }
            C::AllGreeks(a) => {
                a.target.resolve()?;
                validate_interval("ivl", a.ivl, true)
            }
            C::TradeGreeks(a) | C::TradeGreeksSecondOrder(a) | C::TradeGreeksThirdOrder(a) => {
                a.target.resolve().map(|_| ())
            }
            C::QuoteAtTime(a) | C::TradeAtTime(a) => {
                a.target.resolve()?;
                validate_interval("ivl", a.ivl, false)
            }
        }
    }
}

/// Greeks sampled every `ivl` ms, or on every quote when `ivl` is 0.
#[derive(Debug, Clone, Args)]
pub struct TickGreeksArgs {
    #[command(flatten)]
    pub target: ContractRangeArgs,
    #[arg(long, default_value_t = 0)]
    pub ivl: u32,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Debug, Clone, Args)]
pub struct IntervalGreeksArgs {
    #[command(flatten)]
    pub target: ContractRangeArgs,
    /// Interval in milliseconds, 100 to 3600000
    #[arg(long, default_value_t = DEFAULT_GREEKS_INTERVAL_MS)]
    pub ivl: u32,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Debug, Clone, Args)]
pub struct AllGreeksArgs {
    #[command(flatten)]
    pub target: ContractRangeArgs,
    /// Interval in milliseconds, 0 for every tick
    #[arg(long, default_value_t = DEFAULT_GREEKS_INTERVAL_MS)]
    pub ivl: u32,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Debug, Clone, Args)]
pub struct TradeGreeksArgs {
    #[command(flatten)]
    pub target: ContractRangeArgs,
    /// Sample the underlying once a second instead of every tick
    #[arg(long)]
    pub perf_boost: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ContractAtTimeArgs {
    #[command(flatten)]
    pub target: ContractRangeArgs,
    /// Sampling interval in milliseconds, 100 to 3600000
    #[arg(long)]
    pub ivl: u32,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Debug, Clone, Args)]
pub struct OptionsBulkArgs {
    #[command(subcommand)]
    pub command: OptionsBulkCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum OptionsBulkCommand {
    Eod {
        #[command(flatten)]
        target: ChainRangeArgs,
        #[command(flatten)]
        greeks: GreeksArgs,
    },
    Quote {
        #[command(flatten)]
        target: ChainRangeArgs,
        #[arg(long)]
        ivl: u32,
        #[command(flatten)]
        window: TimeWindowArgs,
    },
    Ohlc {
        #[command(flatten)]
        target: ChainRangeArgs,
        #[arg(long)]
        ivl: u32,
        #[command(flatten)]
        window: TimeWindowArgs,
    },
    OpenInterest(ChainRangeArgs),
    Trade {
        #[command(flatten)]
        target: ChainRangeArgs,
        #[arg(long)]
        ivl: Option<u32>,
        #[command(flatten)]
        window: TimeWindowArgs,
    },
    TradeQuote {
        #[command(flatten)]
        target: ChainRangeArgs,
        #[arg(long)]
        exclusive: bool,
    },
    EodGreeks {
        #[command(flatten)]
        target: ChainRangeArgs,
        #[command(flatten)]
        greeks: GreeksArgs,
    },
    TradeGreeks {
        #[command(flatten)]
        target: ChainRangeArgs,
        #[command(flatten)]
        greeks: GreeksArgs,
        #[arg(long)]
        perf_boost: bool,
    },
    QuoteAtTime(ChainAtTimeArgs),
    TradeAtTime(ChainAtTimeArgs),
}

impl Validate for OptionsBulkCommand {
    fn validate(&self) -> Result<()> {
        use OptionsBulkCommand as C;
        match self {
            C::Eod { target, .. }
            | C::EodGreeks { target, .. }
            | C::TradeGreeks { target, .. }
            | C::TradeQuote { target, .. }
            | C::OpenInterest(target) => target.resolve().map(|_| ()),
            C::Quote {
                target, ivl, window,
            }
            | C::Ohlc {
                target, ivl, window,
            } => {
                target.resolve()?;
                window.to_window()?;
                validate_interval("ivl", *ivl, false)
            }
            C::Trade {
                target, ivl, window,
            } => {
                target.resolve()?;
                window.to_window()?;
                match ivl {
                    Some(ivl) => validate_interval("ivl", *ivl, false),
                    None => Ok(()),
                }
            }
            C::QuoteAtTime(a) | C::TradeAtTime(a) => {
                a.target.resolve()?;
                validate_interval("ivl", a.ivl, false)
            }
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct OptionsSnapshotArgs {
    #[command(subcommand)]
    pub command: OptionsSnapshotCommand,
}

#[derive(Debug, Clone, Args)]
pub struct ChainAtTimeArgs {
    #[command(flatten)]
    pub target: ChainRangeArgs,
    #[arg(long)]
    pub ivl: u32,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Debug, Clone, Subcommand)]
pub enum OptionsSnapshotCommand {
    Quote(ContractArgs),
    Ohlc(ContractArgs),
    Trade(ContractArgs),
    OpenInterest(ContractArgs),
    BulkQuote(ChainArgs),
    BulkOhlc(ChainArgs),
    BulkOpenInterest(ChainArgs),
    BulkGreeks(ChainGreeksArgs),
    BulkGreeksSecondOrder(ChainGreeksArgs),
    BulkGreeksThirdOrder(ChainGreeksArgs),
}

impl Validate for OptionsSnapshotCommand {
    fn validate(&self) -> Result<()> {
        use OptionsSnapshotCommand as C;
        match self {
            C::Quote(a) | C::Ohlc(a) | C::Trade(a) | C::OpenInterest(a) => {
                a.to_contract().map(|_| ())
            }
            C::BulkQuote(a) | C::BulkOhlc(a) | C::BulkOpenInterest(a) => a.to_chain().map(|_| ()),
            C::BulkGreeks(a) | C::BulkGreeksSecondOrder(a) | C::BulkGreeksThirdOrder(a) => {
                a.chain.to_chain().map(|_| ())
            }
        }
    }
}

// ---- shared argument groups ----

#[derive(Debug, Clone, Args)]
pub struct DateRangeArgs {
    /// First day, YYYYMMDD
    pub start_date: String,
    /// Last day (inclusive), YYYYMMDD
    pub end_date: String,
}

impl DateRangeArgs {
    pub fn to_range(&self) -> Result<DateRange> {
        DateRange::new(&self.start_date, &self.end_date)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ContractArgs {
    /// Underlying root, e.g. AAPL
    pub root: String,
    /// Expiration, YYYYMMDD
    pub exp: String,
    /// Strike in 1/10th of a cent (170000 for $170)
    pub strike: u32,
    /// C or P
    pub right: Right,
}

impl ContractArgs {
    pub fn to_contract(&self) -> Result<OptionContract> {
        OptionContract::new(&self.root, &self.exp, self.strike, self.right)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ContractRangeArgs {
    #[command(flatten)]
    pub contract: ContractArgs,
    #[command(flatten)]
    pub range: DateRangeArgs,
}

impl ContractRangeArgs {
    pub fn resolve(&self) -> Result<(OptionContract, DateRange)> {
        Ok((self.contract.to_contract()?, self.range.to_range()?))
    }
}

#[derive(Debug, Clone, Args)]
pub struct ChainArgs {
    pub root: String,
    /// Expiration, YYYYMMDD, or 0 for every expiration
    pub exp: String,
}

impl ChainArgs {
    pub fn to_chain(&self) -> Result<OptionChain> {
        OptionChain::new(&self.root, &self.exp)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ChainRangeArgs {
    #[command(flatten)]
    pub chain: ChainArgs,
    #[command(flatten)]
    pub range: DateRangeArgs,
}

impl ChainRangeArgs {
    pub fn resolve(&self) -> Result<(OptionChain, DateRange)> {
        Ok((self.chain.to_chain()?, self.range.to_range()?))
    }
}

#[derive(Debug, Clone, Args)]
pub struct ChainGreeksArgs {
    #[command(flatten)]
    pub chain: ChainArgs,
    #[command(flatten)]
    pub greeks: GreeksArgs,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GreeksArgs {
    /// Annualized expected dividend
    #[arg(long)]
    pub annual_div: Option<f64>,
    /// Interest rate type, e.g. SOFR
    #[arg(long)]
    pub rate: Option<String>,
    /// Annualized rate, overrides --rate (0.0342 for 3.42%)
    #[arg(long)]
    pub rate_value: Option<f64>,
    /// Underlying price to use
    #[arg(long)]
    pub under_price: Option<f64>,
}

impl GreeksArgs {
    pub fn to_inputs(&self) -> GreeksInputs {
        GreeksInputs {
            annual_div: self.annual_div,
            rate: self.rate.clone(),
            rate_value: self.rate_value,
            under_price: self.under_price,
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct TimeWindowArgs {
    /// Milliseconds since midnight ET to start from
    #[arg(long)]
    pub start_time: Option<String>,
    /// Milliseconds since midnight ET to stop at
    #[arg(long)]
    pub end_time: Option<String>,
}

impl TimeWindowArgs {
    pub fn to_window(&self) -> Result<TimeWindow> {
        TimeWindow::new(self.start_time.clone(), self.end_time.clone())
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct SessionArgs {
    /// Include data outside regular trading hours
    #[arg(long)]
    pub no_rth: bool,
}

impl SessionArgs {
    pub fn rth(&self) -> bool {
        !self.no_rth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_stock_ohlc_with_interval() {
        let command =
            Command::parse_line("stocks historical ohlc AAPL 20240101 20240131 --interval 60000")
                .unwrap();
        match command {
            Command::Stocks(StocksArgs {
                command:
                    StocksCommand::Historical(StocksHistoricalArgs {
                        command: StocksHistoricalCommand::Ohlc(args),
                    }),
            }) => {
                assert_eq!(args.target.symbol, "AAPL");
                assert_eq!(args.target.range.end_date, "20240131");
                assert_eq!(args.interval, 60_000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_line_contract_argument_order() {
        let command = Command::parse_line(
            "options historical greeks AAPL 20240119 170000 P 20240102 20240105 --no-rth",
        )
        .unwrap();
        let Command::Options(OptionsArgs {
            command:
                OptionsCommand::Historical(OptionsHistoricalArgs {
                    command: OptionsHistoricalCommand::Greeks(args),
                }),
        }) = command
        else {
            panic!("expected options historical greeks");
        };
        assert_eq!(args.target.contract.strike, 170000);
        assert_eq!(args.target.contract.right, Right::Put);
        assert_eq!(args.ivl, 0);
        assert!(!args.session.rth());
    }

    #[test]
    fn test_parse_line_rejects_bad_right() {
        assert!(Command::parse_line("options snapshot quote AAPL 20240119 170000 X").is_err());
        assert!(Command::parse_line("stocks").is_err());
    }

    #[test]
    fn test_all_greeks_takes_tick_interval() {
        let command = Command::parse_line(
            "options historical all-greeks AAPL 20240119 170000 C 20240102 20240105",
        )
        .unwrap();
        let Command::Options(OptionsArgs {
            command:
                OptionsCommand::Historical(OptionsHistoricalArgs {
                    command: OptionsHistoricalCommand::AllGreeks(args),
                }),
        }) = &command
        else {
            panic!("expected options historical all-greeks");
        };
        assert_eq!(args.ivl, DEFAULT_GREEKS_INTERVAL_MS);
        assert!(command.validate().is_ok());

        let tick = Command::parse_line(
            "options historical all-greeks AAPL 20240119 170000 C 20240102 20240105 --ivl 0",
        )
        .unwrap();
        assert!(tick.validate().is_ok());
    }

    #[test]
    fn test_validate_checks_dates_and_intervals() {
        let bad = [
            "stocks historical eod-report AAPL 20240230 20240301",
            "stocks historical eod-report AAPL 20240201 20240101",
            "stocks historical quotes AAPL 20240101 20240131 --interval 50",
            "options historical ohlc AAPL 20240119 170000 C 20240102 20240105 --ivl 0",
            "options historical implied-volatility AAPL 20240119 170000 C 20240102 20240105 --ivl 0",
            "options historical quotes AAPL 20240119 170000 C 20240102 20240105 --start-time 9am",
            "options bulk trade SPY 0 20240102 20240102 --ivl 3600001",
            "options snapshot quote AAPL 2024-01-19 170000 C",
            "options snapshot bulk-quote SPY 202401",
        ];
        for line in bad {
            let command = Command::parse_line(line).unwrap();
            assert!(command.validate().is_err(), "{}", line);
        }

        let good = [
            "stocks historical quotes AAPL 20240101 20240131 --interval 0",
            "options historical greeks AAPL 20240119 170000 C 20240102 20240105",
            "options bulk quote SPY 0 20240102 20240102 --ivl 60000",
            "stocks snapshot bulk-ohlc AAPL MSFT",
        ];
        for line in good {
            assert!(Command::parse_line(line).unwrap().validate().is_ok(), "{}", line);
        }
    }

    #[test]
    fn test_at_time_requires_ivl() {
        assert!(
            Command::parse_line("options bulk quote-at-time SPY 0 20240102 20240102").is_err()
        );
        assert!(Command::parse_line(
            "options bulk quote-at-time SPY 0 20240102 20240102 --ivl 60000"
        )
        .is_ok());
    }
}
