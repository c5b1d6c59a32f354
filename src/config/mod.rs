pub mod cli;
#[cfg(feature = "cli")]
pub mod commands;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use self::args::CliConfig;

#[cfg(feature = "cli")]
mod args {
    use super::commands::Command;
    use crate::core::pipeline::DEFAULT_BASE_URL;
    use crate::core::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "theta-etl")]
    #[command(about = "Download Theta Terminal market data to CSV")]
    #[command(arg_required_else_help = true)]
    pub struct CliConfig {
        /// Theta Terminal REST address
        #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
        pub base_url: String,

        /// Directory CSV files are written to
        #[arg(long, global = true, default_value = "./")]
        pub output_dir: String,

        #[arg(long, global = true, default_value_t = 60)]
        pub timeout_secs: u64,

        #[arg(long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Log request and memory statistics")]
        pub monitor: bool,

        #[arg(long, global = true, help = "Hide the loading spinner")]
        pub no_progress: bool,

        /// Print the table as CSV on stdout instead of writing a file
        #[arg(long, global = true)]
        pub stdout: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    impl ConfigProvider for CliConfig {
        fn base_url(&self) -> &str {
            &self.base_url
        }

        fn output_path(&self) -> &str {
            &self.output_dir
        }

        fn timeout_secs(&self) -> u64 {
            self.timeout_secs
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_url("base_url", &self.base_url)?;
            validate_path("output_dir", &self.output_dir)?;
            validate_range("timeout_secs", self.timeout_secs, 1, 3600)?;
            self.command.validate()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::config::commands::{OptionsCommand, StocksCommand};

        #[test]
        fn test_defaults() {
            let config =
                CliConfig::try_parse_from(["theta-etl", "stocks", "snapshot", "ohlc", "AAPL"])
                    .unwrap();
            assert_eq!(config.base_url(), "http://127.0.0.1:25510");
            assert_eq!(config.output_path(), "./");
            assert_eq!(config.timeout_secs(), 60);
            assert!(!config.stdout);
            assert!(config.validate().is_ok());
            assert!(matches!(
                config.command,
                Command::Stocks(ref s) if matches!(s.command, StocksCommand::Snapshot(_))
            ));
        }

        #[test]
        fn test_global_flags_after_subcommand() {
            let config = CliConfig::try_parse_from([
                "theta-etl",
                "options",
                "snapshot",
                "bulk-quote",
                "SPY",
                "0",
                "--output-dir",
                "/tmp/theta",
                "--stdout",
            ])
            .unwrap();
            assert_eq!(config.output_dir, "/tmp/theta");
            assert!(config.stdout);
            assert!(matches!(
                config.command,
                Command::Options(ref o) if matches!(o.command, OptionsCommand::Snapshot(_))
            ));
        }

        #[test]
        fn test_validation_rejects_bad_base_url() {
            let config = CliConfig::try_parse_from([
                "theta-etl",
                "--base-url",
                "ftp://localhost",
                "stocks",
                "snapshot",
                "trades",
                "AAPL",
            ])
            .unwrap();
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_group_without_subcommand_is_rejected() {
            assert!(CliConfig::try_parse_from(["theta-etl", "options", "bulk"]).is_err());
        }
    }
}
