//! Command-line interface definitions.
//!
//! Defines the CLI structure for the gpmarket application using `clap`.
//! Every command restores the engine from the configured journal, performs
//! one operation and exits.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use super::paths;
use crate::domain::market::MarketStatus;

/// LMSR prediction markets with a GP wallet ledger
#[derive(Parser, Debug)]
#[command(name = "gpmarket")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the gpmarket CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Create, inspect and settle markets
    #[command(subcommand)]
    Market(MarketCommand),

    /// Buy or sell outcome shares
    #[command(subcommand)]
    Trade(TradeCommand),

    /// Inspect and adjust GP wallets
    #[command(subcommand)]
    Wallet(WalletCommand),

    /// Show a user's open positions across markets
    Portfolio(UserArg),

    /// Re-sum every ledger and check share counts
    Audit,
}

/// Subcommands for `gpmarket config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Generate a new configuration file from template.
    Init(ConfigInitArgs),
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate the configuration file.
    Validate,
}

/// Subcommands for `gpmarket market`.
#[derive(Subcommand, Debug)]
pub enum MarketCommand {
    /// Create a new OPEN market.
    Create(MarketCreateArgs),
    /// List markets, newest first.
    List(MarketListArgs),
    /// Show prices and positions of one market.
    Show(MarketArg),
    /// Stop trading on an OPEN market.
    Close(MarketArg),
    /// Resolve a market and pay out the winning outcome.
    Resolve(MarketResolveArgs),
    /// Declare a market invalid and refund net spend.
    Invalidate(MarketArg),
    /// Lift a consistency halt after reconciliation.
    ClearHalt(MarketArg),
    /// Close every market whose close time has passed.
    Sweep(SweepArgs),
}

/// Subcommands for `gpmarket trade`.
#[derive(Subcommand, Debug)]
pub enum TradeCommand {
    /// Buy shares of an outcome.
    Buy(TradeArgs),
    /// Sell shares of an outcome back to the market maker.
    Sell(TradeArgs),
}

/// Subcommands for `gpmarket wallet`.
#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    /// Show a user's GP balance.
    Balance(UserArg),
    /// Page through a user's ledger, newest first.
    History(WalletHistoryArgs),
    /// Grant (or with a negative amount, remove) GP.
    Grant(WalletGrantArgs),
}

/// Arguments for the `config init` subcommand.
#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite the file if it already exists.
    #[arg(long)]
    pub force: bool,
}

/// A market addressed by id or slug.
#[derive(Args, Debug)]
pub struct MarketArg {
    /// Market id or slug.
    pub market: String,
}

/// A user id.
#[derive(Args, Debug)]
pub struct UserArg {
    /// User id.
    pub user: String,
}

/// Arguments for `market create`.
#[derive(Args, Debug)]
pub struct MarketCreateArgs {
    /// Unique URL slug.
    #[arg(long)]
    pub slug: String,

    /// Market question.
    #[arg(long)]
    pub title: String,

    /// Longer description shown on the market page.
    #[arg(long, default_value = "")]
    pub description: String,

    /// Category used for filtering.
    #[arg(long, default_value = "general")]
    pub category: String,

    /// Outcome as `id` or `id=Name`; repeat for each outcome.
    #[arg(long = "outcome", required = true, num_args = 1)]
    pub outcomes: Vec<String>,

    /// Liquidity parameter `b` (defaults to `market.default_liquidity`).
    #[arg(long)]
    pub liquidity: Option<Decimal>,

    /// Close time (RFC 3339).
    #[arg(long, conflicts_with = "hours")]
    pub close_time: Option<DateTime<Utc>>,

    /// Close time as hours from now.
    #[arg(long, default_value = "168")]
    pub hours: i64,
}

/// Arguments for `market list`.
#[derive(Args, Debug)]
pub struct MarketListArgs {
    /// Only markets in this category.
    #[arg(long)]
    pub category: Option<String>,

    /// Only markets in this status (open, closed, resolved, invalid).
    #[arg(long)]
    pub status: Option<MarketStatus>,
}

/// Arguments for `market resolve`.
#[derive(Args, Debug)]
pub struct MarketResolveArgs {
    /// Market id or slug.
    pub market: String,

    /// Winning outcome id.
    pub outcome: String,
}

/// Arguments for `market sweep`.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Keep sweeping every N seconds until interrupted.
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,
}

/// Arguments for `trade buy` and `trade sell`.
#[derive(Args, Debug)]
pub struct TradeArgs {
    /// User id.
    pub user: String,

    /// Market id or slug.
    pub market: String,

    /// Outcome id.
    pub outcome: String,

    /// Number of shares.
    pub shares: Decimal,
}

/// Arguments for `wallet history`.
#[derive(Args, Debug)]
pub struct WalletHistoryArgs {
    /// User id.
    pub user: String,

    /// Entries per page (defaults to `ledger.history_page_size`).
    #[arg(long)]
    pub limit: Option<usize>,

    /// Continue after a cursor printed by a previous page.
    #[arg(long)]
    pub cursor: Option<String>,
}

/// Arguments for `wallet grant`.
#[derive(Args, Debug)]
pub struct WalletGrantArgs {
    /// User id.
    pub user: String,

    /// GP amount; negative removes GP.
    #[arg(allow_negative_numbers = true)]
    pub amount: i64,

    /// Reason recorded in the journal.
    #[arg(long, default_value = "")]
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rust_decimal_macros::dec;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["gpmarket", "audit", "--json", "-vv"]).unwrap();
        assert!(matches!(cli.command, Commands::Audit));
        assert!(cli.json);
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn config_defaults_to_gpmarket_home() {
        let cli = Cli::try_parse_from(["gpmarket", "audit"]).unwrap();
        assert_eq!(cli.config, paths::default_config());
    }

    #[test]
    fn parses_market_create() {
        let cli = Cli::try_parse_from([
            "gpmarket",
            "market",
            "create",
            "--slug",
            "rain",
            "--title",
            "Rain tomorrow?",
            "--outcome",
            "yes=Yes",
            "--outcome",
            "no=No",
            "--liquidity",
            "50",
        ])
        .unwrap();
        let Commands::Market(MarketCommand::Create(args)) = cli.command else {
            panic!("Expected market create");
        };
        assert_eq!(args.slug, "rain");
        assert_eq!(args.outcomes, vec!["yes=Yes", "no=No"]);
        assert_eq!(args.liquidity, Some(dec!(50)));
        assert_eq!(args.hours, 168);
        assert_eq!(args.category, "general");
    }

    #[test]
    fn market_create_requires_outcomes() {
        let result = Cli::try_parse_from([
            "gpmarket", "market", "create", "--slug", "rain", "--title", "Rain?",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_market_list_status() {
        let cli =
            Cli::try_parse_from(["gpmarket", "market", "list", "--status", "resolved"]).unwrap();
        let Commands::Market(MarketCommand::List(args)) = cli.command else {
            panic!("Expected market list");
        };
        assert_eq!(args.status, Some(MarketStatus::Resolved));
    }

    #[test]
    fn parses_trade_buy() {
        let cli =
            Cli::try_parse_from(["gpmarket", "trade", "buy", "alice", "rain", "yes", "10"])
                .unwrap();
        let Commands::Trade(TradeCommand::Buy(args)) = cli.command else {
            panic!("Expected trade buy");
        };
        assert_eq!(args.user, "alice");
        assert_eq!(args.market, "rain");
        assert_eq!(args.outcome, "yes");
        assert_eq!(args.shares, dec!(10));
    }

    #[test]
    fn parses_fractional_sell() {
        let cli = Cli::try_parse_from(["gpmarket", "trade", "sell", "bob", "m1", "no", "2.5"])
            .unwrap();
        let Commands::Trade(TradeCommand::Sell(args)) = cli.command else {
            panic!("Expected trade sell");
        };
        assert_eq!(args.shares, dec!(2.5));
    }

    #[test]
    fn parses_negative_grant() {
        let cli = Cli::try_parse_from([
            "gpmarket", "wallet", "grant", "alice", "-50", "--note", "correction",
        ])
        .unwrap();
        let Commands::Wallet(WalletCommand::Grant(args)) = cli.command else {
            panic!("Expected wallet grant");
        };
        assert_eq!(args.amount, -50);
        assert_eq!(args.note, "correction");
    }

    #[test]
    fn parses_sweep_watch() {
        let cli = Cli::try_parse_from(["gpmarket", "market", "sweep", "--watch", "30"]).unwrap();
        let Commands::Market(MarketCommand::Sweep(args)) = cli.command else {
            panic!("Expected market sweep");
        };
        assert_eq!(args.watch, Some(30));
    }

    #[test]
    fn parses_clear_halt() {
        let cli = Cli::try_parse_from(["gpmarket", "market", "clear-halt", "rain"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Market(MarketCommand::ClearHalt(_))
        ));
    }

    #[test]
    fn parses_config_init_force() {
        let cli = Cli::try_parse_from(["gpmarket", "config", "init", "--force"]).unwrap();
        let Commands::Config(ConfigCommand::Init(args)) = cli.command else {
            panic!("Expected config init");
        };
        assert!(args.force);
    }
}
