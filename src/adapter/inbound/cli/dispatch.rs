//! Command dispatch for the parsed CLI.

use crate::adapter::inbound::cli::command::{
    Cli, Commands, ConfigCommand, MarketCommand, TradeCommand, WalletCommand,
};
use crate::adapter::inbound::cli::{
    audit, config, market, output, portfolio, session, trade, wallet,
};
use crate::domain::trade::TradeAction;
use crate::error::Result;

/// Log level implied by the global verbosity flags, if any.
#[must_use]
pub fn log_level_override(cli: &Cli) -> Option<&'static str> {
    match (cli.quiet, cli.verbose) {
        (true, _) => Some("error"),
        (false, 0) => None,
        (false, 1) => Some("debug"),
        (false, _) => Some("trace"),
    }
}

/// Run one parsed command to completion.
///
/// # Errors
///
/// Returns the command's failure; the caller renders it and picks the exit
/// code.
pub async fn execute(cli: &Cli) -> Result<()> {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    if let Commands::Config(command) = &cli.command {
        return match command {
            ConfigCommand::Init(args) => config::execute_init(&cli.config, args.force),
            ConfigCommand::Show => config::execute_show(&cli.config),
            ConfigCommand::Validate => config::execute_validate(&cli.config),
        };
    }

    let mut settings = session::load_config(&cli.config)?;
    if let Some(level) = log_level_override(cli) {
        settings.logging.level = level.to_string();
    }
    settings.init_logging();
    let engine = session::open_engine(&settings)?;

    match &cli.command {
        Commands::Config(_) => Ok(()),
        Commands::Market(command) => match command {
            MarketCommand::Create(args) => market::create(&engine, &settings, args),
            MarketCommand::List(args) => market::list(&engine, args),
            MarketCommand::Show(arg) => market::show(&engine, &arg.market),
            MarketCommand::Close(arg) => market::close(&engine, &arg.market),
            MarketCommand::Resolve(args) => market::resolve(&engine, args),
            MarketCommand::Invalidate(arg) => market::invalidate(&engine, &arg.market),
            MarketCommand::ClearHalt(arg) => market::clear_halt(&engine, &arg.market),
            MarketCommand::Sweep(args) => market::sweep(&engine, args).await,
        },
        Commands::Trade(command) => match command {
            TradeCommand::Buy(args) => trade::execute(&engine, TradeAction::Buy, args),
            TradeCommand::Sell(args) => trade::execute(&engine, TradeAction::Sell, args),
        },
        Commands::Wallet(command) => match command {
            WalletCommand::Balance(arg) => wallet::balance(&engine, &arg.user),
            WalletCommand::History(args) => wallet::history(&engine, args),
            WalletCommand::Grant(args) => wallet::grant(&engine, args),
        },
        Commands::Portfolio(arg) => portfolio::execute(&engine, &arg.user),
        Commands::Audit => audit::execute(&engine),
    }
}
