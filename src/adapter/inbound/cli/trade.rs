//! Handlers for the `trade` command group.

use serde_json::json;

use crate::adapter::inbound::cli::command::TradeArgs;
use crate::adapter::inbound::cli::output;
use crate::application::engine::Engine;
use crate::domain::trade::{TradeAction, TradeReceipt, TradeRequest};
use crate::error::Result;
use crate::port::inbound::trading::TradingService;

/// Execute `trade buy` or `trade sell`.
pub fn execute(engine: &Engine, action: TradeAction, args: &TradeArgs) -> Result<()> {
    let market_id = engine.find_market(&args.market)?.id.clone();
    let user = args.user.as_str();
    let outcome = args.outcome.as_str();
    let request = match action {
        TradeAction::Buy => TradeRequest::buy(user, market_id, outcome, args.shares),
        TradeAction::Sell => TradeRequest::sell(user, market_id, outcome, args.shares),
    };
    let receipt = engine.submit_trade(request)?;
    print_receipt(&receipt)
}

fn print_receipt(receipt: &TradeReceipt) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": match receipt.action {
                TradeAction::Buy => "trade.buy",
                TradeAction::Sell => "trade.sell",
            },
            "receipt": serde_json::to_value(receipt)?,
        }));
        return Ok(());
    }

    let verb = match receipt.action {
        TradeAction::Buy => "Bought",
        TradeAction::Sell => "Sold",
    };
    output::success(&format!(
        "{verb} {} {} for {} GP",
        receipt.shares.normalize(),
        output::highlight(&receipt.outcome_id),
        receipt.cost_or_proceeds
    ));
    output::field("Wallet", output::signed_gp(receipt.gp_delta));
    output::field("Balance", format!("{} GP", receipt.new_balance_gp));
    output::field("Position", receipt.position_shares.normalize());
    output::field("Probability", output::percent(receipt.implied_probability));
    if output::verbosity() > 0 {
        output::field("Entry", receipt.entry_id);
    }
    Ok(())
}
