//! Handler for the `portfolio` command.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::output;
use crate::application::engine::Engine;
use crate::domain::id::UserId;
use crate::error::Result;

#[derive(Tabled)]
struct PortfolioRow {
    #[tabled(rename = "Market")]
    market: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "Probability")]
    probability: String,
    #[tabled(rename = "Est. value")]
    value: String,
}

/// Execute `portfolio`.
pub fn execute(engine: &Engine, user: &str) -> Result<()> {
    let user_id = UserId::from(user);
    let lines = engine.portfolio(&user_id);
    let balance = engine.balance(&user_id);

    if output::is_json() {
        output::json_output(json!({
            "command": "portfolio",
            "user_id": user_id,
            "balance_gp": balance,
            "positions": serde_json::to_value(&lines)?,
        }));
        return Ok(());
    }

    output::section(&format!("Portfolio of {user_id}"));
    output::field("Balance", format!("{balance} GP"));
    let rows = lines
        .iter()
        .map(|line| PortfolioRow {
            market: line.market_slug.clone(),
            status: line.market_status.to_string(),
            outcome: line.outcome_name.clone(),
            shares: line.shares.normalize().to_string(),
            probability: output::percent(line.implied_probability),
            value: format!("{:.2}", line.estimated_value()),
        })
        .collect();
    output::table(rows, "(no open positions)");
    Ok(())
}
