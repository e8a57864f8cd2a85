//! Handlers for the `wallet` command group.

use serde_json::json;
use tabled::Tabled;

use crate::adapter::inbound::cli::command::{WalletGrantArgs, WalletHistoryArgs};
use crate::adapter::inbound::cli::output;
use crate::application::engine::Engine;
use crate::domain::id::UserId;
use crate::domain::ledger::HistoryCursor;
use crate::error::{ConfigError, Result};
use crate::port::inbound::trading::TradingService;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "Id")]
    id: u64,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Market")]
    market: String,
}

/// Execute `wallet balance`.
pub fn balance(engine: &Engine, user: &str) -> Result<()> {
    let user_id = UserId::from(user);
    let balance = engine.wallet_balance(&user_id);

    if output::is_json() {
        output::json_output(json!({
            "command": "wallet.balance",
            "user_id": user_id,
            "balance_gp": balance,
        }));
        return Ok(());
    }

    output::field("User", &user_id);
    output::field("Balance", format!("{balance} GP"));
    Ok(())
}

/// Execute `wallet history`.
pub fn history(engine: &Engine, args: &WalletHistoryArgs) -> Result<()> {
    let user_id = UserId::from(args.user.as_str());
    let cursor = args
        .cursor
        .as_deref()
        .map(|raw| {
            raw.parse::<HistoryCursor>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: "cursor",
                    reason: e.to_string(),
                })
        })
        .transpose()?;
    let page = engine.ledger_page(&user_id, cursor, args.limit);

    if output::is_json() {
        output::json_output(json!({
            "command": "wallet.history",
            "user_id": user_id,
            "entries": serde_json::to_value(&page.entries)?,
            "next_cursor": page.next_cursor.map(|c| c.to_string()),
        }));
        return Ok(());
    }

    output::section(&format!("Ledger for {user_id}"));
    let rows = page
        .entries
        .iter()
        .map(|entry| EntryRow {
            id: entry.id().value(),
            when: entry.created_at().format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: entry.kind().to_string(),
            amount: output::signed_gp(entry.amount_gp()),
            market: entry.market_id().map_or_else(|| output::muted("-"), ToString::to_string),
        })
        .collect();
    output::table(rows, "(no entries)");
    if let Some(cursor) = page.next_cursor {
        output::hint(&format!(
            "more entries: gpmarket wallet history {user_id} --cursor {cursor}"
        ));
    }
    Ok(())
}

/// Execute `wallet grant`.
pub fn grant(engine: &Engine, args: &WalletGrantArgs) -> Result<()> {
    let user_id = UserId::from(args.user.as_str());
    let entry = engine.adjust(&user_id, args.amount, &args.note)?;
    let balance = engine.wallet_balance(&user_id);

    if output::is_json() {
        output::json_output(json!({
            "command": "wallet.grant",
            "entry": serde_json::to_value(&entry)?,
            "balance_gp": balance,
        }));
        return Ok(());
    }

    output::success(&format!(
        "Adjusted {} by {}",
        output::highlight(&user_id),
        output::signed_gp(entry.amount_gp())
    ));
    output::field("Balance", format!("{balance} GP"));
    Ok(())
}
