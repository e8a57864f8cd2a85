//! Handler for the `audit` command.

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::application::engine::Engine;
use crate::error::{Error, Result};

/// Execute `audit`. A report with mismatches fails the command.
pub fn execute(engine: &Engine) -> Result<()> {
    let report = engine.audit();

    if output::is_json() {
        output::json_output(json!({
            "command": "audit",
            "clean": report.is_clean(),
            "report": serde_json::to_value(&report)?,
        }));
    } else {
        output::section("Ledger Audit");
        output::field("Accounts", report.accounts_checked);
        output::field("Entries", report.entries_checked);
        output::field("Markets", report.markets_checked);
        output::field("Total GP", report.total_balance_gp);

        for mismatch in &report.account_mismatches {
            output::warning(&format!(
                "{}: balance {} GP, ledger sum {} GP",
                mismatch.user_id, mismatch.balance_gp, mismatch.ledger_sum_gp
            ));
        }
        for mismatch in &report.share_mismatches {
            output::warning(&format!(
                "{}/{}: share count {}, positions hold {}",
                mismatch.market_id, mismatch.outcome_id, mismatch.share_count, mismatch.held
            ));
        }
        for market_id in &report.halted_markets {
            output::warning(&format!("Halted market {market_id}"));
        }
        if report.is_clean() {
            output::success("All balances match their ledgers");
        }
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(Error::consistency(
            None,
            format!(
                "{} account and {} share mismatches",
                report.account_mismatches.len(),
                report.share_mismatches.len()
            ),
        ))
    }
}
