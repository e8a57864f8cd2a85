//! Handlers for the `market` command group.

use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tabled::Tabled;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::{
    MarketCreateArgs, MarketListArgs, MarketResolveArgs, SweepArgs,
};
use crate::adapter::inbound::cli::output;
use crate::application::engine::Engine;
use crate::domain::id::OutcomeId;
use crate::domain::market::{MarketFilter, MarketSnapshot, NewMarket};
use crate::domain::settlement::SettlementReport;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::port::inbound::trading::{Authorization, TradingService};

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "Slug")]
    slug: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Leader")]
    leader: String,
    #[tabled(rename = "Closes")]
    closes: String,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Outcome")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Shares")]
    shares: String,
    #[tabled(rename = "Probability")]
    probability: String,
}

#[derive(Tabled)]
struct HolderRow {
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Shares")]
    shares: String,
}

/// Split `id=Name` (or bare `id`) into an outcome definition.
fn parse_outcome(raw: &str) -> Result<(OutcomeId, String)> {
    let (id, name) = match raw.split_once('=') {
        Some((id, name)) => (id.trim(), name.trim()),
        None => (raw.trim(), raw.trim()),
    };
    if id.is_empty() || name.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "outcome",
            reason: format!("expected 'id' or 'id=Name', got '{raw}'"),
        }
        .into());
    }
    Ok((OutcomeId::from(id), name.to_string()))
}

fn leader(snapshot: &MarketSnapshot) -> String {
    snapshot
        .outcomes
        .iter()
        .max_by(|a, b| a.implied_probability.total_cmp(&b.implied_probability))
        .map_or_else(String::new, |o| {
            format!("{} {}", o.name, output::percent(o.implied_probability))
        })
}

fn status_label(snapshot: &MarketSnapshot) -> String {
    match &snapshot.halted {
        Some(_) => format!("{} (halted)", snapshot.status),
        None => snapshot.status.to_string(),
    }
}

/// Execute `market create`.
pub fn create(engine: &Engine, config: &Config, args: &MarketCreateArgs) -> Result<()> {
    let outcomes = args
        .outcomes
        .iter()
        .map(|raw| parse_outcome(raw))
        .collect::<Result<Vec<_>>>()?;
    let close_time = args
        .close_time
        .unwrap_or_else(|| Utc::now() + chrono::Duration::hours(args.hours));

    let snapshot = engine.create_market(NewMarket {
        slug: args.slug.clone(),
        title: args.title.clone(),
        description: args.description.clone(),
        category: args.category.clone(),
        liquidity: args.liquidity.unwrap_or(config.market.default_liquidity),
        close_time,
        outcomes,
    })?;

    if output::is_json() {
        output::json_output(json!({
            "command": "market.create",
            "market": serde_json::to_value(&*snapshot)?,
        }));
        return Ok(());
    }

    output::success(&format!("Created market {}", output::highlight(&snapshot.slug)));
    output::field("Id", &snapshot.id);
    output::field("Liquidity", snapshot.liquidity);
    output::field("Closes", snapshot.close_time.to_rfc3339());
    Ok(())
}

/// Execute `market list`.
pub fn list(engine: &Engine, args: &MarketListArgs) -> Result<()> {
    let filter = MarketFilter {
        category: args.category.clone(),
        status: args.status,
    };
    let markets = engine.list_markets(&filter);

    if output::is_json() {
        let markets: Vec<&MarketSnapshot> = markets.iter().map(AsRef::as_ref).collect();
        output::json_output(json!({
            "command": "market.list",
            "markets": serde_json::to_value(markets)?,
        }));
        return Ok(());
    }

    output::section("Markets");
    let rows = markets
        .iter()
        .map(|m| MarketRow {
            slug: m.slug.clone(),
            title: m.title.clone(),
            category: m.category.clone(),
            status: status_label(m),
            leader: leader(m),
            closes: m.close_time.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();
    output::table(rows, "(no markets)");
    Ok(())
}

/// Execute `market show`.
pub fn show(engine: &Engine, key: &str) -> Result<()> {
    let snapshot = engine.find_market(key)?;
    let holdings = engine.positions_for_market(&snapshot.id);

    if output::is_json() {
        output::json_output(json!({
            "command": "market.show",
            "market": serde_json::to_value(&*snapshot)?,
            "positions": serde_json::to_value(&holdings)?,
        }));
        return Ok(());
    }

    output::section(&snapshot.title);
    output::field("Id", &snapshot.id);
    output::field("Slug", &snapshot.slug);
    output::field("Category", &snapshot.category);
    output::field("Status", status_label(&snapshot));
    output::field("Liquidity", snapshot.liquidity);
    output::field("Closes", snapshot.close_time.to_rfc3339());
    if let Some(winner) = &snapshot.resolved_outcome {
        output::field("Winner", output::positive(winner));
    }
    if let Some(reason) = &snapshot.halted {
        output::warning(&format!("Halted: {reason}"));
    }
    if !snapshot.description.is_empty() {
        output::note(&snapshot.description);
    }

    output::section("Outcomes");
    let rows = snapshot
        .outcomes
        .iter()
        .map(|o| OutcomeRow {
            id: o.id.to_string(),
            name: o.name.clone(),
            shares: o.share_count.normalize().to_string(),
            probability: output::percent(o.implied_probability),
        })
        .collect();
    output::table(rows, "(no outcomes)");

    if output::verbosity() > 0 {
        output::section("Positions");
        let rows = holdings
            .iter()
            .filter(|h| !h.shares.is_zero())
            .map(|h| HolderRow {
                user: h.user_id.to_string(),
                outcome: h.outcome_id.to_string(),
                shares: h.shares.normalize().to_string(),
            })
            .collect();
        output::table(rows, "(no open positions)");
    }
    Ok(())
}

/// Execute `market close`.
pub fn close(engine: &Engine, key: &str) -> Result<()> {
    let market_id = engine.find_market(key)?.id.clone();
    let snapshot = engine.close_market(&market_id)?;
    print_transition("market.close", &snapshot, "Closed market")
}

/// Execute `market clear-halt`.
pub fn clear_halt(engine: &Engine, key: &str) -> Result<()> {
    let market_id = engine.find_market(key)?.id.clone();
    let snapshot = engine.clear_halt(&market_id)?;
    print_transition("market.clear_halt", &snapshot, "Cleared halt on")
}

fn print_transition(command: &str, snapshot: &MarketSnapshot, verb: &str) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": command,
            "market": serde_json::to_value(snapshot)?,
        }));
        return Ok(());
    }
    output::success(&format!("{verb} {}", output::highlight(&snapshot.slug)));
    output::field("Status", status_label(snapshot));
    Ok(())
}

/// Execute `market resolve`.
pub fn resolve(engine: &Engine, args: &MarketResolveArgs) -> Result<()> {
    let market_id = engine.find_market(&args.market)?.id.clone();
    let report = engine.resolve_market(
        &Authorization::Admin,
        &market_id,
        Some(OutcomeId::from(args.outcome.as_str())),
    )?;
    print_settlement("market.resolve", &report)
}

/// Execute `market invalidate`.
pub fn invalidate(engine: &Engine, key: &str) -> Result<()> {
    let market_id = engine.find_market(key)?.id.clone();
    let report = engine.resolve_market(&Authorization::Admin, &market_id, None)?;
    print_settlement("market.invalidate", &report)
}

fn print_settlement(command: &str, report: &SettlementReport) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": command,
            "settlement": serde_json::to_value(report)?,
            "total_credited_gp": report.total_credited_gp(),
        }));
        return Ok(());
    }

    output::success(&format!("Market {} is {}", report.market_id, report.status));
    if let Some(winner) = &report.winning_outcome {
        output::field("Winner", output::positive(winner));
    }
    output::field("Credited", format!("{} GP", report.total_credited_gp()));
    output::field("Users", report.users_credited());
    output::field("Rows cleared", report.positions_cleared);
    Ok(())
}

/// Execute `market sweep`, once or every `--watch` seconds until Ctrl-C.
pub async fn sweep(engine: &Engine, args: &SweepArgs) -> Result<()> {
    let Some(seconds) = args.watch else {
        let closed = engine.close_expired()?;
        return print_sweep(&closed);
    };

    let mut interval = tokio::time::interval(Duration::from_secs(seconds.max(1)));
    info!(interval_secs = seconds, "Watching for expired markets");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match engine.close_expired() {
                    Ok(closed) => print_sweep(&closed)?,
                    Err(err) => warn!(error = %err, "Sweep failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

fn print_sweep(closed: &[crate::domain::id::MarketId]) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": "market.sweep",
            "closed": serde_json::to_value(closed)?,
        }));
        return Ok(());
    }
    if closed.is_empty() {
        output::note("No expired markets");
    } else {
        for market_id in closed {
            output::success(&format!("Closed {market_id}"));
        }
    }
    Ok(())
}
