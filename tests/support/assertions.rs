use gpmarket::application::engine::Engine;
use gpmarket::domain::id::{MarketId, UserId};
use gpmarket::error::Error;
use rust_decimal::Decimal;

pub fn assert_code<T: std::fmt::Debug>(result: Result<T, Error>, code: &str) {
    match result {
        Ok(value) => panic!("expected {code} error, got Ok({value:?})"),
        Err(err) => assert_eq!(err.code(), code, "unexpected error: {err}"),
    }
}

pub fn assert_audit_clean(engine: &Engine) {
    let report = engine.audit();
    assert!(report.is_clean(), "audit found mismatches: {report:#?}");
}

/// Every outcome's share count equals the sum of the positions held in it.
pub fn assert_shares_match_positions(engine: &Engine, market_id: &MarketId) {
    let snapshot = engine.snapshot(market_id).expect("market exists");
    let holdings = engine.positions_for_market(market_id);
    for outcome in &snapshot.outcomes {
        let held: Decimal = holdings
            .iter()
            .filter(|h| h.outcome_id == outcome.id)
            .map(|h| h.shares)
            .sum();
        assert_eq!(
            outcome.share_count, held,
            "outcome {} share count differs from positions",
            outcome.id
        );
    }
}

pub fn total_balance(engine: &Engine, users: &[UserId]) -> i64 {
    users.iter().map(|u| engine.balance(u)).sum()
}

pub fn assert_probabilities_sum_to_one(engine: &Engine, market_id: &MarketId) {
    let snapshot = engine.snapshot(market_id).expect("market exists");
    let sum: f64 = snapshot.outcomes.iter().map(|o| o.implied_probability).sum();
    assert!((sum - 1.0).abs() < 1e-9, "probabilities sum to {sum}");
}
