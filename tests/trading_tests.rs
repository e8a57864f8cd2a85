mod support;

use gpmarket::domain::id::{OutcomeId, UserId};
use gpmarket::domain::trade::{TradeAction, TradeRequest};
use gpmarket::error::TradeError;
use gpmarket::port::inbound::trading::TradingService;
use gpmarket::port::outbound::clock::Clock;
use gpmarket::port::outbound::notifier::Event;
use gpmarket::testkit::harness::Harness;
use gpmarket::testkit::market::MarketDraft;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use support::assertions::{
    assert_audit_clean, assert_code, assert_probabilities_sum_to_one,
    assert_shares_match_positions,
};

#[test]
fn buying_ten_yes_costs_five_gp_and_moves_price_up() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    let alice = h.funded_user("alice", 1000);

    let receipt = h
        .engine
        .execute_trade(&TradeRequest::buy("alice", market.clone(), "yes", dec!(10)))
        .unwrap();

    assert_eq!(receipt.action, TradeAction::Buy);
    assert_eq!(receipt.cost_or_proceeds, 5);
    assert_eq!(receipt.gp_delta, -5);
    assert_eq!(receipt.new_balance_gp, 995);
    assert_eq!(receipt.position_shares, dec!(10));
    assert!(receipt.implied_probability > 0.5);
    assert_eq!(h.engine.balance(&alice), 995);

    let snapshot = h.engine.snapshot(&market).unwrap();
    assert_eq!(snapshot.outcomes[0].share_count, dec!(10));
    assert_eq!(snapshot.outcomes[1].share_count, Decimal::ZERO);
    assert_probabilities_sum_to_one(&h.engine, &market);
    assert_shares_match_positions(&h.engine, &market);
}

#[test]
fn selling_back_returns_at_most_what_was_paid() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    let alice = h.funded_user("alice", 1000);
    let yes = OutcomeId::from("yes");

    h.engine
        .execute_trade(&TradeRequest::buy("alice", market.clone(), "yes", dec!(10)))
        .unwrap();
    let receipt = h
        .engine
        .execute_trade(&TradeRequest::sell("alice", market.clone(), "yes", dec!(10)))
        .unwrap();

    assert_eq!(receipt.action, TradeAction::Sell);
    assert!(receipt.gp_delta >= 0);
    let balance = h.engine.balance(&alice);
    assert!((990..=1000).contains(&balance), "balance {balance}");
    assert_eq!(h.engine.position(&market, &alice, &yes), Decimal::ZERO);

    let snapshot = h.engine.snapshot(&market).unwrap();
    assert!((snapshot.outcomes[0].implied_probability - 0.5).abs() < 1e-9);
    assert_audit_clean(&h.engine);
}

#[test]
fn fractional_shares_are_tracked_exactly() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    let alice = h.funded_user("alice", 1000);
    let no = OutcomeId::from("no");

    h.engine
        .execute_trade(&TradeRequest::buy("alice", market.clone(), "no", dec!(2.5)))
        .unwrap();
    h.engine
        .execute_trade(&TradeRequest::sell("alice", market.clone(), "no", dec!(0.75)))
        .unwrap();

    assert_eq!(h.engine.position(&market, &alice, &no), dec!(1.75));
    assert_shares_match_positions(&h.engine, &market);
}

#[test]
fn tiny_buy_still_costs_one_gp() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    h.funded_user("alice", 10);

    let receipt = h
        .engine
        .execute_trade(&TradeRequest::buy("alice", market, "yes", dec!(0.01)))
        .unwrap();

    assert_eq!(receipt.cost_or_proceeds, 1);
    assert_eq!(receipt.new_balance_gp, 9);
}

#[test]
fn insufficient_funds_leaves_no_trace() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    let bob = h.funded_user("bob", 3);
    let before = h.engine.snapshot(&market).unwrap();
    let journal_len = h.journal.len();

    let err = h
        .engine
        .execute_trade(&TradeRequest::buy("bob", market.clone(), "yes", dec!(10)))
        .unwrap_err();

    assert_eq!(err.code(), "insufficient_funds");
    assert_eq!(
        err.as_trade(),
        Some(&TradeError::InsufficientFunds {
            required: 5,
            available: 3
        })
    );
    assert_eq!(h.engine.balance(&bob), 3);
    assert_eq!(h.journal.len(), journal_len);
    let after = h.engine.snapshot(&market).unwrap();
    assert_eq!(after.outcomes, before.outcomes);
    assert_eq!(after.version, before.version);
}

#[test]
fn selling_more_than_held_is_rejected() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    h.funded_user("alice", 1000);
    h.engine
        .execute_trade(&TradeRequest::buy("alice", market.clone(), "yes", dec!(3)))
        .unwrap();

    let err = h
        .engine
        .execute_trade(&TradeRequest::sell("alice", market.clone(), "yes", dec!(4)))
        .unwrap_err();

    assert_eq!(err.code(), "insufficient_shares");
    assert_eq!(
        h.engine
            .position(&market, &UserId::from("alice"), &OutcomeId::from("yes")),
        dec!(3)
    );
}

#[test]
fn selling_without_a_position_is_rejected() {
    let h = Harness::new();
    let market = h.binary_market("rain");

    assert_code(
        h.engine
            .execute_trade(&TradeRequest::sell("carol", market, "no", dec!(1))),
        "insufficient_shares",
    );
}

#[test]
fn invalid_requests_are_rejected_before_locking() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    h.funded_user("alice", 1000);

    assert_code(
        h.engine
            .execute_trade(&TradeRequest::buy("alice", market.clone(), "yes", dec!(0))),
        "invalid_input",
    );
    assert_code(
        h.engine
            .execute_trade(&TradeRequest::buy("alice", market.clone(), "yes", dec!(-1))),
        "invalid_input",
    );
    assert_code(
        h.engine
            .execute_trade(&TradeRequest::buy("alice", market, "maybe", dec!(1))),
        "invalid_input",
    );
    assert_code(
        h.engine.execute_trade(&TradeRequest::buy(
            "alice",
            gpmarket::domain::id::MarketId::from("missing"),
            "yes",
            dec!(1),
        )),
        "market_not_found",
    );
    assert!(h.events.is_empty());
}

#[test]
fn trading_service_port_submits_trades() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    h.funded_user("alice", 100);
    let service: &dyn TradingService = &h.engine;

    let receipt = service
        .submit_trade(TradeRequest::buy("alice", market.clone(), "yes", dec!(10)))
        .unwrap();

    assert_eq!(receipt.new_balance_gp, 95);
    assert_eq!(service.wallet_balance(&UserId::from("alice")), 95);
    assert_eq!(
        service.market_snapshot(&market).unwrap().outcomes[0].share_count,
        dec!(10)
    );
}

#[test]
fn multi_outcome_market_prices_every_outcome() {
    let h = Harness::new();
    let market = h.create(
        MarketDraft::with_outcomes("cup", h.clock.now(), &["home", "draw", "away"])
            .liquidity(dec!(50))
            .build(),
    );
    h.funded_user("alice", 1000);

    let snapshot = h.engine.snapshot(&market).unwrap();
    for outcome in &snapshot.outcomes {
        assert!((outcome.implied_probability - 1.0 / 3.0).abs() < 1e-9);
    }

    h.engine
        .execute_trade(&TradeRequest::buy("alice", market.clone(), "draw", dec!(20)))
        .unwrap();

    let snapshot = h.engine.snapshot(&market).unwrap();
    let draw = snapshot.outcome(&OutcomeId::from("draw")).unwrap();
    let home = snapshot.outcome(&OutcomeId::from("home")).unwrap();
    assert!(draw.implied_probability > home.implied_probability);
    assert_probabilities_sum_to_one(&h.engine, &market);
}

#[test]
fn committed_trades_are_announced() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    h.funded_user("alice", 1000);

    h.engine
        .execute_trade(&TradeRequest::buy("alice", market.clone(), "yes", dec!(10)))
        .unwrap();
    let _ = h
        .engine
        .execute_trade(&TradeRequest::sell("alice", market.clone(), "no", dec!(1)));

    let events = h.events.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        Event::TradeExecuted(trade) => {
            assert_eq!(trade.market_id, market);
            assert_eq!(trade.gp_delta, -5);
            assert_eq!(trade.shares, dec!(10));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn ledger_records_each_trade_newest_first() {
    let h = Harness::new();
    let market = h.binary_market("rain");
    let alice = h.funded_user("alice", 1000);

    for _ in 0..3 {
        h.engine
            .execute_trade(&TradeRequest::buy("alice", market.clone(), "yes", dec!(1)))
            .unwrap();
    }

    let first = h.engine.ledger_page(&alice, None, Some(2));
    assert_eq!(first.entries.len(), 2);
    assert!(first.entries[0].id() > first.entries[1].id());
    let cursor = first.next_cursor.expect("more entries");

    let second = h.engine.ledger_page(&alice, Some(cursor), Some(2));
    assert_eq!(second.entries.len(), 2);
    assert!(second.next_cursor.is_none());

    let all: Vec<_> = h.engine.history(&alice).collect();
    assert_eq!(all.len(), 4);
    let sum: i64 = all.iter().map(|e| e.amount_gp()).sum();
    assert_eq!(sum, h.engine.balance(&alice));
}

#[test]
fn trades_far_larger_than_liquidity_round_trip() {
    let h = Harness::new();
    let market = h.binary_market("whale");
    let whale = h.funded_user("whale", 100_000);

    let bought = h
        .engine
        .execute_trade(&TradeRequest::buy("whale", market.clone(), "yes", dec!(80000)))
        .unwrap();
    assert_eq!(bought.cost_or_proceeds, 79_931);
    assert_eq!(bought.new_balance_gp, 20_069);
    let snapshot = h.engine.snapshot(&market).unwrap();
    assert_eq!(snapshot.outcomes[0].implied_probability, 1.0);

    let sold = h
        .engine
        .execute_trade(&TradeRequest::sell("whale", market.clone(), "yes", dec!(80000)))
        .unwrap();
    assert_eq!(sold.cost_or_proceeds, 79_930);
    assert_eq!(h.engine.balance(&whale), 99_999);
    assert_eq!(
        h.engine.position(&market, &whale, &OutcomeId::from("yes")),
        Decimal::ZERO
    );
    assert_shares_match_positions(&h.engine, &market);
    assert_audit_clean(&h.engine);
}

#[test]
fn outcome_priced_at_zero_still_costs_one_gp() {
    let h = Harness::new();
    let market = h.create(h.draft("thin").liquidity(dec!(1)).build());
    h.funded_user("whale", 1000);
    h.engine
        .execute_trade(&TradeRequest::buy("whale", market.clone(), "yes", dec!(800)))
        .unwrap();
    assert_eq!(
        h.engine.snapshot(&market).unwrap().outcomes[1].implied_probability,
        0.0
    );

    let err = h
        .engine
        .execute_trade(&TradeRequest::buy("carol", market.clone(), "no", dec!(1)))
        .unwrap_err();
    assert_eq!(
        err.as_trade(),
        Some(&TradeError::InsufficientFunds {
            required: 1,
            available: 0
        })
    );

    let bob = h.funded_user("bob", 5);
    let receipt = h
        .engine
        .execute_trade(&TradeRequest::buy("bob", market.clone(), "no", dec!(1)))
        .unwrap();
    assert_eq!(receipt.cost_or_proceeds, 1);
    assert_eq!(h.engine.balance(&bob), 4);
    assert_audit_clean(&h.engine);
}
