mod support;

use std::sync::{Arc, Barrier};
use std::thread;

use gpmarket::domain::id::{MarketId, OutcomeId, UserId};
use gpmarket::domain::market::MarketStatus;
use gpmarket::domain::trade::TradeRequest;
use gpmarket::testkit::harness::Harness;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use support::assertions::{assert_audit_clean, assert_shares_match_positions, total_balance};

#[test]
fn parallel_buys_on_one_market_serialize() {
    let h = Harness::new();
    let market = h.binary_market("crowd");
    let users: Vec<UserId> = (0..8).map(|i| h.funded_user(&format!("user-{i}"), 1000)).collect();
    let granted = total_balance(&h.engine, &users);
    let barrier = Barrier::new(users.len());

    let spent: i64 = thread::scope(|scope| {
        let handles: Vec<_> = users
            .iter()
            .map(|user| {
                let (h, market, barrier) = (&h, &market, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    let mut spent = 0;
                    for _ in 0..25 {
                        let receipt = h
                            .engine
                            .execute_trade(&TradeRequest::buy(
                                user.clone(),
                                market.clone(),
                                "yes",
                                dec!(1),
                            ))
                            .unwrap();
                        spent += receipt.cost_or_proceeds;
                    }
                    spent
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).sum()
    });

    let snapshot = h.engine.snapshot(&market).unwrap();
    assert_eq!(snapshot.outcomes[0].share_count, dec!(200));
    assert_eq!(total_balance(&h.engine, &users), granted - spent);
    assert_shares_match_positions(&h.engine, &market);
    assert_audit_clean(&h.engine);
}

#[test]
fn settlement_races_with_trading_without_losing_gp() {
    let h = Harness::new();
    let market = h.binary_market("race");
    let users: Vec<UserId> = (0..4).map(|i| h.funded_user(&format!("user-{i}"), 500)).collect();
    for user in &users {
        h.engine
            .execute_trade(&TradeRequest::buy(user.clone(), market.clone(), "yes", dec!(5)))
            .unwrap();
    }
    let barrier = Barrier::new(users.len() + 1);

    thread::scope(|scope| {
        for user in &users {
            let (h, market, barrier) = (&h, &market, &barrier);
            scope.spawn(move || {
                barrier.wait();
                for _ in 0..20 {
                    let result = h.engine.execute_trade(&TradeRequest::buy(
                        user.clone(),
                        market.clone(),
                        "no",
                        dec!(1),
                    ));
                    if let Err(err) = result {
                        assert_eq!(err.code(), "market_closed");
                    }
                }
            });
        }
        let (h, market, barrier) = (&h, &market, &barrier);
        scope.spawn(move || {
            barrier.wait();
            h.engine.close_market(market).unwrap();
            h.engine
                .resolve(market, Some(OutcomeId::from("yes")))
                .unwrap();
        });
    });

    assert_eq!(h.engine.snapshot(&market).unwrap().status, MarketStatus::Resolved);
    for user in &users {
        for outcome in ["yes", "no"] {
            assert_eq!(
                h.engine.position(&market, user, &OutcomeId::from(outcome)),
                Decimal::ZERO
            );
        }
    }
    assert_audit_clean(&h.engine);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn independent_markets_trade_in_parallel() {
    let h = Arc::new(Harness::new());
    let markets: Vec<MarketId> = (0..4).map(|i| h.binary_market(&format!("m{i}"))).collect();
    let alice = h.funded_user("alice", 100_000);

    let mut tasks = Vec::new();
    for market in markets.clone() {
        let h = Arc::clone(&h);
        tasks.push(tokio::task::spawn_blocking(move || {
            for i in 0..50 {
                let outcome = if i % 2 == 0 { "yes" } else { "no" };
                h.engine
                    .execute_trade(&TradeRequest::buy("alice", market.clone(), outcome, dec!(2)))
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for market in &markets {
        let snapshot = h.engine.snapshot(market).unwrap();
        assert_eq!(snapshot.outcomes[0].share_count, dec!(50));
        assert_eq!(snapshot.outcomes[1].share_count, dec!(50));
        assert_shares_match_positions(&h.engine, market);
    }
    let history: i64 = h.engine.history(&alice).map(|e| e.amount_gp()).sum();
    assert_eq!(history, h.engine.balance(&alice));
}

#[test]
fn random_operations_preserve_ledger_invariants() {
    let h = Harness::new();
    let mut rng = StdRng::seed_from_u64(0x6770);
    let markets: Vec<MarketId> = (0..3).map(|i| h.binary_market(&format!("rand-{i}"))).collect();
    let users: Vec<UserId> = (0..5).map(|i| h.funded_user(&format!("u{i}"), 200)).collect();
    let outcomes = [OutcomeId::from("yes"), OutcomeId::from("no")];

    for _ in 0..400 {
        let market = &markets[rng.gen_range(0..markets.len())];
        let user = &users[rng.gen_range(0..users.len())];
        let outcome = &outcomes[rng.gen_range(0..outcomes.len())];
        let shares = Decimal::new(rng.gen_range(1..=400), 1);

        let _ = match rng.gen_range(0..10) {
            0 => h.engine.adjust(user, rng.gen_range(-50..=50), "random").map(|_| ()),
            1..=5 => h
                .engine
                .execute_trade(&TradeRequest::buy(
                    user.clone(),
                    market.clone(),
                    outcome.as_str(),
                    shares,
                ))
                .map(|_| ()),
            _ => h
                .engine
                .execute_trade(&TradeRequest::sell(
                    user.clone(),
                    market.clone(),
                    outcome.as_str(),
                    shares,
                ))
                .map(|_| ()),
        };

        assert!(h.engine.balance(user) >= 0);
        assert!(h.engine.position(market, user, outcome) >= Decimal::ZERO);
    }

    for market in &markets {
        assert_shares_match_positions(&h.engine, market);
    }
    assert_audit_clean(&h.engine);

    let before = total_balance(&h.engine, &users);
    let credited: i64 = markets
        .iter()
        .map(|m| {
            h.engine
                .resolve(m, Some(OutcomeId::from("yes")))
                .unwrap()
                .total_credited_gp()
        })
        .sum();
    assert_eq!(total_balance(&h.engine, &users), before + credited);
    assert_audit_clean(&h.engine);
}
