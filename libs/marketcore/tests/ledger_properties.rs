//! Property-based tests for the money-path invariants.
//!
//! Uses proptest to verify properties that should hold for any sequence
//! of wallet and escrow operations:
//! - no wallet balance ever goes negative
//! - wallet total plus escrow-held total is conserved by purchase,
//!   confirm, cancel and refund (money is neither created nor destroyed)
//! - a listing is pending exactly when one escrow hold references it

mod common;

use common::seeded_market;
use marketcore::{ListingStatus, Marketplace, PriceType, TransactionStatus};
use proptest::prelude::*;

/// The engines are async; each proptest case drives them on a small
/// single-threaded runtime.
fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime")
        .block_on(fut)
}

const USERS: [&str; 3] = ["seller1", "buyer1", "buyer2"];

/// One step of a randomized marketplace session.
#[derive(Debug, Clone)]
enum Op {
    Deposit { user: usize, amount: i64 },
    Withdraw { user: usize, amount: i64 },
    BuyListing { listing: usize, buyer: usize },
    Confirm { tx: usize },
    Cancel { tx: usize },
    Refund { tx: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 1..3000i64).prop_map(|(user, amount)| Op::Deposit { user, amount }),
        (0..3usize, 1..3000i64).prop_map(|(user, amount)| Op::Withdraw { user, amount }),
        (0..4usize, 0..3usize).prop_map(|(listing, buyer)| Op::BuyListing { listing, buyer }),
        (0..8usize).prop_map(|tx| Op::Confirm { tx }),
        (0..8usize).prop_map(|tx| Op::Cancel { tx }),
        (0..8usize).prop_map(|tx| Op::Refund { tx }),
    ]
}

/// Marketplace with a handful of fixed-price listings all priced within
/// reach of the seeded balances.
fn market_with_catalog() -> (Marketplace, Vec<String>) {
    let (market, _sink) = seeded_market();
    let mut listing_ids = vec![];
    for (title, price) in [("Desk Lamp", 400), ("Bookshelf", 900)] {
        let listing = market
            .post_listing("seller1", title, price, PriceType::Fixed)
            .expect("valid price");
        listing_ids.push(listing.id);
    }
    listing_ids.push(common::CHAIR.to_string());
    listing_ids.push(common::BIKE.to_string());
    (market, listing_ids)
}

async fn apply_ops(market: &Marketplace, listing_ids: &[String], ops: &[Op]) -> i64 {
    // Expected system total: moves only on successful deposit/withdraw.
    let mut expected_total = 1500 + 1000; // seeded buyer balances
    let mut tx_ids: Vec<String> = Vec::new();

    for op in ops {
        match op {
            Op::Deposit { user, amount } => {
                if market.deposit_funds(USERS[*user], *amount).await.is_ok() {
                    expected_total += amount;
                }
            }
            Op::Withdraw { user, amount } => {
                if market.withdraw_funds(USERS[*user], *amount).await.is_ok() {
                    expected_total -= amount;
                }
            }
            Op::BuyListing { listing, buyer } => {
                let id = &listing_ids[listing % listing_ids.len()];
                let price = match market.listing(id) {
                    Some(l) => l.price,
                    None => continue,
                };
                if let Ok(tx) = market.buy_now(id, USERS[*buyer], price).await {
                    tx_ids.push(tx.id);
                }
            }
            Op::Confirm { tx } => {
                if tx_ids.is_empty() {
                    continue;
                }
                let id = tx_ids[tx % tx_ids.len()].clone();
                let buyer = market.transaction(&id).expect("tx exists").buyer_id;
                let _ = market.confirm_delivery(&id, &buyer).await;
            }
            Op::Cancel { tx } => {
                if tx_ids.is_empty() {
                    continue;
                }
                let id = tx_ids[tx % tx_ids.len()].clone();
                let buyer = market.transaction(&id).expect("tx exists").buyer_id;
                let _ = market.cancel_purchase(&id, &buyer).await;
            }
            Op::Refund { tx } => {
                if tx_ids.is_empty() {
                    continue;
                }
                let id = tx_ids[tx % tx_ids.len()].clone();
                let _ = market.refund(&id).await;
            }
        }
    }

    expected_total
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Money is conserved: the wallet total plus escrow-held total only
    /// moves on deposits and withdrawals, never on purchase operations.
    #[test]
    fn money_conserved_across_sessions(ops in prop::collection::vec(op_strategy(), 1..40)) {
        block_on(async {
            let (market, listing_ids) = market_with_catalog();
            let expected = apply_ops(&market, &listing_ids, &ops).await;
            prop_assert_eq!(market.audit_total(), expected);
            Ok(())
        })?;
    }

    /// No sequence of operations drives a wallet negative.
    #[test]
    fn balances_never_negative(ops in prop::collection::vec(op_strategy(), 1..40)) {
        block_on(async {
            let (market, listing_ids) = market_with_catalog();
            apply_ops(&market, &listing_ids, &ops).await;
            for user in USERS {
                prop_assert!(market.wallet_balance(user).await.unwrap() >= 0);
            }
            Ok(())
        })?;
    }

    /// A listing sits in `Pending` exactly when one escrow hold
    /// references it, and `Sold` only with a released transaction.
    #[test]
    fn listing_status_matches_escrow_holds(ops in prop::collection::vec(op_strategy(), 1..40)) {
        block_on(async {
            let (market, listing_ids) = market_with_catalog();
            apply_ops(&market, &listing_ids, &ops).await;

            for id in &listing_ids {
                let listing = match market.listing(id) {
                    Some(l) => l,
                    None => continue,
                };
                let holds = market
                    .transactions_for_user("seller1")
                    .into_iter()
                    .filter(|t| t.item_id == *id && t.status == TransactionStatus::EscrowHeld)
                    .count();
                let released = market
                    .transactions_for_user("seller1")
                    .into_iter()
                    .filter(|t| t.item_id == *id && t.status == TransactionStatus::Released)
                    .count();

                match listing.status {
                    ListingStatus::Pending => prop_assert_eq!(holds, 1),
                    ListingStatus::Sold => {
                        prop_assert_eq!(holds, 0);
                        prop_assert_eq!(released, 1);
                    }
                    ListingStatus::Available => prop_assert_eq!(holds, 0),
                }
            }
            Ok(())
        })?;
    }
}
