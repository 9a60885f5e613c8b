//! Shared fixtures for integration tests.

use std::sync::Arc;

use marketcore::infrastructure::config::{ListingSeed, MarketConfig, UserSeed};
use marketcore::{Marketplace, MemorySink, PriceType};

pub const CHAIR: &str = "item-chair";
pub const BIKE: &str = "item-bike";

/// Marketplace seeded with the standard cast:
/// - `seller1` with an empty wallet, selling a fixed-price chair (1000)
///   and a negotiable bike (30000)
/// - `buyer1` with 1500, `buyer2` with 1000
pub fn seeded_market() -> (Marketplace, Arc<MemorySink>) {
    let config = MarketConfig {
        log_level: "info".into(),
        users: vec![
            UserSeed {
                id: "seller1".into(),
                name: "Ram Thapa".into(),
                balance: 0,
            },
            UserSeed {
                id: "buyer1".into(),
                name: "Sita Sharma".into(),
                balance: 1500,
            },
            UserSeed {
                id: "buyer2".into(),
                name: "Hari Gurung".into(),
                balance: 1000,
            },
        ],
        listings: vec![
            ListingSeed {
                id: CHAIR.into(),
                seller_id: "seller1".into(),
                title: "Vintage Wooden Chair".into(),
                price: 1000,
                price_type: PriceType::Fixed,
            },
            ListingSeed {
                id: BIKE.into(),
                seller_id: "seller1".into(),
                title: "Mountain Bike".into(),
                price: 30000,
                price_type: PriceType::Negotiable,
            },
        ],
    };

    let sink = Arc::new(MemorySink::new());
    let market = Marketplace::from_config(&config, Arc::clone(&sink) as _)
        .expect("seed config is valid");
    (market, sink)
}
