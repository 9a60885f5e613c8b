//! Demo binary: drives a full marketplace session against seeded state.
//!
//! Loads `config/market.yaml` (override with `MARKET_CONFIG_PATH`), wires
//! the engines to a channel notification sink with a delivery thread, and
//! walks through a fixed-price sale, a failed payment with rollback, and
//! a negotiated sale.

use anyhow::Result;
use bazari::bin_common::{load_config_from_env, print_banner, print_shutdown, ConfigType};
use bazari::marketcore::infrastructure::logging::init_tracing_with_level;
use bazari::marketcore::{ChannelSink, MarketConfig, Marketplace};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load config first (before logging is initialized)
    let config_path = load_config_from_env(ConfigType::Market);
    let config = MarketConfig::load_from_file(&config_path)?;

    init_tracing_with_level(&config.log_level);
    print_banner("Bazari escrow demo");

    // Notifications flow over a channel to a delivery thread; the engines
    // never wait on delivery.
    let (sink, notifications) = ChannelSink::new();
    let delivery = std::thread::spawn(move || {
        for event in notifications.iter() {
            let n = event.notification();
            info!(recipient = %n.recipient_id, "[notify] {}: {}", n.title, n.body);
        }
    });

    let market = Marketplace::from_config(&config, Arc::new(sink))?;

    // --- Fixed-price sale -------------------------------------------------
    info!("sita buys the chair at its posted price");
    let tx = market.buy_now("item-chair", "sita", 1000).await?;
    info!(transaction = %tx.id, "escrow held, waiting for delivery");
    market.confirm_delivery(&tx.id, "sita").await?;

    // --- Failed payment rolls the reservation back ------------------------
    info!("hari offers 25000 for the bike");
    let offer = market.make_offer("item-bike", "hari", 25000).await?;
    market.accept_offer(&offer.id, "ram").await?;

    match market.pay_offer(&offer.id, "hari").await {
        Ok(_) => anyhow::bail!("payment should have failed on an empty wallet"),
        Err(e) => warn!("payment failed as expected: {}", e),
    }
    if let Some(listing) = market.listing("item-bike") {
        info!(status = %listing.status, "listing back on the market after rollback");
    }

    // --- Negotiated sale after a top-up -----------------------------------
    info!("hari tops up and pays the accepted offer");
    market.deposit_funds("hari", 25000).await?;
    let tx = market.pay_offer(&offer.id, "hari").await?;
    market.confirm_delivery(&tx.id, "hari").await?;

    // --- Final books ------------------------------------------------------
    for user in ["sita", "ram", "hari"] {
        info!(
            user,
            balance = market.wallet_balance(user).await?,
            "final balance"
        );
    }
    info!(total = market.audit_total(), "system total (wallets + escrow)");

    drop(market);
    delivery.join().expect("delivery thread");

    print_shutdown("Escrow demo");
    Ok(())
}
