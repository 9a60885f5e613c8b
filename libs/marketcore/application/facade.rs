//! Application facade.
//!
//! Public API for binaries and integration rigs: wires the in-memory
//! ledger, listing tracker, offer engine and escrow engine against a
//! single notification sink. Component errors pass through unchanged so
//! callers keep the typed failure taxonomy.

use std::sync::Arc;
use tracing::info;

use crate::application::escrow::{self, EscrowEngine};
use crate::application::offers::{self, OfferEngine};
use crate::domain::models::{Listing, Offer, PriceType, Transaction};
use crate::infrastructure::config::MarketConfig;
use crate::infrastructure::ledger::{self, Ledger, LedgerError, MemoryLedger};
use crate::infrastructure::listings::{self, ListingPatch, ListingStore, ListingTracker};
use crate::infrastructure::notify::NotificationSink;

pub struct Marketplace {
    ledger: Arc<MemoryLedger>,
    listings: Arc<ListingTracker>,
    offers: Arc<OfferEngine>,
    escrow: Arc<EscrowEngine>,
}

impl Marketplace {
    /// Build an empty marketplace against the given sink.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let listings = Arc::new(ListingTracker::new());
        let offers = Arc::new(OfferEngine::new(
            Arc::clone(&listings) as Arc<dyn ListingStore>,
            Arc::clone(&sink),
        ));
        let escrow = Arc::new(EscrowEngine::new(
            Arc::clone(&ledger) as Arc<dyn Ledger>,
            Arc::clone(&listings) as Arc<dyn ListingStore>,
            Arc::clone(&offers),
            sink,
        ));

        Self {
            ledger,
            listings,
            offers,
            escrow,
        }
    }

    /// Build a marketplace seeded from a validated config.
    pub fn from_config(
        config: &MarketConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self, crate::infrastructure::config::ConfigError> {
        use crate::infrastructure::config::ConfigError;

        config.validate()?;
        let market = Self::new(sink);

        for user in &config.users {
            market
                .ledger
                .open_account(&user.id, user.balance)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }
        for seed in &config.listings {
            let listing = Listing {
                id: seed.id.clone(),
                seller_id: seed.seller_id.clone(),
                title: seed.title.clone(),
                price: seed.price,
                price_type: seed.price_type,
                status: crate::domain::models::ListingStatus::Available,
                created_at: chrono::Utc::now(),
            };
            market
                .listings
                .insert(listing)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        }

        info!(
            users = config.users.len(),
            listings = config.listings.len(),
            "marketplace seeded"
        );
        Ok(market)
    }

    // ======================= Wallet =======================

    /// Add funds to a wallet (top-up from an external payment rail).
    pub async fn deposit_funds(&self, user_id: &str, amount: i64) -> ledger::Result<()> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        self.ledger.credit(user_id, amount).await
    }

    /// Withdraw funds from a wallet. Fails on insufficient balance.
    pub async fn withdraw_funds(&self, user_id: &str, amount: i64) -> ledger::Result<()> {
        self.ledger.debit(user_id, amount).await
    }

    pub async fn wallet_balance(&self, user_id: &str) -> ledger::Result<i64> {
        self.ledger.balance(user_id).await
    }

    // ======================= Listings =======================

    pub fn post_listing(
        &self,
        seller_id: &str,
        title: &str,
        price: i64,
        price_type: PriceType,
    ) -> listings::Result<Listing> {
        self.listings.post(seller_id, title, price, price_type)
    }

    pub fn edit_listing(
        &self,
        listing_id: &str,
        seller_id: &str,
        patch: ListingPatch,
    ) -> listings::Result<Listing> {
        self.listings.update_details(listing_id, seller_id, patch)
    }

    pub fn delete_listing(&self, listing_id: &str, seller_id: &str) -> listings::Result<()> {
        self.listings.remove(listing_id, seller_id)
    }

    pub fn listing(&self, listing_id: &str) -> Option<Listing> {
        self.listings.listing(listing_id)
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.listings.listings()
    }

    // ======================= Offers =======================

    pub async fn make_offer(
        &self,
        listing_id: &str,
        buyer_id: &str,
        amount: i64,
    ) -> offers::Result<Offer> {
        self.offers.make_offer(listing_id, buyer_id, amount).await
    }

    pub async fn accept_offer(&self, offer_id: &str, acting_user: &str) -> offers::Result<Offer> {
        self.offers.accept_offer(offer_id, acting_user).await
    }

    pub async fn reject_offer(&self, offer_id: &str, acting_user: &str) -> offers::Result<Offer> {
        self.offers.reject_offer(offer_id, acting_user).await
    }

    pub async fn withdraw_offer(
        &self,
        offer_id: &str,
        acting_user: &str,
    ) -> offers::Result<Offer> {
        self.offers.withdraw_offer(offer_id, acting_user).await
    }

    pub fn offer(&self, offer_id: &str) -> Option<Offer> {
        self.offers.offer(offer_id)
    }

    pub fn offers(&self) -> Vec<Offer> {
        self.offers.offers()
    }

    pub fn offers_for_listing(&self, listing_id: &str) -> Vec<Offer> {
        self.offers.offers_for_listing(listing_id)
    }

    // ======================= Escrow =======================

    pub async fn buy_now(
        &self,
        listing_id: &str,
        buyer_id: &str,
        amount: i64,
    ) -> escrow::Result<Transaction> {
        self.escrow.buy_now(listing_id, buyer_id, amount).await
    }

    pub async fn pay_offer(&self, offer_id: &str, buyer_id: &str) -> escrow::Result<Transaction> {
        self.escrow.pay_offer(offer_id, buyer_id).await
    }

    pub async fn confirm_delivery(
        &self,
        transaction_id: &str,
        acting_user: &str,
    ) -> escrow::Result<Transaction> {
        self.escrow.confirm_delivery(transaction_id, acting_user).await
    }

    pub async fn cancel_purchase(
        &self,
        transaction_id: &str,
        acting_user: &str,
    ) -> escrow::Result<Transaction> {
        self.escrow.cancel_purchase(transaction_id, acting_user).await
    }

    pub async fn refund(&self, transaction_id: &str) -> escrow::Result<Transaction> {
        self.escrow.refund(transaction_id).await
    }

    pub fn transaction(&self, transaction_id: &str) -> Option<Transaction> {
        self.escrow.transaction(transaction_id)
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.escrow.transactions()
    }

    pub fn transactions_for_user(&self, user_id: &str) -> Vec<Transaction> {
        self.escrow.transactions_for_user(user_id)
    }

    // ======================= Audit =======================

    /// Wallet total plus escrow-held total. Invariant across purchase,
    /// confirm, cancel and refund operations; moves only on deposit and
    /// withdrawal.
    pub fn audit_total(&self) -> i64 {
        self.ledger.total_balance() + self.escrow.held_total()
    }
}
