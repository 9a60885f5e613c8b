//! Offer negotiation engine.
//!
//! Manages the lifecycle of price offers on negotiable listings:
//! `Pending --accept--> Accepted`, `Pending --reject--> Rejected`,
//! `Pending --withdraw--> Withdrawn`. The terminal states are final.
//!
//! Accepting an offer moves no money and reserves nothing; it only
//! signals the buyer to pay. Several accepted offers can coexist on one
//! listing; the escrow engine's listing reservation decides which buyer
//! actually gets the item.

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::events::DomainEvent;
use crate::domain::models::{Listing, ListingStatus, Offer, OfferStatus};
use crate::infrastructure::listings::{ListingError, ListingStore};
use crate::infrastructure::notify::NotificationSink;

#[derive(Error, Debug)]
pub enum OfferError {
    #[error("offer not found: {0}")]
    NotFound(String),

    #[error("listing not found: {0}")]
    ListingNotFound(String),

    #[error("offer amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// The listing has a fixed price; use buy-now instead.
    #[error("listing {0} is not open to offers")]
    ListingNotNegotiable(String),

    #[error("listing is not available (current status: {0})")]
    ListingUnavailable(ListingStatus),

    #[error("cannot make an offer on your own listing")]
    SelfOffer,

    /// The caller is not the party allowed to perform this transition.
    #[error("caller is not permitted to perform this action")]
    Unauthorized,

    /// The offer already reached a terminal state.
    #[error("offer is not pending (current status: {0})")]
    InvalidState(OfferStatus),

    /// Listing store failure outside the mapped cases.
    #[error("listing store failure: {0}")]
    Listing(#[from] ListingError),
}

pub type Result<T> = std::result::Result<T, OfferError>;

/// Which party a transition belongs to.
enum Actor {
    Seller,
    Buyer,
}

pub struct OfferEngine {
    listings: Arc<dyn ListingStore>,
    offers: DashMap<String, Offer>,
    sink: Arc<dyn NotificationSink>,
}

impl OfferEngine {
    pub fn new(listings: Arc<dyn ListingStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            listings,
            offers: DashMap::new(),
            sink,
        }
    }

    /// Place a new offer on a negotiable, available listing.
    pub async fn make_offer(
        &self,
        listing_id: &str,
        buyer_id: &str,
        amount: i64,
    ) -> Result<Offer> {
        if amount <= 0 {
            return Err(OfferError::InvalidAmount(amount));
        }

        let listing = self.get_listing(listing_id).await?;
        if listing.seller_id == buyer_id {
            return Err(OfferError::SelfOffer);
        }
        if !listing.is_negotiable() {
            return Err(OfferError::ListingNotNegotiable(listing_id.to_string()));
        }
        if listing.status != ListingStatus::Available {
            return Err(OfferError::ListingUnavailable(listing.status));
        }

        let offer = Offer::new(&listing, buyer_id, amount);
        self.offers.insert(offer.id.clone(), offer.clone());
        info!(
            offer = %offer.id,
            listing = %listing_id,
            buyer = %buyer_id,
            amount,
            "offer created"
        );

        self.sink.publish(DomainEvent::OfferCreated {
            offer_id: offer.id.clone(),
            listing_id: listing.id.clone(),
            listing_title: listing.title.clone(),
            buyer_id: buyer_id.to_string(),
            seller_id: listing.seller_id.clone(),
            amount,
        });

        Ok(offer)
    }

    /// Seller accepts a pending offer. Signals the buyer to pay; the
    /// listing stays available until the buyer's payment reserves it.
    pub async fn accept_offer(&self, offer_id: &str, acting_user: &str) -> Result<Offer> {
        let offer =
            self.transition(offer_id, acting_user, Actor::Seller, OfferStatus::Accepted)?;

        self.sink.publish(DomainEvent::OfferAccepted {
            offer_id: offer.id.clone(),
            listing_id: offer.listing_id.clone(),
            buyer_id: offer.buyer_id.clone(),
            amount: offer.amount,
        });

        Ok(offer)
    }

    /// Seller rejects a pending offer. Stale offers on a reserved or sold
    /// listing stay rejectable so sellers can clear their inbox.
    pub async fn reject_offer(&self, offer_id: &str, acting_user: &str) -> Result<Offer> {
        let offer =
            self.transition(offer_id, acting_user, Actor::Seller, OfferStatus::Rejected)?;

        self.sink.publish(DomainEvent::OfferRejected {
            offer_id: offer.id.clone(),
            listing_id: offer.listing_id.clone(),
            buyer_id: offer.buyer_id.clone(),
        });

        Ok(offer)
    }

    /// Buyer withdraws their own pending offer. No notification.
    pub async fn withdraw_offer(&self, offer_id: &str, acting_user: &str) -> Result<Offer> {
        self.transition(offer_id, acting_user, Actor::Buyer, OfferStatus::Withdrawn)
    }

    pub fn offer(&self, offer_id: &str) -> Option<Offer> {
        self.offers.get(offer_id).map(|entry| entry.value().clone())
    }

    pub fn offers(&self) -> Vec<Offer> {
        self.offers.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn offers_for_listing(&self, listing_id: &str) -> Vec<Offer> {
        self.offers
            .iter()
            .filter(|entry| entry.listing_id == listing_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    async fn get_listing(&self, listing_id: &str) -> Result<Listing> {
        self.listings.get(listing_id).await.map_err(|e| match e {
            ListingError::NotFound(id) => OfferError::ListingNotFound(id),
            other => OfferError::Listing(other),
        })
    }

    /// Authorization check and state transition under one entry guard.
    fn transition(
        &self,
        offer_id: &str,
        acting_user: &str,
        actor: Actor,
        to: OfferStatus,
    ) -> Result<Offer> {
        let mut offer = self
            .offers
            .get_mut(offer_id)
            .ok_or_else(|| OfferError::NotFound(offer_id.to_string()))?;

        let permitted = match actor {
            Actor::Seller => offer.seller_id == acting_user,
            Actor::Buyer => offer.buyer_id == acting_user,
        };
        if !permitted {
            return Err(OfferError::Unauthorized);
        }
        if offer.status != OfferStatus::Pending {
            return Err(OfferError::InvalidState(offer.status));
        }

        offer.status = to;
        debug!(offer = %offer_id, to = %to, "offer transition");
        Ok(offer.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PriceType;
    use crate::infrastructure::listings::ListingTracker;
    use crate::infrastructure::notify::MemorySink;

    struct Fixture {
        engine: OfferEngine,
        tracker: Arc<ListingTracker>,
        sink: Arc<MemorySink>,
        listing_id: String,
    }

    fn fixture() -> Fixture {
        let tracker = Arc::new(ListingTracker::new());
        let sink = Arc::new(MemorySink::new());
        let listing = tracker
            .post("seller1", "Mountain Bike", 30000, PriceType::Negotiable)
            .unwrap();
        let engine = OfferEngine::new(
            Arc::clone(&tracker) as Arc<dyn ListingStore>,
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
        );
        Fixture {
            engine,
            tracker,
            sink,
            listing_id: listing.id,
        }
    }

    #[tokio::test]
    async fn test_make_and_accept_offer() {
        let f = fixture();

        let offer = f
            .engine
            .make_offer(&f.listing_id, "buyer1", 25000)
            .await
            .unwrap();
        assert_eq!(offer.status, OfferStatus::Pending);
        assert_eq!(offer.seller_id, "seller1");

        let accepted = f.engine.accept_offer(&offer.id, "seller1").await.unwrap();
        assert_eq!(accepted.status, OfferStatus::Accepted);

        let events = f.sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "OfferCreated");
        assert_eq!(events[0].recipient(), "seller1");
        assert_eq!(events[1].name(), "OfferAccepted");
        assert_eq!(events[1].recipient(), "buyer1");
    }

    #[tokio::test]
    async fn test_accept_requires_seller() {
        let f = fixture();
        let offer = f
            .engine
            .make_offer(&f.listing_id, "buyer1", 25000)
            .await
            .unwrap();

        let err = f.engine.accept_offer(&offer.id, "buyer1").await.unwrap_err();
        assert!(matches!(err, OfferError::Unauthorized));
        // offer untouched
        assert_eq!(f.engine.offer(&offer.id).unwrap().status, OfferStatus::Pending);
    }

    #[tokio::test]
    async fn test_rejected_offer_cannot_be_accepted() {
        let f = fixture();
        let offer = f
            .engine
            .make_offer(&f.listing_id, "buyer1", 20000)
            .await
            .unwrap();

        f.engine.reject_offer(&offer.id, "seller1").await.unwrap();
        let err = f.engine.accept_offer(&offer.id, "seller1").await.unwrap_err();
        assert!(matches!(
            err,
            OfferError::InvalidState(OfferStatus::Rejected)
        ));
    }

    #[tokio::test]
    async fn test_withdraw_is_buyer_only() {
        let f = fixture();
        let offer = f
            .engine
            .make_offer(&f.listing_id, "buyer1", 20000)
            .await
            .unwrap();

        let err = f
            .engine
            .withdraw_offer(&offer.id, "seller1")
            .await
            .unwrap_err();
        assert!(matches!(err, OfferError::Unauthorized));

        let withdrawn = f.engine.withdraw_offer(&offer.id, "buyer1").await.unwrap();
        assert_eq!(withdrawn.status, OfferStatus::Withdrawn);
    }

    #[tokio::test]
    async fn test_offer_on_fixed_price_listing_rejected() {
        let f = fixture();
        let fixed = f
            .tracker
            .post("seller1", "Rice Cooker", 3000, PriceType::Fixed)
            .unwrap();

        let err = f
            .engine
            .make_offer(&fixed.id, "buyer1", 2500)
            .await
            .unwrap_err();
        assert!(matches!(err, OfferError::ListingNotNegotiable(_)));
    }

    #[tokio::test]
    async fn test_offer_on_reserved_listing_rejected() {
        let f = fixture();
        f.tracker.reserve(&f.listing_id).await.unwrap();

        let err = f
            .engine
            .make_offer(&f.listing_id, "buyer1", 25000)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            OfferError::ListingUnavailable(ListingStatus::Pending)
        ));
    }

    #[tokio::test]
    async fn test_stale_offer_rejectable_after_reservation() {
        let f = fixture();
        let offer = f
            .engine
            .make_offer(&f.listing_id, "buyer1", 25000)
            .await
            .unwrap();

        // another buyer wins the listing
        f.tracker.reserve(&f.listing_id).await.unwrap();

        // seller can still clear the stale offer
        let rejected = f.engine.reject_offer(&offer.id, "seller1").await.unwrap();
        assert_eq!(rejected.status, OfferStatus::Rejected);
    }

    #[tokio::test]
    async fn test_self_offer_rejected() {
        let f = fixture();
        let err = f
            .engine
            .make_offer(&f.listing_id, "seller1", 25000)
            .await
            .unwrap_err();
        assert!(matches!(err, OfferError::SelfOffer));
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let f = fixture();
        let err = f
            .engine
            .make_offer(&f.listing_id, "buyer1", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, OfferError::InvalidAmount(0)));
    }

    #[tokio::test]
    async fn test_offers_for_listing() {
        let f = fixture();
        f.engine
            .make_offer(&f.listing_id, "buyer1", 20000)
            .await
            .unwrap();
        f.engine
            .make_offer(&f.listing_id, "buyer2", 22000)
            .await
            .unwrap();

        assert_eq!(f.engine.offers_for_listing(&f.listing_id).len(), 2);
        assert_eq!(f.engine.offers_for_listing("other").len(), 0);
    }
}
