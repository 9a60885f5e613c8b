//! Listing catalog and lifecycle tracker.
//!
//! Owns every listing's status field. `reserve` is the serialization point
//! for competing purchase attempts: a single conditional update under the
//! entry guard decides the winner, and every loser observes `NotAvailable`.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::models::{Listing, ListingStatus, PriceType};

#[derive(Error, Debug)]
pub enum ListingError {
    #[error("listing not found: {0}")]
    NotFound(String),

    /// The listing is not in `Available`, so it cannot be reserved,
    /// edited or deleted.
    #[error("listing is not available (current status: {0})")]
    NotAvailable(ListingStatus),

    /// A finalize/release was attempted outside `Pending`.
    #[error("invalid status transition from {found} (expected {expected})")]
    InvalidTransition {
        expected: ListingStatus,
        found: ListingStatus,
    },

    /// The caller is not the listing's seller.
    #[error("only the seller may modify a listing")]
    Unauthorized,

    #[error("listing price must be positive, got {0}")]
    InvalidPrice(i64),
}

pub type Result<T> = std::result::Result<T, ListingError>;

/// The escrow-facing seam of the tracker.
///
/// `reserve`, `finalize` and `release` must each be an atomic
/// compare-and-set on the listing's status field; a read-then-write with a
/// gap would let two purchase attempts both win the reservation.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Snapshot of a listing.
    async fn get(&self, listing_id: &str) -> Result<Listing>;

    /// `Available → Pending`. The purchase gate.
    async fn reserve(&self, listing_id: &str) -> Result<()>;

    /// `Pending → Sold`.
    async fn finalize(&self, listing_id: &str) -> Result<()>;

    /// `Pending → Available`, used on refund or cancellation.
    async fn release(&self, listing_id: &str) -> Result<()>;
}

/// Fields of a listing a seller may edit while it is still available.
#[derive(Debug, Clone, Default)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub price: Option<i64>,
    pub price_type: Option<PriceType>,
}

/// In-memory listing tracker.
#[derive(Default)]
pub struct ListingTracker {
    listings: DashMap<String, Listing>,
}

impl ListingTracker {
    pub fn new() -> Self {
        Self {
            listings: DashMap::new(),
        }
    }

    /// Seed a listing record, e.g. from a config file. Validates the price
    /// but trusts the rest of the record.
    pub fn insert(&self, listing: Listing) -> Result<()> {
        if listing.price <= 0 {
            return Err(ListingError::InvalidPrice(listing.price));
        }
        debug!(listing = %listing.id, seller = %listing.seller_id, "listing inserted");
        self.listings.insert(listing.id.clone(), listing);
        Ok(())
    }

    /// Post a new listing for sale.
    pub fn post(
        &self,
        seller_id: &str,
        title: &str,
        price: i64,
        price_type: PriceType,
    ) -> Result<Listing> {
        if price <= 0 {
            return Err(ListingError::InvalidPrice(price));
        }
        let listing = Listing::new(seller_id, title, price, price_type);
        info!(listing = %listing.id, seller = %seller_id, price, "listing posted");
        self.listings.insert(listing.id.clone(), listing.clone());
        Ok(listing)
    }

    /// Edit a listing's sale terms. Only the seller may edit, and only
    /// while the listing is `Available`: an in-flight escrow hold pins
    /// the terms the buyer paid against.
    pub fn update_details(
        &self,
        listing_id: &str,
        seller_id: &str,
        patch: ListingPatch,
    ) -> Result<Listing> {
        let mut listing = self
            .listings
            .get_mut(listing_id)
            .ok_or_else(|| ListingError::NotFound(listing_id.to_string()))?;

        if listing.seller_id != seller_id {
            return Err(ListingError::Unauthorized);
        }
        if listing.status != ListingStatus::Available {
            return Err(ListingError::NotAvailable(listing.status));
        }
        if let Some(price) = patch.price {
            if price <= 0 {
                return Err(ListingError::InvalidPrice(price));
            }
            listing.price = price;
        }
        if let Some(title) = patch.title {
            listing.title = title;
        }
        if let Some(price_type) = patch.price_type {
            listing.price_type = price_type;
        }

        debug!(listing = %listing_id, "listing updated");
        Ok(listing.clone())
    }

    /// Delete a listing. Same guard as editing: rejected unless the
    /// listing is `Available`.
    pub fn remove(&self, listing_id: &str, seller_id: &str) -> Result<()> {
        // Check and removal stay under one entry lock so a concurrent
        // reserve cannot slip in between them.
        match self.listings.entry(listing_id.to_string()) {
            Entry::Vacant(_) => Err(ListingError::NotFound(listing_id.to_string())),
            Entry::Occupied(entry) => {
                let listing = entry.get();
                if listing.seller_id != seller_id {
                    return Err(ListingError::Unauthorized);
                }
                if listing.status != ListingStatus::Available {
                    return Err(ListingError::NotAvailable(listing.status));
                }
                entry.remove();
                info!(listing = %listing_id, "listing removed");
                Ok(())
            }
        }
    }

    pub fn listing(&self, listing_id: &str) -> Option<Listing> {
        self.listings.get(listing_id).map(|entry| entry.value().clone())
    }

    pub fn listings(&self) -> Vec<Listing> {
        self.listings.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn listing_count(&self) -> usize {
        self.listings.len()
    }

    /// Single conditional status update under the entry guard.
    fn transition(
        &self,
        listing_id: &str,
        from: ListingStatus,
        to: ListingStatus,
    ) -> Result<()> {
        let mut listing = self
            .listings
            .get_mut(listing_id)
            .ok_or_else(|| ListingError::NotFound(listing_id.to_string()))?;

        if listing.status != from {
            return Err(if from == ListingStatus::Available {
                ListingError::NotAvailable(listing.status)
            } else {
                ListingError::InvalidTransition {
                    expected: from,
                    found: listing.status,
                }
            });
        }

        listing.status = to;
        debug!(listing = %listing_id, from = %from, to = %to, "status transition");
        Ok(())
    }
}

#[async_trait]
impl ListingStore for ListingTracker {
    async fn get(&self, listing_id: &str) -> Result<Listing> {
        self.listing(listing_id)
            .ok_or_else(|| ListingError::NotFound(listing_id.to_string()))
    }

    async fn reserve(&self, listing_id: &str) -> Result<()> {
        self.transition(listing_id, ListingStatus::Available, ListingStatus::Pending)
    }

    async fn finalize(&self, listing_id: &str) -> Result<()> {
        self.transition(listing_id, ListingStatus::Pending, ListingStatus::Sold)
    }

    async fn release(&self, listing_id: &str) -> Result<()> {
        self.transition(listing_id, ListingStatus::Pending, ListingStatus::Available)
    }
}
