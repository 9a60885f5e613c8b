//! Core marketplace entities: listings, offers, escrow transactions.
//!
//! Monetary amounts are whole rupees stored as `i64`. Integer arithmetic
//! keeps balance checks exact; fractional amounts are not representable
//! on this marketplace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::ids::next_id;

/// Lifecycle status of a listing.
///
/// Transitions are monotonic per purchase attempt:
/// `Available → Pending → Sold`, or `Available → Pending → Available`
/// when a held purchase is refunded or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Pending,
    Sold,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Pending => "pending",
            ListingStatus::Sold => "sold",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a listing's price is final or open to negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Fixed,
    Negotiable,
}

/// An item posted for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub seller_id: String,
    pub title: String,
    /// Posted price in whole rupees. Always positive.
    pub price: i64,
    pub price_type: PriceType,
    pub status: ListingStatus,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Create a new listing in `Available` with a fresh id.
    pub fn new(seller_id: &str, title: &str, price: i64, price_type: PriceType) -> Self {
        Self {
            id: next_id("item"),
            seller_id: seller_id.to_string(),
            title: title.to_string(),
            price,
            price_type,
            status: ListingStatus::Available,
            created_at: Utc::now(),
        }
    }

    pub fn is_negotiable(&self) -> bool {
        self.price_type == PriceType::Negotiable
    }
}

/// Lifecycle status of a price offer.
///
/// `Accepted`, `Rejected` and `Withdrawn` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Pending => "pending",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Rejected => "rejected",
            OfferStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != OfferStatus::Pending
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A buyer's price offer on a negotiable listing.
///
/// The seller id is denormalized from the listing at creation so the offer
/// record stands on its own for audit. Offers are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub listing_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    /// Offered amount in whole rupees. Always positive.
    pub amount: i64,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub fn new(listing: &Listing, buyer_id: &str, amount: i64) -> Self {
        Self {
            id: next_id("offer"),
            listing_id: listing.id.clone(),
            buyer_id: buyer_id.to_string(),
            seller_id: listing.seller_id.clone(),
            amount,
            status: OfferStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Settlement status of an escrow transaction.
///
/// `EscrowHeld` is the only non-terminal state. Each terminal state fires
/// exactly one matching ledger credit: `Released` pays the seller,
/// `Refunded` and `Cancelled` return the hold to the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    EscrowHeld,
    Released,
    Refunded,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::EscrowHeld => "escrow_held",
            TransactionStatus::Released => "released",
            TransactionStatus::Refunded => "refunded",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != TransactionStatus::EscrowHeld
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An escrow hold and its resolution. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub item_id: String,
    /// Held amount in whole rupees.
    pub amount: i64,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction in `EscrowHeld` with a fresh id.
    pub fn new(buyer_id: &str, seller_id: &str, item_id: &str, amount: i64) -> Self {
        Self {
            id: next_id("tx"),
            buyer_id: buyer_id.to_string(),
            seller_id: seller_id.to_string(),
            item_id: item_id.to_string(),
            amount,
            status: TransactionStatus::EscrowHeld,
            created_at: Utc::now(),
        }
    }

    pub fn is_held(&self) -> bool {
        self.status == TransactionStatus::EscrowHeld
    }
}
