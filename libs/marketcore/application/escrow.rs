//! Escrow transaction engine.
//!
//! Orchestrates the money side of a purchase: reserve the listing, debit
//! the buyer into escrow, and later settle the hold exactly once as
//! released, refunded or cancelled.
//!
//! Concurrency notes
//! -----------------
//! The listing reservation is the serialization point: of any number of
//! concurrent purchase attempts against one listing, exactly one wins
//! `reserve()` and every other caller fails with `ListingUnavailable`
//! before money moves. A debit failure after a successful reservation is
//! compensated by releasing the listing before the error is returned.
//!
//! Settlement claims the transaction's terminal state with a single
//! compare-and-set under the entry guard *before* the ledger credit and
//! listing transition run, so two concurrent confirms (or a confirm
//! racing a refund) cannot both settle. The post-claim steps are not
//! expected to fail; if one does, it is logged as a ledger inconsistency
//! and surfaced for manual reconciliation, never hidden.

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::application::offers::OfferEngine;
use crate::domain::events::DomainEvent;
use crate::domain::models::{
    Listing, ListingStatus, OfferStatus, Transaction, TransactionStatus,
};
use crate::infrastructure::ledger::{Ledger, LedgerError};
use crate::infrastructure::listings::{ListingError, ListingStore};
use crate::infrastructure::notify::NotificationSink;

#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("listing not found: {0}")]
    ListingNotFound(String),

    #[error("offer not found: {0}")]
    OfferNotFound(String),

    #[error("buyers cannot purchase their own listing")]
    SelfPurchase,

    /// Fixed-price payment does not match the posted price.
    #[error("payment of {offered} does not match the listing price {expected}")]
    PriceMismatch { expected: i64, offered: i64 },

    /// Negotiated payment attempted against an offer that is not accepted.
    #[error("offer is not accepted (current status: {0})")]
    OfferNotAccepted(OfferStatus),

    #[error("caller is not permitted to perform this action")]
    Unauthorized,

    /// The listing was reserved or sold by the time this attempt arrived.
    #[error("listing is not available (current status: {0})")]
    ListingUnavailable(ListingStatus),

    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: i64, required: i64 },

    /// The transaction already reached a terminal state.
    #[error("transaction is not in escrow (current status: {0})")]
    InvalidTransactionState(TransactionStatus),

    /// Ledger failure outside the mapped cases.
    #[error("ledger failure: {0}")]
    Ledger(#[from] LedgerError),

    /// Listing store failure outside the mapped cases.
    #[error("listing store failure: {0}")]
    Listing(#[from] ListingError),
}

pub type Result<T> = std::result::Result<T, EscrowError>;

/// How a settled hold pays out.
enum Settlement {
    /// Credit the seller, mark the listing sold.
    ReleaseToSeller,
    /// Credit the buyer back, put the listing back on the market.
    ReturnToBuyer,
}

pub struct EscrowEngine {
    ledger: Arc<dyn Ledger>,
    listings: Arc<dyn ListingStore>,
    offers: Arc<OfferEngine>,
    transactions: DashMap<String, Transaction>,
    sink: Arc<dyn NotificationSink>,
}

impl EscrowEngine {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        listings: Arc<dyn ListingStore>,
        offers: Arc<OfferEngine>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            ledger,
            listings,
            offers,
            transactions: DashMap::new(),
            sink,
        }
    }

    /// Fixed-price purchase. `amount` must match the posted price exactly;
    /// a negotiable listing can also be bought outright at its posted
    /// price.
    pub async fn buy_now(
        &self,
        listing_id: &str,
        buyer_id: &str,
        amount: i64,
    ) -> Result<Transaction> {
        let listing = self.get_listing(listing_id).await?;
        if listing.seller_id == buyer_id {
            return Err(EscrowError::SelfPurchase);
        }
        if amount != listing.price {
            return Err(EscrowError::PriceMismatch {
                expected: listing.price,
                offered: amount,
            });
        }

        self.execute_purchase(&listing, buyer_id, amount).await
    }

    /// Negotiated purchase: pay an accepted offer. The offer's amount is
    /// the purchase amount, regardless of the listing's posted price.
    pub async fn pay_offer(&self, offer_id: &str, buyer_id: &str) -> Result<Transaction> {
        let offer = self
            .offers
            .offer(offer_id)
            .ok_or_else(|| EscrowError::OfferNotFound(offer_id.to_string()))?;

        if offer.buyer_id != buyer_id {
            return Err(EscrowError::Unauthorized);
        }
        if offer.status != OfferStatus::Accepted {
            return Err(EscrowError::OfferNotAccepted(offer.status));
        }

        let listing = self.get_listing(&offer.listing_id).await?;
        self.execute_purchase(&listing, buyer_id, offer.amount).await
    }

    /// Buyer confirms delivery: the hold is released to the seller and
    /// the listing becomes sold.
    pub async fn confirm_delivery(
        &self,
        transaction_id: &str,
        acting_user: &str,
    ) -> Result<Transaction> {
        let tx = self.claim(transaction_id, Some(acting_user), TransactionStatus::Released)?;

        self.settle(&tx, Settlement::ReleaseToSeller).await?;
        info!(
            transaction = %tx.id,
            seller = %tx.seller_id,
            amount = tx.amount,
            "escrow released to seller"
        );

        self.sink.publish(DomainEvent::PaymentReleased {
            transaction_id: tx.id.clone(),
            seller_id: tx.seller_id.clone(),
            amount: tx.amount,
        });

        Ok(tx)
    }

    /// Buyer backs out of a held purchase: the hold returns to the buyer
    /// and the listing goes back on the market.
    pub async fn cancel_purchase(
        &self,
        transaction_id: &str,
        acting_user: &str,
    ) -> Result<Transaction> {
        let tx = self.claim(transaction_id, Some(acting_user), TransactionStatus::Cancelled)?;

        self.settle(&tx, Settlement::ReturnToBuyer).await?;
        info!(
            transaction = %tx.id,
            buyer = %tx.buyer_id,
            amount = tx.amount,
            "held purchase cancelled"
        );

        self.sink.publish(DomainEvent::PurchaseCancelled {
            transaction_id: tx.id.clone(),
            listing_id: tx.item_id.clone(),
            seller_id: tx.seller_id.clone(),
            buyer_id: tx.buyer_id.clone(),
            amount: tx.amount,
        });

        Ok(tx)
    }

    /// Administrative refund hook for the dispute path. No caller check:
    /// authorization is the surrounding application's concern.
    pub async fn refund(&self, transaction_id: &str) -> Result<Transaction> {
        let tx = self.claim(transaction_id, None, TransactionStatus::Refunded)?;

        self.settle(&tx, Settlement::ReturnToBuyer).await?;
        info!(
            transaction = %tx.id,
            buyer = %tx.buyer_id,
            amount = tx.amount,
            "escrow refunded to buyer"
        );

        self.sink.publish(DomainEvent::PaymentRefunded {
            transaction_id: tx.id.clone(),
            buyer_id: tx.buyer_id.clone(),
            amount: tx.amount,
        });

        Ok(tx)
    }

    pub fn transaction(&self, transaction_id: &str) -> Option<Transaction> {
        self.transactions
            .get(transaction_id)
            .map(|entry| entry.value().clone())
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn transactions_for_user(&self, user_id: &str) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|entry| entry.buyer_id == user_id || entry.seller_id == user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Sum of all currently held amounts. Audit helper: wallet total plus
    /// held total is invariant across purchase operations.
    pub fn held_total(&self) -> i64 {
        self.transactions
            .iter()
            .filter(|entry| entry.is_held())
            .map(|entry| entry.amount)
            .sum()
    }

    /// reserve → debit → hold. Reservation first so no money moves for a
    /// listing another buyer already won; debit failure rolls the
    /// reservation back before returning.
    async fn execute_purchase(
        &self,
        listing: &Listing,
        buyer_id: &str,
        amount: i64,
    ) -> Result<Transaction> {
        if let Err(e) = self.listings.reserve(&listing.id).await {
            return Err(match e {
                ListingError::NotFound(id) => EscrowError::ListingNotFound(id),
                ListingError::NotAvailable(status) => EscrowError::ListingUnavailable(status),
                other => EscrowError::Listing(other),
            });
        }

        if let Err(e) = self.ledger.debit(buyer_id, amount).await {
            // Compensate: the reservation must not outlive the failed
            // debit. A rollback failure leaves the listing stuck in
            // pending and needs manual reconciliation.
            if let Err(rollback) = self.listings.release(&listing.id).await {
                error!(
                    listing = %listing.id,
                    error = %rollback,
                    "failed to roll back reservation after debit failure; \
                     listing requires manual reconciliation"
                );
            }
            return Err(match e {
                LedgerError::InsufficientFunds { balance, required } => {
                    EscrowError::InsufficientFunds { balance, required }
                }
                other => EscrowError::Ledger(other),
            });
        }

        let tx = Transaction::new(buyer_id, &listing.seller_id, &listing.id, amount);
        self.transactions.insert(tx.id.clone(), tx.clone());
        info!(
            transaction = %tx.id,
            listing = %listing.id,
            buyer = %buyer_id,
            amount,
            "purchase initiated, amount held in escrow"
        );

        self.sink.publish(DomainEvent::PurchaseInitiated {
            transaction_id: tx.id.clone(),
            listing_id: listing.id.clone(),
            listing_title: listing.title.clone(),
            buyer_id: buyer_id.to_string(),
            seller_id: listing.seller_id.clone(),
            amount,
        });

        Ok(tx)
    }

    /// Atomically claim a held transaction's terminal state. Exactly one
    /// concurrent caller can win the claim; everyone else observes a
    /// terminal status and fails with `InvalidTransactionState`.
    fn claim(
        &self,
        transaction_id: &str,
        required_buyer: Option<&str>,
        to: TransactionStatus,
    ) -> Result<Transaction> {
        let mut tx = self
            .transactions
            .get_mut(transaction_id)
            .ok_or_else(|| EscrowError::TransactionNotFound(transaction_id.to_string()))?;

        if let Some(buyer) = required_buyer {
            if tx.buyer_id != buyer {
                return Err(EscrowError::Unauthorized);
            }
        }
        if tx.status != TransactionStatus::EscrowHeld {
            return Err(EscrowError::InvalidTransactionState(tx.status));
        }

        tx.status = to;
        Ok(tx.clone())
    }

    /// Pay out a claimed hold. Failures here mean the books no longer
    /// balance; they are logged and surfaced, not swallowed.
    async fn settle(&self, tx: &Transaction, settlement: Settlement) -> Result<()> {
        let (recipient, listing_op) = match settlement {
            Settlement::ReleaseToSeller => (&tx.seller_id, "finalize"),
            Settlement::ReturnToBuyer => (&tx.buyer_id, "release"),
        };

        if let Err(e) = self.ledger.credit(recipient, tx.amount).await {
            error!(
                transaction = %tx.id,
                recipient = %recipient,
                error = %e,
                "credit failed after terminal claim; ledger requires manual reconciliation"
            );
            return Err(e.into());
        }

        let result = match settlement {
            Settlement::ReleaseToSeller => self.listings.finalize(&tx.item_id).await,
            Settlement::ReturnToBuyer => self.listings.release(&tx.item_id).await,
        };
        if let Err(e) = result {
            error!(
                transaction = %tx.id,
                listing = %tx.item_id,
                op = listing_op,
                error = %e,
                "listing transition failed after settlement; requires manual reconciliation"
            );
            return Err(e.into());
        }

        Ok(())
    }

    async fn get_listing(&self, listing_id: &str) -> Result<Listing> {
        self.listings.get(listing_id).await.map_err(|e| match e {
            ListingError::NotFound(id) => EscrowError::ListingNotFound(id),
            other => EscrowError::Listing(other),
        })
    }
}
