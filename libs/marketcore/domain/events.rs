//! Domain events emitted by the offer and escrow engines.
//!
//! Events are explicit values handed to a [`NotificationSink`]
//! rather than side effects buried inside business actions. Delivery
//! (push, in-app panel, e-mail) is entirely the sink's concern.
//!
//! [`NotificationSink`]: crate::infrastructure::notify::NotificationSink

use serde::{Deserialize, Serialize};

/// Category tag carried on rendered notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Offer,
    Transaction,
    System,
}

/// A rendered, deliverable notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_id: String,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
}

/// Something that happened in the negotiation or escrow flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    OfferCreated {
        offer_id: String,
        listing_id: String,
        listing_title: String,
        buyer_id: String,
        seller_id: String,
        amount: i64,
    },
    OfferAccepted {
        offer_id: String,
        listing_id: String,
        buyer_id: String,
        amount: i64,
    },
    OfferRejected {
        offer_id: String,
        listing_id: String,
        buyer_id: String,
    },
    PurchaseInitiated {
        transaction_id: String,
        listing_id: String,
        listing_title: String,
        buyer_id: String,
        seller_id: String,
        amount: i64,
    },
    PaymentReleased {
        transaction_id: String,
        seller_id: String,
        amount: i64,
    },
    PaymentRefunded {
        transaction_id: String,
        buyer_id: String,
        amount: i64,
    },
    PurchaseCancelled {
        transaction_id: String,
        listing_id: String,
        seller_id: String,
        buyer_id: String,
        amount: i64,
    },
}

impl DomainEvent {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::OfferCreated { .. } => "OfferCreated",
            DomainEvent::OfferAccepted { .. } => "OfferAccepted",
            DomainEvent::OfferRejected { .. } => "OfferRejected",
            DomainEvent::PurchaseInitiated { .. } => "PurchaseInitiated",
            DomainEvent::PaymentReleased { .. } => "PaymentReleased",
            DomainEvent::PaymentRefunded { .. } => "PaymentRefunded",
            DomainEvent::PurchaseCancelled { .. } => "PurchaseCancelled",
        }
    }

    /// The user this event should be delivered to.
    pub fn recipient(&self) -> &str {
        match self {
            DomainEvent::OfferCreated { seller_id, .. } => seller_id,
            DomainEvent::OfferAccepted { buyer_id, .. } => buyer_id,
            DomainEvent::OfferRejected { buyer_id, .. } => buyer_id,
            DomainEvent::PurchaseInitiated { seller_id, .. } => seller_id,
            DomainEvent::PaymentReleased { seller_id, .. } => seller_id,
            DomainEvent::PaymentRefunded { buyer_id, .. } => buyer_id,
            DomainEvent::PurchaseCancelled { seller_id, .. } => seller_id,
        }
    }

    pub fn kind(&self) -> NotificationKind {
        match self {
            DomainEvent::OfferCreated { .. }
            | DomainEvent::OfferAccepted { .. }
            | DomainEvent::OfferRejected { .. } => NotificationKind::Offer,
            _ => NotificationKind::Transaction,
        }
    }

    /// Render the user-facing notification for this event.
    pub fn notification(&self) -> Notification {
        let (title, body) = match self {
            DomainEvent::OfferCreated {
                listing_title,
                buyer_id,
                amount,
                ..
            } => (
                format!("New Offer on {}", listing_title),
                format!("{} offered {}.", buyer_id, format_npr(*amount)),
            ),
            DomainEvent::OfferAccepted { amount, .. } => (
                "Offer Accepted!".to_string(),
                format!(
                    "Your offer for {} has been accepted. Proceed to payment.",
                    format_npr(*amount)
                ),
            ),
            DomainEvent::OfferRejected { .. } => (
                "Offer Rejected".to_string(),
                "Unfortunately, your recent offer was not accepted.".to_string(),
            ),
            DomainEvent::PurchaseInitiated {
                listing_title,
                amount,
                ..
            } => (
                "Item Reserved".to_string(),
                format!(
                    "{} is held in escrow for {}. Hand over the item to complete the sale.",
                    format_npr(*amount),
                    listing_title
                ),
            ),
            DomainEvent::PaymentReleased { amount, .. } => (
                "Payment Released".to_string(),
                format!("{} has been released to your wallet.", format_npr(*amount)),
            ),
            DomainEvent::PaymentRefunded { amount, .. } => (
                "Payment Refunded".to_string(),
                format!("{} has been returned to your wallet.", format_npr(*amount)),
            ),
            DomainEvent::PurchaseCancelled { amount, .. } => (
                "Purchase Cancelled".to_string(),
                format!(
                    "The buyer cancelled the purchase. The {} hold was returned and your listing is available again.",
                    format_npr(*amount)
                ),
            ),
        };

        Notification {
            recipient_id: self.recipient().to_string(),
            title,
            body,
            kind: self.kind(),
        }
    }
}

/// Format a rupee amount the way the app displays it.
pub fn format_npr(amount: i64) -> String {
    format!("रू{}", amount)
}
