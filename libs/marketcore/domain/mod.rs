//! Domain entities and events for the marketplace core.

pub mod events;
pub mod models;

pub use events::{DomainEvent, Notification, NotificationKind};
pub use models::{
    Listing, ListingStatus, Offer, OfferStatus, PriceType, Transaction, TransactionStatus,
};
