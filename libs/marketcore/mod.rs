//! Marketplace core: escrow-mediated transactions and offer negotiation.
//!
//! The engine behind a peer-to-peer marketplace's money path. Listings
//! move through `available → pending → sold`; buyer funds move through an
//! escrow hold/release/refund cycle; offer negotiation gates entry into
//! the escrow flow for negotiable listings.
//!
//! ## Architecture
//!
//! - **domain**: entities (`Listing`, `Offer`, `Transaction`) and the
//!   [`DomainEvent`] vocabulary.
//! - **infrastructure**: owning state components (the wallet
//!   [`Ledger`] and the [`ListingTracker`] whose `reserve` is the
//!   purchase serialization point) plus notification sinks, config
//!   loading and logging init.
//! - **application**: the [`OfferEngine`], the [`EscrowEngine`] and the
//!   [`Marketplace`] facade consumed by binaries.
//!
//! Correctness rests on single-entity atomic check-and-set operations,
//! not global locks: listing reservation decides purchase races and the
//! ledger's debit is an atomic check-and-decrement, while terminal
//! transaction transitions are claimed by compare-and-set. See the
//! module docs of [`application::escrow`] for the failure semantics.
//!
//! [`DomainEvent`]: domain::events::DomainEvent
//! [`Ledger`]: infrastructure::ledger::Ledger
//! [`ListingTracker`]: infrastructure::listings::ListingTracker
//! [`OfferEngine`]: application::offers::OfferEngine
//! [`EscrowEngine`]: application::escrow::EscrowEngine
//! [`Marketplace`]: application::facade::Marketplace

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod utils;

pub use application::{EscrowEngine, EscrowError, Marketplace, OfferEngine, OfferError};
pub use domain::{
    DomainEvent, Listing, ListingStatus, Notification, NotificationKind, Offer, OfferStatus,
    PriceType, Transaction, TransactionStatus,
};
pub use infrastructure::{
    ChannelSink, ConfigError, Ledger, LedgerError, ListingError, ListingPatch, ListingStore,
    ListingTracker, LogSink, MarketConfig, MemoryLedger, MemorySink, NotificationSink, NullSink,
};
