//! Application layer: orchestrating engines and the public facade.

pub mod escrow;
pub mod facade;
pub mod offers;

pub use escrow::{EscrowEngine, EscrowError};
pub use facade::Marketplace;
pub use offers::{OfferEngine, OfferError};
