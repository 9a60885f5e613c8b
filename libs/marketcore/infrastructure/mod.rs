//! Infrastructure: owning state components, sinks, config and logging.

pub mod config;
pub mod ledger;
pub mod listings;
pub mod logging;
pub mod notify;

pub use config::{ConfigError, ListingSeed, MarketConfig, UserSeed};
pub use ledger::{Ledger, LedgerError, MemoryLedger};
pub use listings::{ListingError, ListingPatch, ListingStore, ListingTracker};
pub use logging::{init_tracing, init_tracing_with_level};
pub use notify::{ChannelSink, LogSink, MemorySink, NotificationSink, NullSink};
