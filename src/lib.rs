//! Bazari - peer-to-peer marketplace engine
//!
//! This crate is the presentation layer over the marketplace core,
//! following Clean Architecture principles.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI helpers)
//! - **marketcore**: Core business logic (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use bazari::bin_common::{load_config_from_env, ConfigType};
//! use bazari::marketcore::Marketplace;
//! ```

// Re-export workspace library for convenience
pub use marketcore;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;

    pub use cli::{load_config_from_env, print_banner, print_shutdown, ConfigType};
}
