//! Small shared utilities.

pub mod ids;
