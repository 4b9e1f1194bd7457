//! Shared utilities.

pub mod duration;

pub use duration::format_scion_duration;
