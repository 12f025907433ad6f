//! Shared utilities for the pemilu election system.

pub mod counters;
pub mod logging;
pub mod time;

pub use counters::{OpCounters, OpSnapshot};
pub use logging::{init_tracing, LogFormat};
pub use time::{format_duration, format_rfc3339, format_utc};
