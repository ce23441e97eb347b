//! NTP timestamp codec and single-exchange clock offset calculator.
//!
//! This library implements the 64-bit fixed-point timestamp format defined by
//! the Network Time Protocol (RFC-1305, SNTP RFC-2030) and the standard
//! four-timestamp arithmetic that derives round-trip network delay and local
//! clock offset from one client/server exchange. It performs no network I/O:
//! a transport layer captures the raw timestamps and hands them in, and a host
//! layer consumes the computed results.
pub mod core;

pub mod protocol;
pub mod time;

// Re-export commonly used items
pub use crate::core::{Error, Result};
pub use crate::protocol::{ReplyTimestamps, TimingMessage};
pub use crate::time::{ExchangeInfo, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
