//! NTP time representation and exchange analysis.
//!
//! This module provides the two building blocks of the library:
//!
//! - [`Timestamp`]: the 64-bit fixed-point NTP timestamp, with bit-exact
//!   conversions to and from epoch milliseconds/nanoseconds, the hexadecimal
//!   `seconds.fraction` text form, and calendar time.
//! - [`ExchangeInfo`]: delay/offset analysis of one request/reply exchange,
//!   handling broadcast-mode and malformed-server replies as diagnostic notes
//!   rather than failures.
//!
//! # Examples
//!
//! ```
//! use ntp_sync::protocol::ReplyTimestamps;
//! use ntp_sync::time::{ExchangeInfo, Timestamp};
//!
//! // The three server-side timestamps come off the wire; the fourth is
//! // captured locally when the reply arrives.
//! let reply = ReplyTimestamps::new(
//!     Timestamp::from_epoch_nanos(1_000), // T1: client sent request
//!     Timestamp::from_epoch_nanos(1_100), // T2: server received it
//!     Timestamp::from_epoch_nanos(1_200), // T3: server sent reply
//! );
//! let info = ExchangeInfo::new(Some(reply), Timestamp::from_epoch_nanos(1_300)).unwrap();
//!
//! assert_eq!(info.delay_ns(), Some(200));
//! assert_eq!(info.offset_ns(), Some(0));
//! assert!(info.notes().is_empty());
//! ```

mod exchange;
mod timestamp;

pub use self::exchange::ExchangeInfo;
pub use self::timestamp::Timestamp;

/// Milliseconds per second
pub const MS_PER_SEC: i64 = 1_000;

/// Nanoseconds per millisecond
pub const NS_PER_MS: i64 = 1_000_000;

/// Nanoseconds per second
pub const NS_PER_SEC: i64 = 1_000_000_000;
