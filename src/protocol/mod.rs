//! Protocol-facing message surface.
//!
//! Packet parsing itself lives outside this library; this module defines the
//! accessor seam through which a parsed reply hands its timestamps to the
//! exchange analyzer.

pub mod message;

pub use self::message::{ReplyTimestamps, TimingMessage};
