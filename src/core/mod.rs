//! Core types shared throughout the library.

pub mod error;

pub use self::error::{Error, Result};
