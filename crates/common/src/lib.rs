//! Common crate
//!
//! Shared error handling and connector configuration for Floe.
//!
//! # Example
//! ```rust
//! use floe_common::Error;
//! let err = Error::NotFound("default.orders".to_string());
//! assert_eq!(err.to_string(), "Not found: default.orders");
//! ```

pub mod config;
pub mod error;

pub use crate::config::{Settings, SplitPolicy};
pub use crate::error::{Error, Result};
