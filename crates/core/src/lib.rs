//! Stride Core - Shared types library.
//!
//! This crate provides the types used across all Stride components:
//! - `storefront` - Cart sync service and HTTP API
//! - `cli` - Command-line tools for migrations and cart inspection
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no timers. The local cart lives here because its invariants
//! (merge key, positive quantities, totals) do not depend on how it is synced.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, sizes and cart line items
//! - [`cart`] - The in-session local cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{AddOutcome, LocalCart};
pub use types::*;
