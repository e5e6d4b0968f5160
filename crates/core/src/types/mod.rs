//! Core types for Stride.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod line_item;
pub mod price;
pub mod size;

pub use id::*;
pub use line_item::{CartLineItem, CartSnapshot, NewCartItem};
pub use price::{CurrencyCode, Price, PriceError};
pub use size::{Size, SizeSystem};
