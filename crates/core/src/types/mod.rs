//! Core types for Storekeep.
//!
//! This module provides type-safe wrappers for the inventory domain.

pub mod id;
pub mod price;
pub mod text;

pub use id::*;
pub use price::{Price, PriceError};
pub use text::{Description, Name, TextError};
