//! Storekeep Core - Shared domain types.
//!
//! This crate provides the types shared by the Storekeep components:
//! - `server` - Merchant-facing inventory HTTP API
//! - `cli` - Migrations and operator tooling
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Validation of user-supplied values (names, prices)
//! happens here so every layer sees the same invariants.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identifiers, text fields and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
