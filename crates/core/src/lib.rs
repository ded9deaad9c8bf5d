//! Luar Core - Shared domain types.
//!
//! This crate provides the common types used by the Luar Sleepwear backend:
//! - `server` - Checkout/catalog/shipping API binary
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, CPF/CEP, and
//!   BRL money formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
