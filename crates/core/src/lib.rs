//! Shoebox Core - Shared types library.
//!
//! This crate provides common types used across all Shoebox components:
//! - `cart` - The cart service library and binary
//! - `cli` - Command-line tools for inspecting the persistent mirror
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, catalog products, and
//!   cart line items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
