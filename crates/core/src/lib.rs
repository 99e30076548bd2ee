//! Saltbox Core - Shared types library.
//!
//! This crate provides common types used across all Saltbox back-office
//! components:
//! - `costing` - Inventory costing engine (lots, allocations, COGS)
//! - `cli` - Command-line tools for scenario replay and reports
//!
//! # Architecture
//!
//! The core crate contains only types and helpers - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money/quantity
//!   quantization, and lifecycle statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
