//! Core types for the Saltbox back-office.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod status;

pub use id::*;
pub use money::{CurrencyCode, MONEY_DP, QUANTITY_DP, round_money, round_quantity};
pub use status::*;
