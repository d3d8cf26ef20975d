//! Savings Ledger Core - Domain entities, services, and traits.
//!
//! This crate contains the savings goal bookkeeping: goals, the contributions
//! that fund them, and the figures derived from both. It is database-agnostic
//! and defines traits that are implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod events;
pub mod goals;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
