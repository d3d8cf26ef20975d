//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events
//! after successful ledger mutations. Runtime adapters implement the sink
//! to notify whatever presents the ledger.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
