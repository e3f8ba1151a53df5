//! Types library for the price level book
//!
//! This library provides the core type definitions shared by the book
//! service: identifiers, tolerant floating-point prices, order sides and the
//! error taxonomy.
//!
//! # Modules
//! - `ids`: Identifiers (OrderIndex, Symbol, SourceId)
//! - `numeric`: Price type and epsilon-tolerant size helpers
//! - `order`: Order side
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod errors;
