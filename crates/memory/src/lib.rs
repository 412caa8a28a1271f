//! Context memory for Amplifai agents.
//!
//! An ordered, append-only record of what was said. One store can be shared
//! by several agents through an `Arc`, so they see each other's turns in
//! arrival order.

pub mod context_store;

pub use context_store::{ContextEntry, ContextMemoryManager};
