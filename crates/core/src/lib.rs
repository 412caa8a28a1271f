//! # Amplifai Core
//!
//! Domain types, traits, and error definitions for the Amplifai agent shell.
//! This crate has **zero framework dependencies** — it defines the contracts
//! that the memory, provider, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! - [`Agent`] is a capability: anything that can `respond` substitutes for
//!   any other agent, with no shared base state.
//! - [`ModelInvoker`] is the seam to the outside world. Generation happens
//!   behind it; the core never talks to a network.
//! - Every failure is an [`AmplifaiError`] variant, so callers match on kind.

pub mod agent;
pub mod error;
pub mod invoker;

// Re-export key types at crate root for ergonomics
pub use agent::{Agent, AgentState};
pub use error::{AmplifaiError, InvokeError, Result, SelectionError};
pub use invoker::{InvocationRequest, InvocationResponse, ModelInvoker, Usage};
