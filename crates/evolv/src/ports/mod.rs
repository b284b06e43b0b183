//! Ports (Interfaces)
//!
//! Abstract interfaces that define how the core pipeline
//! interacts with external systems (storage, oracle, runtime).
//!
//! Implementations of these traits live in the agent crate.

pub mod repositories;
pub mod services;

// Re-exports
pub use repositories::*;
pub use services::*;
