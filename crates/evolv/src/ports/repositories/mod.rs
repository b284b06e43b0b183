//! Repository Ports
//!
//! Abstract interfaces for persistence.

mod capability_store;
mod credential_sink;
mod history_sink;

pub use capability_store::*;
pub use credential_sink::*;
pub use history_sink::*;
