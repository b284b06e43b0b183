//! Service Ports
//!
//! Abstract interfaces for external services.

mod oracle;
mod runtime;

pub use oracle::*;
pub use runtime::*;
