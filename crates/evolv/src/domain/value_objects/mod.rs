//! Value Objects
//!
//! Immutable value types used across the domain.

mod capability_id;
mod persona;

pub use capability_id::*;
pub use persona::*;
