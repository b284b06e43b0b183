//! Domain Services
//!
//! Pure functions over domain values.

mod code_extract;
mod similarity;

pub use code_extract::*;
pub use similarity::*;
