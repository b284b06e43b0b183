//! Application Layer
//!
//! The turn pipeline, built only on ports:
//! classifier → repository / synthesizer → executor → composer → history.

mod classifier;
mod composer;
mod executor;
mod history;
mod orchestrator;
mod repository;
mod synthesizer;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::*;
pub use composer::*;
pub use executor::*;
pub use history::*;
pub use orchestrator::*;
pub use repository::*;
pub use synthesizer::*;
