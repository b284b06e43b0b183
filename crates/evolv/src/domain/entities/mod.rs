//! Domain Entities
//!
//! - Capability: named executable unit, organized by category
//! - Intent: classification result of a single turn
//! - Turn / HistoryRecord: entries of the append-only history log

mod capability;
mod intent;
mod turn;

pub use capability::*;
pub use intent::*;
pub use turn::*;
