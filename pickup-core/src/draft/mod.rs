//! The captain-driven draft: turn parsing, the pick strategy seam, and the
//! per-match draft session.

pub mod order;
pub mod session;
pub mod strategy;

pub use order::{PickOrderError, Turn, parse_pick_order};
pub use session::{DraftSession, PickResult, PickToken};
pub use strategy::{ManualOrder, PickStrategy};
