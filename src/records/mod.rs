//! NPC records and the load order boundary.

mod store;
mod types;

pub use store::{LoadOrder, NpcSource, PatchMod};
pub use types::*;
