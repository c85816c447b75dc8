pub mod id;
pub mod model;
pub mod store;

pub use id::{LiveId, SlotId};
pub use model::*;
pub use store::{EntityStore, MemoryStore, StoreError, StoreResult, Stores};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::Point;
