use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key assigned by an entity store.
///
/// Stores must never hand out the same `LiveId` twice for a kind, so a
/// recreated entity always comes back under a fresh id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LiveId(pub u64);

/// Stable logical name for an entity, minted by the history engine.
///
/// A slot outlives any single `LiveId`: when an undo recreates an entity the
/// slot is rebound to the new id.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u64);

impl LiveId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl SlotId {
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The slot after this one. Used by allocators that mint slots in order.
    pub const fn next(self) -> Self {
        SlotId(self.0 + 1)
    }
}

impl fmt::Debug for LiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for LiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot:{}", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot:{}", self.0)
    }
}
